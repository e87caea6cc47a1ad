use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The internal book record every endpoint returns.
///
/// Optional fields serialize as `null` rather than being skipped, so the
/// key set is identical across endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub description: String,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub page_count: Option<u32>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u64>,
    pub image_links: ImageLinks,
    pub preview_link: Option<String>,
    pub info_link: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

// Provider payload. Only the paths the normalizer reads are modelled. Every
// field decodes leniently: a missing or mistyped value becomes absent instead
// of failing the whole response.

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeList {
    #[serde(deserialize_with = "lenient")]
    pub total_items: Option<u64>,
    #[serde(deserialize_with = "lenient_items")]
    pub items: Option<Vec<VolumeItem>>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeItem {
    #[serde(deserialize_with = "lenient_or_default")]
    pub id: String,
    #[serde(deserialize_with = "lenient")]
    pub volume_info: Option<VolumeInfo>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeInfo {
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub authors: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub categories: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub published_date: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub publisher: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub language: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub page_count: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub average_rating: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub ratings_count: Option<i64>,
    #[serde(deserialize_with = "lenient")]
    pub image_links: Option<ImageLinks>,
    #[serde(deserialize_with = "lenient")]
    pub preview_link: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub info_link: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Items that are not objects are skipped; the rest keep their valid fields.
fn lenient_items<'de, D>(deserializer: D) -> Result<Option<Vec<VolumeItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = lenient(deserializer)?;
    Ok(values.map(|values| {
        values
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mistyped_field_keeps_item_and_siblings() {
        let list: VolumeList = serde_json::from_value(json!({
            "totalItems": 2,
            "items": [
                {
                    "id": "bad",
                    "volumeInfo": { "title": "Odd Types", "pageCount": "300", "authors": "Solo" }
                },
                { "id": "good", "volumeInfo": { "title": "Fine", "pageCount": 300 } }
            ]
        }))
        .unwrap();

        let items = list.items.unwrap();
        assert_eq!(items.len(), 2);
        let bad = items[0].volume_info.as_ref().unwrap();
        assert_eq!(items[0].id, "bad");
        assert_eq!(bad.title.as_deref(), Some("Odd Types"));
        assert_eq!(bad.page_count, None);
        assert_eq!(bad.authors, None);
        assert_eq!(items[1].volume_info.as_ref().unwrap().page_count, Some(300));
    }

    #[test]
    fn test_malformed_envelope_values_become_absent() {
        let list: VolumeList = serde_json::from_str(
            r#"{"totalItems":"many","items":[7,{"id":42,"volumeInfo":"none"},{"id":"ok"}]}"#,
        )
        .unwrap();
        assert_eq!(list.total_items, None);
        let items = list.items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "");
        assert!(items[0].volume_info.is_none());
        assert_eq!(items[1].id, "ok");
    }
}
