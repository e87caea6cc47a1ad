use crate::data_models::{Book, VolumeInfo, VolumeItem, VolumeList};

/// Which provider fields an endpoint carries into its books.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    /// search, recommendations and popular: no `pageCount`, `infoLink`,
    /// `language` or `publisher`.
    Listing,
    /// get-by-id: every field.
    Detail,
}

/// Map a provider item onto a [`Book`]. Total: anything missing becomes the
/// empty default, never an error.
pub fn normalize(item: &VolumeItem, fields: FieldSet) -> Book {
    let empty = VolumeInfo::default();
    let info = item.volume_info.as_ref().unwrap_or(&empty);
    let detail = fields == FieldSet::Detail;

    Book {
        id: item.id.clone(),
        title: info.title.clone(),
        authors: info.authors.clone().unwrap_or_default(),
        description: info.description.clone().unwrap_or_default(),
        categories: info.categories.clone().unwrap_or_default(),
        published_date: info.published_date.clone(),
        publisher: info.publisher.clone().filter(|_| detail),
        language: info.language.clone().filter(|_| detail),
        page_count: info
            .page_count
            .and_then(|n| u32::try_from(n).ok())
            .filter(|_| detail),
        average_rating: info
            .average_rating
            .filter(|r| r.is_finite() && (0.0..=5.0).contains(r)),
        ratings_count: info.ratings_count.and_then(|n| u64::try_from(n).ok()),
        image_links: info.image_links.clone().unwrap_or_default(),
        preview_link: info.preview_link.clone(),
        info_link: info.info_link.clone().filter(|_| detail),
    }
}

/// Normalize every item of a provider list, keeping provider order.
pub fn normalize_list(list: &VolumeList, fields: FieldSet) -> Vec<Book> {
    list.items
        .iter()
        .flatten()
        .map(|item| normalize(item, fields))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::ImageLinks;
    use serde_json::json;

    fn item(value: serde_json::Value) -> VolumeItem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_volume_info_yields_defaults() {
        let book = normalize(&item(json!({ "id": "abc" })), FieldSet::Detail);
        assert_eq!(
            book,
            Book {
                id: "abc".to_string(),
                ..Book::default()
            }
        );
        assert_eq!(book.image_links, ImageLinks::default());
        assert!(book.authors.is_empty());
        assert_eq!(book.description, "");
    }

    #[test]
    fn test_detail_keeps_every_field() {
        let raw = item(json!({
            "id": "zyTCAlFPjgYC",
            "volumeInfo": {
                "title": "The Google Story",
                "authors": ["David A. Vise", "Mark Malseed"],
                "publisher": "Random House",
                "publishedDate": "2005-11-15",
                "description": "<p>Here is the story</p>",
                "pageCount": 207,
                "categories": ["Browsers (Computer programs)"],
                "averageRating": 3.5,
                "ratingsCount": 136,
                "imageLinks": { "smallThumbnail": "http://s", "thumbnail": "http://t" },
                "language": "en",
                "previewLink": "http://p",
                "infoLink": "http://i"
            }
        }));
        let book = normalize(&raw, FieldSet::Detail);

        assert_eq!(book.title.as_deref(), Some("The Google Story"));
        assert_eq!(book.authors, vec!["David A. Vise", "Mark Malseed"]);
        assert_eq!(book.description, "<p>Here is the story</p>");
        assert_eq!(book.page_count, Some(207));
        assert_eq!(book.publisher.as_deref(), Some("Random House"));
        assert_eq!(book.language.as_deref(), Some("en"));
        assert_eq!(book.average_rating, Some(3.5));
        assert_eq!(book.ratings_count, Some(136));
        assert_eq!(book.image_links.thumbnail.as_deref(), Some("http://t"));
        assert_eq!(book.image_links.small_thumbnail.as_deref(), Some("http://s"));
        assert_eq!(book.info_link.as_deref(), Some("http://i"));

        let listing = normalize(&raw, FieldSet::Listing);
        assert_eq!(listing.page_count, None);
        assert_eq!(listing.info_link, None);
        assert_eq!(listing.publisher, None);
        assert_eq!(listing.language, None);
        assert_eq!(listing.preview_link.as_deref(), Some("http://p"));
        assert_eq!(listing.authors, book.authors);
    }

    #[test]
    fn test_out_of_range_numbers_are_dropped() {
        let raw = item(json!({
            "id": "x",
            "volumeInfo": { "pageCount": -4, "averageRating": 7.0, "ratingsCount": -1 }
        }));
        let book = normalize(&raw, FieldSet::Detail);
        assert_eq!(book.page_count, None);
        assert_eq!(book.average_rating, None);
        assert_eq!(book.ratings_count, None);
    }

    #[test]
    fn test_list_without_items_is_empty() {
        let list: VolumeList = serde_json::from_value(json!({ "totalItems": 0 })).unwrap();
        assert!(normalize_list(&list, FieldSet::Listing).is_empty());
    }

    #[test]
    fn test_serialized_shape_is_uniform() {
        let book = normalize(&item(json!({ "id": "a" })), FieldSet::Listing);
        let sparse = serde_json::to_value(book).unwrap();
        let object = sparse.as_object().unwrap();
        for key in [
            "id",
            "title",
            "authors",
            "description",
            "categories",
            "publishedDate",
            "publisher",
            "language",
            "pageCount",
            "averageRating",
            "ratingsCount",
            "imageLinks",
            "previewLink",
            "infoLink",
        ] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert_eq!(sparse["authors"], json!([]));
        assert_eq!(
            sparse["imageLinks"],
            json!({ "thumbnail": null, "smallThumbnail": null })
        );
    }
}
