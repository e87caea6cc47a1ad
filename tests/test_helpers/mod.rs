#![allow(dead_code)]

use async_trait::async_trait;
use futures::future;
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use readnext::api::AppState;
use readnext::config::RecommendationQueryStyle;
use readnext::data_models::{VolumeItem, VolumeList};
use readnext::error::UpstreamError;
use readnext::fallback::{Backoff, PopularSequencer};
use readnext::upstream::{BooksApi, VolumeQuery};

/// In-memory provider that replays scripted responses and records calls.
/// An exhausted script answers with HTTP 500.
#[derive(Default)]
pub struct ScriptedBooks {
    lists: Mutex<VecDeque<Result<VolumeList, UpstreamError>>>,
    volumes: Mutex<VecDeque<Result<VolumeItem, UpstreamError>>>,
    pub list_calls: Mutex<Vec<VolumeQuery>>,
    pub get_calls: Mutex<Vec<String>>,
}

impl ScriptedBooks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_list(&self, response: Result<VolumeList, UpstreamError>) {
        self.lists.lock().unwrap().push_back(response);
    }

    pub fn push_volume(&self, response: Result<VolumeItem, UpstreamError>) {
        self.volumes.lock().unwrap().push_back(response);
    }

    pub fn list_calls(&self) -> Vec<VolumeQuery> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.get_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BooksApi for ScriptedBooks {
    async fn list_volumes(&self, query: &VolumeQuery) -> Result<VolumeList, UpstreamError> {
        self.list_calls.lock().unwrap().push(query.clone());
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(status(500)))
    }

    async fn get_volume(&self, id: &str) -> Result<VolumeItem, UpstreamError> {
        self.get_calls.lock().unwrap().push(id.to_string());
        self.volumes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(status(500)))
    }
}

pub fn status(code: u16) -> UpstreamError {
    UpstreamError::Status {
        status: code,
        body: json!({ "error": { "code": code, "message": "scripted failure" } }).to_string(),
    }
}

pub fn volume_json(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "volumeInfo": {
            "title": title,
            "authors": ["Ann Author"],
            "description": "A <b>fine</b> book",
            "categories": ["Fiction"],
            "publishedDate": "2001",
            "publisher": "Pub House",
            "language": "en",
            "pageCount": 320,
            "averageRating": 4.5,
            "ratingsCount": 12,
            "imageLinks": { "thumbnail": format!("http://img/{id}") },
            "previewLink": format!("http://preview/{id}"),
            "infoLink": format!("http://info/{id}")
        }
    })
}

pub fn volume(id: &str, title: &str) -> VolumeItem {
    serde_json::from_value(volume_json(id, title)).unwrap()
}

pub fn volume_list(ids: &[&str], total_items: u64) -> VolumeList {
    let items: Vec<Value> = ids.iter().map(|id| volume_json(id, &format!("Title {id}"))).collect();
    serde_json::from_value(json!({ "totalItems": total_items, "items": items })).unwrap()
}

/// Backoff that returns immediately and records each requested pause.
pub fn recording_backoff() -> (Backoff, Arc<Mutex<Vec<Duration>>>) {
    let pauses = Arc::new(Mutex::new(Vec::new()));
    let recorded = pauses.clone();
    let backoff: Backoff = Arc::new(move |interval| {
        recorded.lock().unwrap().push(interval);
        Box::pin(future::ready(()))
    });
    (backoff, pauses)
}

pub fn app_state(books: Arc<ScriptedBooks>) -> Arc<AppState> {
    let (backoff, _) = recording_backoff();
    Arc::new(AppState {
        popular: PopularSequencer::new(books.clone(), Duration::from_secs(25))
            .with_backoff(backoff),
        books,
        recommendation_style: RecommendationQueryStyle::Subject,
    })
}
