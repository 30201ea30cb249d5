//! Scripted backend double and fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::api::{ApiError, Backend};
use crate::model::{Outlet, StoredAnswer};

/// Replies are consumed in order; an empty queue yields an empty success.
#[derive(Default)]
pub(crate) struct FakeBackend {
    outlets: Mutex<VecDeque<Result<Vec<Outlet>, ApiError>>>,
    answers: Mutex<VecDeque<Result<StoredAnswer, ApiError>>>,
    submits: Mutex<VecDeque<Result<(), ApiError>>>,
    posted: Mutex<Vec<String>>,
    submit_gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_outlets(self, reply: Result<Vec<Outlet>, ApiError>) -> Self {
        self.outlets.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_answer(self, reply: Result<StoredAnswer, ApiError>) -> Self {
        self.answers.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_submit(self, reply: Result<(), ApiError>) -> Self {
        self.submits.lock().unwrap().push_back(reply);
        self
    }

    /// Every POST waits for one `notify_one` on the returned handle.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.submit_gate = Some(gate.clone());
        (self, gate)
    }

    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn outlets(&self) -> Result<Vec<Outlet>, ApiError> {
        self.outlets.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()))
    }

    async fn stored_answer(&self) -> Result<StoredAnswer, ApiError> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StoredAnswer::default()))
    }

    async fn submit_query(&self, query: &str) -> Result<(), ApiError> {
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        self.posted.lock().unwrap().push(query.to_string());
        self.submits.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}

/// A malformed-body error, the only `ApiError` constructible without a network.
pub(crate) fn api_failure() -> ApiError {
    ApiError::Decode(serde_json::from_str::<StoredAnswer>("{").unwrap_err())
}

pub(crate) fn outlet(id: i64, latitude: f64, longitude: f64) -> Outlet {
    Outlet {
        id,
        name: format!("Outlet {id}"),
        address: format!("{id} Jalan Ampang, Kuala Lumpur"),
        latitude,
        longitude,
        telephone: format!("03-2000 {id:04}"),
        waze_link: format!("https://waze.com/ul?ll={latitude},{longitude}"),
    }
}

pub(crate) fn sample_outlets() -> Vec<Outlet> {
    vec![
        outlet(1, 3.1579, 101.7116),
        outlet(2, 3.1390, 101.6869),
        outlet(3, 3.0738, 101.5183),
    ]
}
