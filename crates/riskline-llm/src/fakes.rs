//! In-memory fake for the model client (testing only)
//!
//! `ScriptedModelClient` replays a queue of pre-scripted responses and
//! records every request it receives, so tests can drive the pipeline
//! through success, malformed-answer, and outage scenarios without a
//! model server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::client::{ModelClient, ModelRequest};
use crate::error::ModelError;

/// Scripted model client backed by a response queue.
#[derive(Debug, Default)]
pub struct ScriptedModelClient {
    responses: Mutex<VecDeque<Result<Value, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
    offline: AtomicBool,
}

impl ScriptedModelClient {
    /// A reachable client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client whose connectivity probe reports unreachable.
    pub fn offline() -> Self {
        let client = Self::new();
        client.offline.store(true, Ordering::SeqCst);
        client
    }

    /// Queue a successful JSON answer.
    pub fn enqueue_json(&self, value: Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    /// Queue an error answer.
    pub fn enqueue_error(&self, error: ModelError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// All requests received so far, in order.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    async fn generate(&self, request: ModelRequest) -> Result<Value, ModelError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ModelError::ServiceUnavailable {
                    reason: "scripted responses exhausted".to_string(),
                })
            })
    }

    async fn check_connection(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }
}
