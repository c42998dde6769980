//! In-memory persistence that records every call
//!
//! Used by the replay tool and by tests. Failures can be scripted per call
//! with [`RecordingPersistence::fail_next`].

use super::{PersistRequest, PersistenceError, TreePersistence};
use crate::models::{ItemKind, PositionUpdate};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<PersistRequest>,
    failures: VecDeque<PersistenceError>,
}

/// Records requests in call order; cloning shares the same record
#[derive(Debug, Clone, Default)]
pub struct RecordingPersistence {
    inner: Arc<Mutex<Recorder>>,
    latency: Option<Duration>,
}

impl RecordingPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, to simulate a slow backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make the next call fail with `error` (queued, one per call)
    pub fn fail_next(&self, error: PersistenceError) {
        self.lock().failures.push_back(error);
    }

    /// Every request received so far, failed ones included
    pub fn calls(&self) -> Vec<PersistRequest> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorder> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn record(&self, request: PersistRequest) -> Result<(), PersistenceError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let mut recorder = self.lock();
        tracing::debug!("Persisting {}", request.describe());
        recorder.calls.push(request);
        match recorder.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TreePersistence for RecordingPersistence {
    async fn reorder(
        &self,
        items: Vec<PositionUpdate>,
        kind: ItemKind,
    ) -> Result<(), PersistenceError> {
        self.record(PersistRequest::Reorder { kind, items }).await
    }

    async fn move_item(
        &self,
        item_id: &str,
        kind: ItemKind,
        new_parent_id: Option<&str>,
        position: i64,
    ) -> Result<(), PersistenceError> {
        self.record(PersistRequest::Move {
            id: item_id.to_string(),
            kind,
            new_parent_id: new_parent_id.map(str::to_string),
            position,
        })
        .await
    }
}
