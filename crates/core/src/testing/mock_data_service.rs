//! Mock data service for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};

use crate::data_service::{DataService, ServiceError};
use crate::film::FilmRecord;

/// Mock implementation of the DataService trait.
///
/// Provides controllable behavior for testing:
/// - Return a configurable film collection
/// - Count fetches for assertions
/// - Simulate failures
/// - Hold fetches in flight until released
#[derive(Debug, Clone)]
pub struct MockDataService {
    /// Films returned by `fetch_all`, in service order.
    films: Arc<RwLock<Vec<FilmRecord>>>,
    /// Number of `fetch_all` calls.
    calls: Arc<AtomicUsize>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<ServiceError>>>,
    /// If set, fetches wait for a permit before answering.
    gate: Arc<RwLock<Option<Arc<Semaphore>>>>,
}

impl Default for MockDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataService {
    /// Create a new mock with no films.
    pub fn new() -> Self {
        Self::with_films(Vec::new())
    }

    /// Create a mock that serves `films`.
    pub fn with_films(films: Vec<FilmRecord>) -> Self {
        Self {
            films: Arc::new(RwLock::new(films)),
            calls: Arc::new(AtomicUsize::new(0)),
            next_error: Arc::new(RwLock::new(None)),
            gate: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the served collection.
    pub async fn set_films(&self, films: Vec<FilmRecord>) {
        *self.films.write().await = films;
    }

    /// Append a film to the served collection.
    pub async fn add_film(&self, film: FilmRecord) {
        self.films.write().await.push(film);
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Number of fetches started so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next fetch to fail with the given error.
    pub async fn set_next_error(&self, error: ServiceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    // =========================================================================
    // Flow Control
    // =========================================================================

    /// Make subsequent fetches block until [`release`](Self::release).
    pub async fn hold(&self) {
        *self.gate.write().await = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let every held fetch finish and stop holding new ones.
    pub async fn release(&self) {
        if let Some(gate) = self.gate.write().await.take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }
}

#[async_trait]
impl DataService for MockDataService {
    async fn fetch_all(&self) -> Result<Vec<FilmRecord>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.read().await.clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| ServiceError::Aborted(e.to_string()))?;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.films.read().await.clone())
    }
}
