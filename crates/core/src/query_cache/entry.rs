use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data_service::ServiceError;

/// Identifier of one logical query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one loader run, shared by every caller that awaited it.
pub type FetchOutcome<T> = Result<Arc<T>, Arc<ServiceError>>;

/// Snapshot of a cached query.
///
/// At most one of `data` and `error` is set. An entry with neither that is not
/// loading is idle: nothing has been requested for its key.
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub data: Option<Arc<T>>,
    pub is_loading: bool,
    pub error: Option<Arc<ServiceError>>,
    /// When the entry last settled.
    pub updated_at: Option<DateTime<Utc>>,
}

// Manual impl: cloning an entry never clones `T`.
impl<T> Clone for CacheEntry<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            is_loading: self.is_loading,
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        Self::idle()
    }
}

impl<T> CacheEntry<T> {
    pub fn idle() -> Self {
        Self {
            data: None,
            is_loading: false,
            error: None,
            updated_at: None,
        }
    }

    pub(crate) fn loading() -> Self {
        Self {
            is_loading: true,
            ..Self::idle()
        }
    }

    pub(crate) fn populated(data: Arc<T>) -> Self {
        Self {
            data: Some(data),
            is_loading: false,
            error: None,
            updated_at: Some(Utc::now()),
        }
    }

    /// Failed entries drop any previously loaded data.
    pub(crate) fn failed(error: Arc<ServiceError>) -> Self {
        Self {
            data: None,
            is_loading: false,
            error: Some(error),
            updated_at: Some(Utc::now()),
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.is_loading && self.data.is_none() && self.error.is_none()
    }

    /// Loaded without error.
    pub fn is_success(&self) -> bool {
        !self.is_loading && self.error.is_none() && self.data.is_some()
    }

    /// The settled outcome, if the entry has one.
    pub fn outcome(&self) -> Option<FetchOutcome<T>> {
        if self.is_loading {
            return None;
        }
        match (&self.data, &self.error) {
            (_, Some(err)) => Some(Err(Arc::clone(err))),
            (Some(data), None) => Some(Ok(Arc::clone(data))),
            (None, None) => None,
        }
    }
}
