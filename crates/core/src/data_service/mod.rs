//! Read access to the remote film collection.
//!
//! The view depends only on the [`DataService`] trait; [`RestDataService`]
//! talks to a PostgREST-style gateway and the `testing` module provides a mock.

mod rest;

pub use rest::RestDataService;

use async_trait::async_trait;
use thiserror::Error;

use crate::film::{FilmRecord, InvalidFilm};

/// Errors that can occur when fetching from the data service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service rejected our credentials.
    #[error("Data service rejected credentials (status {0})")]
    Unauthorized(u16),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A row violated the film record invariants.
    #[error("Invalid film record: {0}")]
    InvalidRecord(#[from] InvalidFilm),

    /// Client not configured (missing API key, etc.).
    #[error("Data service not configured: {0}")]
    NotConfigured(String),

    /// The fetch task ended without producing a result.
    #[error("Fetch aborted: {0}")]
    Aborted(String),
}

/// The single read operation the catalog view consumes.
#[async_trait]
pub trait DataService: Send + Sync {
    /// Fetch every film, ordered by rating descending.
    async fn fetch_all(&self) -> Result<Vec<FilmRecord>, ServiceError>;
}
