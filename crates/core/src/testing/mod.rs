//! Testing utilities and mock implementations.
//!
//! This module provides a mock of the data service trait, allowing the view
//! and the HTTP host to be exercised without a real gateway.
//!
//! # Example
//!
//! ```rust,ignore
//! use filmcat_core::testing::{fixtures, MockDataService};
//!
//! let service = MockDataService::with_films(fixtures::catalog());
//!
//! // Hold fetches in flight until released
//! service.hold().await;
//! // ...
//! service.release().await;
//! ```

mod mock_data_service;

pub use mock_data_service::MockDataService;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::film::FilmRecord;

    /// Create a film with a poster URL derived from its id.
    pub fn film(id: &str, title: &str, genre: &str, rating: f64, duration_min: u32) -> FilmRecord {
        FilmRecord {
            id: id.to_string(),
            title: title.to_string(),
            genre: genre.to_string(),
            rating,
            duration_min,
            poster_url: Some(format!("https://img.example/posters/{}.jpg", id)),
        }
    }

    pub fn dune() -> FilmRecord {
        film("1", "Dune", "Sci-Fi", 8.5, 155)
    }

    pub fn clue() -> FilmRecord {
        film("2", "Clue", "Comedy", 7.0, 94)
    }

    /// The two-film collection used by the search scenarios.
    pub fn dune_and_clue() -> Vec<FilmRecord> {
        vec![dune(), clue()]
    }

    /// A larger collection in service order (rating descending, a three-way tie,
    /// one film without a poster).
    pub fn catalog() -> Vec<FilmRecord> {
        let mut no_poster = film("8", "The Drama Club", "Comedy", 6.1, 101);
        no_poster.poster_url = None;

        vec![
            film("3", "The Godfather", "Crime", 9.2, 175),
            film("1", "Dune", "Sci-Fi", 8.5, 155),
            film("4", "Heat", "Crime", 8.5, 170),
            film("6", "Whiplash", "Drama", 8.5, 106),
            film("5", "Arrival", "Sci-Fi Drama", 7.9, 116),
            film("7", "Paddington 2", "Family", 7.8, 103),
            film("2", "Clue", "Comedy", 7.0, 94),
            no_poster,
        ]
    }
}
