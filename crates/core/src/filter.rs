//! Live search over the fetched collection.
//!
//! Matching is a case-insensitive substring test against a film's title and
//! genre. The term is used verbatim: whitespace is significant and an empty
//! term matches everything. Output order always follows input order.

use crate::film::FilmRecord;

/// Return the films whose title or genre contains `term`, ignoring case.
///
/// An empty term returns the whole collection. No match yields an empty vec,
/// never an absent value.
pub fn filter_films(films: &[FilmRecord], term: &str) -> Vec<FilmRecord> {
    if term.is_empty() {
        return films.to_vec();
    }

    let needle = term.to_lowercase();
    let matched: Vec<FilmRecord> = films
        .iter()
        .filter(|film| matches_term(film, &needle))
        .cloned()
        .collect();

    debug_assert!(matched.len() <= films.len());
    matched
}

/// `needle` must already be lowercased.
fn matches_term(film: &FilmRecord, needle: &str) -> bool {
    film.title.to_lowercase().contains(needle) || film.genre.to_lowercase().contains(needle)
}
