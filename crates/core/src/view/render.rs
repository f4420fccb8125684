//! What the catalog draws for each branch.

use serde::Serialize;

use super::ViewState;
use crate::film::FilmRecord;

/// Message shown when no film matches.
pub const EMPTY_MESSAGE: &str = "No films found matching your search.";

/// Headline shown when the fetch failed.
pub const ERROR_MESSAGE: &str = "Could not load films.";

/// Text drawn in place of a missing poster.
pub const POSTER_PLACEHOLDER: &str = "No poster";

/// One rendered frame of the catalog region.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogRender {
    /// Placeholder cards without content.
    Loading { skeletons: usize },
    Populated { cards: Vec<FilmCard> },
    Empty { message: String },
    Error { message: String, detail: String },
}

impl CatalogRender {
    pub fn state(&self) -> ViewState {
        match self {
            CatalogRender::Loading { .. } => ViewState::Loading,
            CatalogRender::Populated { .. } => ViewState::Populated,
            CatalogRender::Empty { .. } => ViewState::Empty,
            CatalogRender::Error { .. } => ViewState::Error,
        }
    }

    /// Cards of the populated branch; empty for every other branch.
    pub fn cards(&self) -> &[FilmCard] {
        match self {
            CatalogRender::Populated { cards } => cards,
            _ => &[],
        }
    }
}

/// Poster slot of a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum Poster {
    Url(String),
    Placeholder,
}

/// A navigable film card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmCard {
    pub id: String,
    pub title: String,
    pub poster: Poster,
    /// One decimal place.
    pub rating: String,
    pub duration: String,
    pub genre: String,
    /// Detail route, `/films/{id}`.
    pub href: String,
}

impl From<&FilmRecord> for FilmCard {
    fn from(film: &FilmRecord) -> Self {
        Self {
            id: film.id.clone(),
            title: film.title.clone(),
            poster: film
                .poster()
                .map(|url| Poster::Url(url.to_string()))
                .unwrap_or(Poster::Placeholder),
            rating: film.rating_label(),
            duration: film.duration_label(),
            genre: film.genre.clone(),
            href: film.detail_route(),
        }
    }
}
