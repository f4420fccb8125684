use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Highest rating a film can carry.
pub const MAX_RATING: f64 = 10.0;

/// A film row fetched from the data service.
///
/// Records are immutable once fetched. A collection returned by a single fetch
/// is ordered by `rating` descending, ties in service order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmRecord {
    /// Opaque identifier, stable across fetches.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub title: String,
    pub genre: String,
    /// 0.0 to 10.0 inclusive.
    pub rating: f64,
    /// Running time in minutes.
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

/// Reasons a fetched row is rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidFilm {
    #[error("film {id} has an empty title")]
    EmptyTitle { id: String },

    #[error("film {id} has rating {rating} outside 0.0-10.0")]
    RatingOutOfRange { id: String, rating: f64 },

    #[error("film {id} has a zero duration")]
    ZeroDuration { id: String },
}

impl FilmRecord {
    /// Route of the per-film detail view.
    pub fn detail_route(&self) -> String {
        format!("/films/{}", self.id)
    }

    /// Rating with one decimal place.
    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.rating)
    }

    pub fn duration_label(&self) -> String {
        format!("{} min", self.duration_min)
    }

    /// Poster URL, if one is set. Blank URLs count as missing.
    pub fn poster(&self) -> Option<&str> {
        self.poster_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Check the invariants the view relies on.
    pub fn validate(&self) -> Result<(), InvalidFilm> {
        if self.title.trim().is_empty() {
            return Err(InvalidFilm::EmptyTitle {
                id: self.id.clone(),
            });
        }
        if !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(InvalidFilm::RatingOutOfRange {
                id: self.id.clone(),
                rating: self.rating,
            });
        }
        if self.duration_min == 0 {
            return Err(InvalidFilm::ZeroDuration {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

// Ids arrive as text from some tables and as integers from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
