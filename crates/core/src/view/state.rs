use serde::{Deserialize, Serialize};

use crate::query_cache::CacheEntry;

/// Which branch the catalog renders.
///
/// Derived fresh on every render from the cache entry and the number of films
/// left after filtering; it holds no state of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// A fetch is in flight, or nothing has been fetched yet.
    Loading,
    /// Loaded and at least one film matches the search term.
    Populated,
    /// Loaded and no film matches, including an empty collection.
    Empty,
    /// The last fetch failed.
    Error,
}

impl ViewState {
    /// Resolve the render branch.
    ///
    /// Loading wins over everything so the search term cannot unpin it. An idle
    /// entry has no data yet and is treated as loading, never as empty.
    pub fn resolve<T>(entry: &CacheEntry<T>, visible: usize) -> Self {
        if entry.is_loading {
            return ViewState::Loading;
        }
        if entry.error.is_some() {
            return ViewState::Error;
        }
        match entry.data {
            None => ViewState::Loading,
            Some(_) if visible > 0 => ViewState::Populated,
            Some(_) => ViewState::Empty,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewState::Loading => "loading",
            ViewState::Populated => "populated",
            ViewState::Empty => "empty",
            ViewState::Error => "error",
        }
    }
}

impl std::fmt::Display for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
