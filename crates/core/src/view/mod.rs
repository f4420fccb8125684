//! The catalog view.
//!
//! [`CatalogView`] owns the search term, drives the initial fetch through the
//! query cache and derives a [`CatalogRender`] on demand. Filtering and state
//! resolution are synchronous and run on every render, so editing the search
//! term toggles between populated and empty without touching the network.

mod render;
mod state;

pub use render::*;
pub use state::*;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::ViewConfig;
use crate::data_service::{DataService, ServiceError};
use crate::film::FilmRecord;
use crate::filter::filter_films;
use crate::query_cache::{CacheEntry, Fetch, QueryCache, QueryKey};

/// Cache key of the film collection query.
pub const FILMS_QUERY_KEY: &str = "/api/films";

/// Film catalog with live search.
pub struct CatalogView {
    service: Arc<dyn DataService>,
    cache: QueryCache<Vec<FilmRecord>>,
    key: QueryKey,
    search_term: String,
    skeleton_count: usize,
    mounted: bool,
}

impl CatalogView {
    /// Create an unmounted view with its own cache.
    pub fn new(service: Arc<dyn DataService>, config: &ViewConfig) -> Self {
        Self::with_cache(service, QueryCache::new(), config)
    }

    /// Create an unmounted view over an existing cache.
    pub fn with_cache(
        service: Arc<dyn DataService>,
        cache: QueryCache<Vec<FilmRecord>>,
        config: &ViewConfig,
    ) -> Self {
        Self {
            service,
            cache,
            key: QueryKey::new(FILMS_QUERY_KEY),
            search_term: String::new(),
            skeleton_count: config.skeleton_count,
            mounted: false,
        }
    }

    /// Mount the view and make sure the collection is being fetched.
    ///
    /// Safe to call repeatedly: only the first call for an absent entry runs
    /// the loader, later calls attach to the same fetch.
    pub fn mount(&mut self) -> Fetch<Vec<FilmRecord>> {
        if !self.mounted {
            debug!("Mounting catalog view");
            self.mounted = true;
        }

        let service = Arc::clone(&self.service);
        self.cache.ensure_fetch(&self.key, move || {
            let service = Arc::clone(&service);
            async move {
                let films = service.fetch_all().await?;
                info!("Fetched {} films", films.len());
                Ok::<_, ServiceError>(films)
            }
        })
    }

    /// Tear the view down. The search term resets and a fetch still in flight
    /// is discarded when it lands.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        debug!("Unmounting catalog view");
        self.cache.remove(&self.key);
        self.search_term.clear();
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Replace the search term with the user's input, verbatim.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Refetch the collection in response to an external refresh signal.
    ///
    /// Returns `None` while unmounted.
    pub fn refresh(&self) -> Option<Fetch<Vec<FilmRecord>>> {
        if !self.mounted {
            return None;
        }
        debug!("Refreshing catalog view");
        self.cache.invalidate(&self.key)
    }

    /// Current cache entry of the collection.
    pub fn entry(&self) -> CacheEntry<Vec<FilmRecord>> {
        self.cache.get(&self.key)
    }

    /// Films matching the search term, or `None` while nothing is loaded.
    pub fn visible_films(&self) -> Option<Vec<FilmRecord>> {
        let entry = self.entry();
        if !entry.is_success() {
            return None;
        }
        entry
            .data
            .as_deref()
            .map(|films| filter_films(films, &self.search_term))
    }

    pub fn state(&self) -> ViewState {
        self.render().state()
    }

    /// Derive the frame for the current cache entry and search term.
    pub fn render(&self) -> CatalogRender {
        let entry = self.entry();
        let visible = if entry.is_success() {
            entry
                .data
                .as_deref()
                .map(|films| filter_films(films, &self.search_term))
        } else {
            None
        };

        match ViewState::resolve(&entry, visible.as_ref().map_or(0, Vec::len)) {
            ViewState::Loading => CatalogRender::Loading {
                skeletons: self.skeleton_count,
            },
            ViewState::Populated => CatalogRender::Populated {
                cards: visible
                    .unwrap_or_default()
                    .iter()
                    .map(FilmCard::from)
                    .collect(),
            },
            ViewState::Empty => CatalogRender::Empty {
                message: EMPTY_MESSAGE.to_string(),
            },
            ViewState::Error => CatalogRender::Error {
                message: ERROR_MESSAGE.to_string(),
                detail: entry
                    .error
                    .map(|err| err.to_string())
                    .unwrap_or_default(),
            },
        }
    }

    /// Receiver that changes whenever the cached collection changes.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.cache.subscribe()
    }
}
