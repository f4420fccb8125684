pub mod config;
pub mod data_service;
pub mod film;
pub mod filter;
pub mod metrics;
pub mod query_cache;
pub mod testing;
pub mod view;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DataServiceConfig,
    SanitizedConfig, ServerConfig, ViewConfig,
};
pub use data_service::{DataService, RestDataService, ServiceError};
pub use film::{FilmRecord, InvalidFilm};
pub use filter::filter_films;
pub use query_cache::{CacheEntry, Fetch, FetchOutcome, QueryCache, QueryKey};
pub use view::{
    CatalogRender, CatalogView, FilmCard, Poster, ViewState, EMPTY_MESSAGE, ERROR_MESSAGE,
    FILMS_QUERY_KEY, POSTER_PLACEHOLDER,
};
