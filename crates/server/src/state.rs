use filmcat_core::{CatalogView, Config, SanitizedConfig};
use tokio::sync::RwLock;

/// Shared application state
pub struct AppState {
    config: Config,
    view: RwLock<CatalogView>,
}

impl AppState {
    pub fn new(config: Config, view: CatalogView) -> Self {
        Self {
            config,
            view: RwLock::new(view),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// The catalog view served by the film routes.
    pub fn view(&self) -> &RwLock<CatalogView> {
        &self.view
    }
}
