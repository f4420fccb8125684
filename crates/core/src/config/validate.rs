use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Data service URL is a non-empty http(s) URL
/// - Timeout and skeleton count are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Data service validation
    let url = config.data_service.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "data_service.url cannot be empty".to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "data_service.url must be an http(s) URL, got '{}'",
            url
        )));
    }
    if config.data_service.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "data_service.timeout_secs cannot be 0".to_string(),
        ));
    }

    // View validation
    if config.view.skeleton_count == 0 {
        return Err(ConfigError::ValidationError(
            "view.skeleton_count cannot be 0".to_string(),
        ));
    }

    Ok(())
}
