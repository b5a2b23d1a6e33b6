use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Site and Cinemeta base URLs are http(s)
/// - Cache TTLs and sweep interval are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    for (name, url) in [
        ("site.base_url", &config.site.base_url),
        ("cinemeta.base_url", &config.cinemeta.base_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "{} must start with http:// or https://",
                name
            )));
        }
    }

    if config.cache.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.sweep_interval_secs cannot be 0".to_string(),
        ));
    }

    for (name, ttl) in [
        ("cache.meta_ttl_minutes", config.cache.meta_ttl_minutes),
        ("cache.stream_ttl_minutes", config.cache.stream_ttl_minutes),
        ("cache.catalog_ttl_minutes", config.cache.catalog_ttl_minutes),
        (
            "cache.metadata_ttl_minutes",
            config.cache.metadata_ttl_minutes,
        ),
    ] {
        if ttl <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be positive",
                name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ServerConfig};
    use std::net::IpAddr;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Config::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_bad_site_url_fails() {
        let mut config = Config::default();
        config.site.base_url = "ftp://example".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_ttl_fails() {
        let mut config = Config::default();
        config.cache.meta_ttl_minutes = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
