use crate::config::types::{AssetBackend, AssetsConfig, CheckpointConfig, Config, NotionConfig, SourceConfig};
use crate::sinks::notion::MAX_BLOCKS_PER_PAGE;
use crate::sinks::KNOWN_SINKS;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_checkpoint_config(&config.checkpoint)?;
    validate_sinks(&config.sinks.enabled)?;

    if config.sink_enabled("fs") && config.filesystem.root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "filesystem root cannot be empty".to_string(),
        ));
    }
    if config.sink_enabled("notion") {
        validate_notion_config(&config.notion)?;
    }

    validate_assets_config(&config.assets)?;
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_api_url("source api-url", &config.api_url)?;

    if config.token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source token cannot be empty (set [source] token or pass --source-token)"
                .to_string(),
        ));
    }

    if config.seed.is_empty() {
        return Err(ConfigError::Validation(
            "source seed must name at least one folder set".to_string(),
        ));
    }

    Ok(())
}

fn validate_checkpoint_config(config: &CheckpointConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_sinks(enabled: &[String]) -> Result<(), ConfigError> {
    if enabled.is_empty() {
        return Err(ConfigError::Validation(
            "at least one sink must be enabled".to_string(),
        ));
    }

    for name in enabled {
        if !KNOWN_SINKS.contains(&name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "unknown sink '{}', expected one of: {}",
                name,
                KNOWN_SINKS.join(", ")
            )));
        }
    }

    Ok(())
}

fn validate_notion_config(config: &NotionConfig) -> Result<(), ConfigError> {
    validate_api_url("notion api-url", &config.api_url)?;

    if config.token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "notion token is required when the notion sink is enabled".to_string(),
        ));
    }

    if config.root_page.trim().is_empty() {
        return Err(ConfigError::Validation(
            "notion root-page is required when the notion sink is enabled".to_string(),
        ));
    }

    if config.max_blocks_per_page < 1 || config.max_blocks_per_page > MAX_BLOCKS_PER_PAGE {
        return Err(ConfigError::Validation(format!(
            "max-blocks-per-page must be between 1 and {}, got {}",
            MAX_BLOCKS_PER_PAGE, config.max_blocks_per_page
        )));
    }

    Ok(())
}

fn validate_assets_config(config: &AssetsConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    match config.backend {
        AssetBackend::Local => {
            if config.directory.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "assets directory cannot be empty".to_string(),
                ));
            }

            if config.public_url.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "assets public-url is required for the local asset backend".to_string(),
                ));
            }
            validate_api_url("assets public-url", &config.public_url)
        }
        AssetBackend::S3 => {
            if !cfg!(feature = "s3") {
                return Err(ConfigError::Validation(
                    "the s3 asset backend requires building with --features s3".to_string(),
                ));
            }

            if config.bucket.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "assets bucket is required for the s3 asset backend (or pass --aws-bucket)"
                        .to_string(),
                ));
            }

            if config.region.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "assets region is required for the s3 asset backend (or pass --aws-region)"
                        .to_string(),
                ));
            }

            if !config.public_url.trim().is_empty() {
                validate_api_url("assets public-url", &config.public_url)?;
            }
            Ok(())
        }
    }
}

/// Checks that a URL parses and uses http(s)
fn validate_api_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
