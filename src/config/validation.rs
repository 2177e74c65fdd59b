use crate::config::types::{CollectorConfig, Config, OutputConfig, SourceConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_sources(&config.sources)?;
    Ok(())
}

/// Validates collection loop limits
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.target < 1 {
        return Err(ConfigError::Validation(format!(
            "target must be >= 1, got {}",
            config.target
        )));
    }

    if config.max_attempts_per_batch < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts_per_batch must be >= 1, got {}",
            config.max_attempts_per_batch
        )));
    }

    if config.stagnation_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "stagnation_limit must be >= 1, got {}",
            config.stagnation_limit
        )));
    }

    if config.backoff_ms.is_empty() {
        return Err(ConfigError::Validation(
            "backoff_ms must list at least one delay".to_string(),
        ));
    }

    if config.poll_interval_ms < 1 {
        return Err(ConfigError::Validation(
            "poll_interval_ms must be >= 1ms".to_string(),
        ));
    }

    if config.poll_interval_ms > config.settle_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms ({}) cannot exceed settle_timeout_ms ({})",
            config.poll_interval_ms, config.settle_timeout_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    match config.contact_email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            config.contact_email
        ))),
    }
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (field, value) in [
        ("database_path", &config.database_path),
        ("csv_dir", &config.csv_dir),
        ("summary_path", &config.summary_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
    }

    Ok(())
}

/// Validates the source list: names, URL templates and selectors
fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[source]] must be configured".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for source in sources {
        validate_source_name(&source.name)?;

        if !names.insert(source.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate source name '{}'",
                source.name
            )));
        }

        if !source.url_template.contains("{page}") {
            return Err(ConfigError::InvalidUrl(format!(
                "url_template of '{}' must contain {{page}}",
                source.name
            )));
        }

        let url = Url::parse(&source.page_url(source.start_page)).map_err(|e| {
            ConfigError::InvalidUrl(format!(
                "Invalid url_template '{}': {}",
                source.url_template, e
            ))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "url_template '{}' must use http or https",
                source.url_template
            )));
        }

        validate_selector("item_selector", &source.item_selector)?;
        validate_selector("content_selector", &source.content_selector)?;
        for (field, selector) in [
            ("date_selector", &source.date_selector),
            ("rating_selector", &source.rating_selector),
            ("next_selector", &source.next_selector),
        ] {
            if let Some(selector) = selector {
                validate_selector(field, selector)?;
            }
        }
    }

    Ok(())
}

/// Source names end up in file names and signatures
fn validate_source_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "source name must be non-empty and use only [a-z0-9_-], got '{}'",
            name
        )));
    }
    Ok(())
}

fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidSelector {
            field: field.to_string(),
            selector: selector.to_string(),
        })
}
