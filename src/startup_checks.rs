use crate::Config;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Invalid media delivery URL {0}: {1}")]
    InvalidDeliveryUrl(String, url::ParseError),

    #[error("Invalid media API base {0}: {1}")]
    InvalidApiBase(String, url::ParseError),

    #[error("media.{0} must be greater than zero")]
    ZeroSetting(&'static str),

    #[error("Collection with empty id (title: {0})")]
    EmptyCollectionId(String),

    #[error("Duplicate collection id: {0}")]
    DuplicateCollectionId(String),
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if let Err(e) = Url::parse(&config.media.delivery_url) {
        errors.push(StartupCheckError::InvalidDeliveryUrl(
            config.media.delivery_url.clone(),
            e,
        ));
    }

    if let Err(e) = Url::parse(&config.media.api_base) {
        errors.push(StartupCheckError::InvalidApiBase(
            config.media.api_base.clone(),
            e,
        ));
    }

    if config.media.page_size == 0 {
        errors.push(StartupCheckError::ZeroSetting("page_size"));
    }
    if config.media.max_results == 0 {
        errors.push(StartupCheckError::ZeroSetting("max_results"));
    }

    let mut seen = HashSet::new();
    for collection in &config.collections {
        if collection.id.trim().is_empty() {
            errors.push(StartupCheckError::EmptyCollectionId(collection.title.clone()));
        } else if !seen.insert(collection.id.as_str()) {
            errors.push(StartupCheckError::DuplicateCollectionId(collection.id.clone()));
        }

        if let Some(endpoint) = config.media.endpoints.get(&collection.id) {
            info!("Collection '{}' uses endpoint {}", collection.id, endpoint);
        }
    }

    for mapped in config.media.endpoints.keys() {
        if !config.collections.iter().any(|c| &c.id == mapped) {
            warn!("Endpoint mapped for unknown collection '{}'", mapped);
        }
    }

    if tokio::fs::metadata(&config.templates.directory).await.is_err() {
        warn!(
            "Template directory {:?} not found, using built-in templates",
            config.templates.directory
        );
    }

    if errors.is_empty() {
        info!(
            "All startup checks passed ({} collections)",
            config.collections.len()
        );
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CollectionConfig;

    fn collection(id: &str) -> CollectionConfig {
        CollectionConfig {
            id: id.to_string(),
            title: format!("Event {}", id),
            description: String::new(),
            date: None,
            initial_items: Vec::new(),
            initial_total_count: None,
        }
    }

    #[tokio::test]
    async fn test_default_config_passes() {
        assert!(perform_startup_checks(&Config::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_reports_every_problem() {
        let mut config = Config::default();
        config.media.delivery_url = "res.cloudinary.com/demo".to_string();
        config.media.page_size = 0;
        config.collections = vec![collection("1"), collection("1"), collection(" ")];

        let errors = perform_startup_checks(&config).await.unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], StartupCheckError::InvalidDeliveryUrl(..)));
        assert!(matches!(errors[1], StartupCheckError::ZeroSetting("page_size")));
        assert!(matches!(errors[2], StartupCheckError::DuplicateCollectionId(_)));
        assert!(matches!(errors[3], StartupCheckError::EmptyCollectionId(_)));
    }
}
