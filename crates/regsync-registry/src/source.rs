//! Repository listing sources.
//!
//! A [`ListSource`] enumerates the repositories of one registry. The concrete
//! variant is picked from the registry URL by [`SourceFactory`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::catalog::CatalogSource;
use crate::config::RegistryConfig;
use crate::ecr::{EcrConnector, EcrSource, EcrSourceConfig};
use crate::error::{RegistryError, Result};
use crate::identify::EcrRegistry;

/// A tag of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name.
    pub name: String,
}

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Enumerates repositories and tags of a registry.
///
/// Implementations hold no shared mutable state beyond a lazily created
/// backend handle; create one source per sync pass.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// Lists repository names.
    ///
    /// `max_items == 0` means unbounded. Otherwise no further pages are
    /// requested once the bound is reached, but the page that reached it is
    /// kept whole, so the result may exceed `max_items` by up to one page.
    /// A failure on any page discards everything fetched so far.
    async fn retrieve(&self, max_items: usize) -> Result<Vec<String>>;

    /// Checks that the registry is reachable with the configured credentials.
    async fn ping(&self) -> Result<()>;

    /// Lists the tags of a repository.
    async fn list_tags(&self, repository: &str) -> Result<Vec<Tag>>;
}

/// Builds the [`ListSource`] matching a registry URL.
///
/// ECR hosts get an [`EcrSource`] backed by the configured connector, any
/// other host a [`CatalogSource`].
#[derive(Default, Clone)]
pub struct SourceFactory {
    ecr: Option<Arc<dyn EcrConnector>>,
}

impl SourceFactory {
    /// Creates a factory without ECR support.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connector used for ECR registries.
    #[must_use]
    pub fn with_ecr_connector(mut self, connector: Arc<dyn EcrConnector>) -> Self {
        self.ecr = Some(connector);
        self
    }

    /// Creates a source for the given registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry URL is invalid, or if it names an ECR
    /// registry and no ECR connector is configured.
    pub fn create(&self, config: RegistryConfig) -> Result<Box<dyn ListSource>> {
        let host = config.host()?;

        if let Some(registry) = EcrRegistry::identify(&host) {
            let connector = self.ecr.clone().ok_or_else(|| RegistryError::UnsupportedRegistry {
                registry: host.clone(),
                reason: "no ECR connector configured".to_string(),
            })?;
            tracing::debug!(
                registry = %host,
                region = %registry.region,
                account = %registry.account,
                "Using ECR source"
            );
            let ecr_config = EcrSourceConfig::from(registry).with_page_size(config.page_size);
            return Ok(Box::new(EcrSource::new(ecr_config, connector)));
        }

        tracing::debug!(registry = %host, "Using catalog source");
        Ok(Box::new(CatalogSource::new(config)?))
    }
}

impl std::fmt::Debug for SourceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceFactory")
            .field("ecr", &self.ecr.is_some())
            .finish()
    }
}
