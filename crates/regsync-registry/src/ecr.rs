//! Listing source for AWS ECR registries.
//!
//! The AWS side is reached through two narrow traits: [`EcrConnector`]
//! bootstraps a service handle for a region from ambient credentials, and
//! [`EcrApi`] issues the `DescribeRepositories` and `DescribeRegistry`
//! calls. Both are supplied by the caller.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::config::MAX_PAGE_SIZE;
use crate::error::{BackendError, RegistryError, Result};
use crate::identify::EcrRegistry;
use crate::source::{ListSource, Tag};

/// One `DescribeRepositories` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescribeRepositoriesRequest {
    /// Account ID of the registry.
    pub registry_id: String,
    /// Page size.
    pub max_results: u32,
    /// Continuation token from the previous page.
    pub next_token: Option<String>,
}

/// One page of a `DescribeRepositories` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryPage {
    /// Repository names on this page.
    pub repository_names: Vec<String>,
    /// Token for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// ECR service calls used for listing.
#[async_trait]
pub trait EcrApi: Send + Sync {
    /// Fetches one page of repositories.
    async fn describe_repositories(
        &self,
        request: DescribeRepositoriesRequest,
    ) -> std::result::Result<RepositoryPage, BackendError>;

    /// Describes the registry of the current credentials.
    async fn describe_registry(&self) -> std::result::Result<(), BackendError>;
}

/// Creates ECR service handles.
#[async_trait]
pub trait EcrConnector: Send + Sync {
    /// Creates a service handle scoped to a region.
    async fn connect(&self, region: &str) -> std::result::Result<Arc<dyn EcrApi>, BackendError>;
}

/// Settings of an ECR source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrSourceConfig {
    /// Registry host.
    pub registry: String,
    /// AWS region.
    pub region: String,
    /// AWS account ID.
    pub account: String,
    /// Page size for `DescribeRepositories`.
    pub page_size: u32,
}

impl EcrSourceConfig {
    /// Creates a configuration with the maximum page size.
    #[must_use]
    pub fn new(
        registry: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            registry: registry.into(),
            region: region.into(),
            account: account.into(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Sets the page size, clamped to `1..=100`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

impl From<EcrRegistry> for EcrSourceConfig {
    fn from(registry: EcrRegistry) -> Self {
        Self::new(registry.host, registry.region, registry.account)
    }
}

/// [`ListSource`] for an ECR registry.
pub struct EcrSource {
    config: EcrSourceConfig,
    connector: Arc<dyn EcrConnector>,
    service: OnceCell<Arc<dyn EcrApi>>,
}

impl EcrSource {
    /// Creates a source. No connection is made until first use.
    #[must_use]
    pub fn new(config: EcrSourceConfig, connector: Arc<dyn EcrConnector>) -> Self {
        Self {
            config,
            connector,
            service: OnceCell::new(),
        }
    }

    /// Returns the source configuration.
    #[must_use]
    pub const fn config(&self) -> &EcrSourceConfig {
        &self.config
    }

    /// Returns the service handle, creating it on first use. A failed
    /// attempt is not remembered.
    async fn service(&self) -> Result<&Arc<dyn EcrApi>> {
        self.service
            .get_or_try_init(|| async {
                self.connector
                    .connect(&self.config.region)
                    .await
                    .map_err(|source| RegistryError::ServiceUnavailable {
                        region: self.config.region.clone(),
                        source,
                    })
            })
            .await
    }
}

impl std::fmt::Debug for EcrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcrSource")
            .field("config", &self.config)
            .field("connected", &self.service.initialized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ListSource for EcrSource {
    async fn retrieve(&self, max_items: usize) -> Result<Vec<String>> {
        tracing::debug!(
            registry = %self.config.registry,
            max_items,
            "ECR retrieving repository list"
        );

        let service = self.service().await?;

        let mut names = Vec::new();
        let mut next_token = None;
        loop {
            let request = DescribeRepositoriesRequest {
                registry_id: self.config.account.clone(),
                max_results: self.config.page_size,
                next_token: next_token.take(),
            };
            let page = service
                .describe_repositories(request)
                .await
                .map_err(|source| RegistryError::ListFailed {
                    registry: self.config.registry.clone(),
                    source,
                })?;

            names.extend(page.repository_names);
            tracing::debug!(fetched = names.len(), "ECR repository page received");

            let wants_more = max_items == 0 || names.len() < max_items;
            match page.next_token {
                Some(token) if wants_more => next_token = Some(token),
                _ => break,
            }
        }

        Ok(names)
    }

    async fn ping(&self) -> Result<()> {
        let service = self.service().await?;
        service
            .describe_registry()
            .await
            .map_err(|source| RegistryError::PingFailed {
                registry: self.config.registry.clone(),
                source,
            })
    }

    /// Not supported yet: always returns an empty list.
    async fn list_tags(&self, repository: &str) -> Result<Vec<Tag>> {
        tracing::debug!(
            registry = %self.config.registry,
            repository,
            "Tag listing is not supported for ECR sources"
        );
        Ok(Vec::new())
    }
}
