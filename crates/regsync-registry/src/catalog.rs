//! Listing source for registries implementing the OCI distribution API.
//!
//! Repositories come from `/v2/_catalog`, paged with `n=<page size>` and the
//! `Link: <...>; rel="next"` response header. Tags come from
//! `/v2/<name>/tags/list`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, LINK};
use serde::Deserialize;
use url::Url;

use crate::config::{RegistryAuth, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::source::{ListSource, Tag};

/// Response from the `/v2/_catalog` endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
struct Catalog {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

/// Response from the `/v2/<name>/tags/list` endpoint.
#[derive(Debug, Clone, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// [`ListSource`] for a generic OCI distribution registry.
#[derive(Debug)]
pub struct CatalogSource {
    config: RegistryConfig,
    base: Url,
    http: reqwest::Client,
}

impl CatalogSource {
    /// Creates a source for the configured registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built from the TLS settings.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let base = config.base_url()?;
        let http = Self::build_http_client(&config)?;

        Ok(Self { config, base, http })
    }

    /// Returns the registry configuration.
    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|_| RegistryError::InvalidUrl {
            url: format!("{}{path}", self.base),
        })
    }

    async fn get(&self, url: Url) -> Result<reqwest::Response> {
        let headers = self.request_headers(&url)?;
        let response = self.http.get(url).headers(headers).send().await?;
        Ok(response)
    }

    /// Headers for a request to `url`. Credentials only go to the origin of
    /// the configured registry; a `Link` pointing elsewhere is followed
    /// anonymously.
    fn request_headers(&self, url: &Url) -> Result<HeaderMap> {
        if url.origin() != self.base.origin() {
            tracing::debug!(registry = %self.base, %url, "Dropping credentials for foreign origin");
            return Ok(HeaderMap::new());
        }
        self.auth_headers()
    }

    async fn http_error(response: reqwest::Response) -> RegistryError {
        RegistryError::HttpError {
            status: response.status().as_u16(),
            message: response.text().await.unwrap_or_default(),
        }
    }

    /// Builds the HTTP client with proper configuration.
    fn build_http_client(config: &RegistryConfig) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent);

        if let Some(ref tls) = config.tls {
            if tls.insecure_skip_verify {
                builder = builder.danger_accept_invalid_certs(true);
            }

            if let Some(ref ca_cert) = tls.ca_cert {
                let cert_pem = std::fs::read(ca_cert).map_err(|e| RegistryError::IoError {
                    path: ca_cert.clone(),
                    source: e,
                })?;
                let cert = reqwest::Certificate::from_pem(&cert_pem).map_err(|e| {
                    RegistryError::InvalidTls {
                        message: format!("Invalid CA certificate: {e}"),
                    }
                })?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder.build().map_err(|e| RegistryError::ConnectionFailed {
            url: config.url.clone(),
            source: e,
        })
    }

    /// Creates authentication headers based on configuration.
    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let value = match &self.config.auth {
            RegistryAuth::None => return Ok(headers),
            RegistryAuth::Basic { username, password } => {
                let credentials = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    format!("{username}:{password}"),
                );
                format!("Basic {credentials}")
            }
            RegistryAuth::Bearer { token } => format!("Bearer {token}"),
        };

        let value = HeaderValue::from_str(&value).map_err(|_| RegistryError::AuthenticationFailed {
            message: "credentials contain invalid header characters".to_string(),
        })?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

/// Extracts the target of the `rel="next"` entry of a `Link` header.
fn next_link(header: &str) -> Option<&str> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        is_next
            .then(|| target.strip_prefix('<')?.strip_suffix('>'))
            .flatten()
    })
}

#[async_trait]
impl ListSource for CatalogSource {
    async fn retrieve(&self, max_items: usize) -> Result<Vec<String>> {
        tracing::debug!(registry = %self.base, max_items, "Catalog retrieving repository list");

        let mut url = self.endpoint("v2/_catalog")?;
        url.query_pairs_mut()
            .append_pair("n", &self.config.page_size.to_string());

        let mut names = Vec::new();
        let mut next = Some(url);
        while let Some(url) = next.take() {
            let response = self.get(url).await?;
            if !response.status().is_success() {
                return Err(Self::http_error(response).await);
            }

            let link = response
                .headers()
                .get(LINK)
                .and_then(|v| v.to_str().ok())
                .and_then(next_link)
                .map(|target| self.endpoint(target))
                .transpose()?;

            let catalog: Catalog = response.json().await?;
            names.extend(catalog.repositories.unwrap_or_default());
            tracing::debug!(fetched = names.len(), "Catalog page received");

            if max_items == 0 || names.len() < max_items {
                next = link;
            }
        }

        Ok(names)
    }

    async fn ping(&self) -> Result<()> {
        let response = self.get(self.endpoint("v2/")?).await?;
        if response.status().is_success() {
            return Ok(());
        }

        let registry = self.base.to_string();
        let source = Self::http_error(response).await;
        Err(RegistryError::PingFailed {
            registry,
            source: Box::new(source),
        })
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<Tag>> {
        let repository = repository.trim_start_matches('/');
        let response = self
            .get(self.endpoint(&format!("v2/{repository}/tags/list"))?)
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::http_error(response).await);
        }

        let tag_list: TagList = response.json().await?;
        Ok(tag_list
            .tags
            .unwrap_or_default()
            .into_iter()
            .map(Tag::new)
            .collect())
    }
}
