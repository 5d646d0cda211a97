//! Configuration types for registry sources.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{RegistryError, Result};

/// Largest page a listing request may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Configuration for a source registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry URL or bare host (e.g., `registry.example.com:5000`).
    pub url: String,

    /// Pre-acquired credentials.
    pub auth: RegistryAuth,

    /// Request timeout.
    pub timeout: Duration,

    /// TLS configuration.
    pub tls: Option<TlsConfig>,

    /// User agent string.
    pub user_agent: String,

    /// Page size for listing requests.
    pub page_size: u32,
}

impl RegistryConfig {
    /// Creates a new registry configuration with the given URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsync_registry::RegistryConfig;
    ///
    /// let config = RegistryConfig::new("registry.example.com");
    /// assert_eq!(config.page_size, 100);
    /// ```
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth: RegistryAuth::None,
            timeout: Duration::from_secs(30),
            tls: None,
            user_agent: format!("regsync/{}", env!("CARGO_PKG_VERSION")),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Sets the credentials.
    #[must_use]
    pub fn with_auth(mut self, auth: RegistryAuth) -> Self {
        self.auth = auth;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the TLS configuration.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Sets the listing page size, clamped to `1..=100`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    /// Returns the registry base URL, defaulting to `https` when no scheme
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or has no host.
    ///
    /// # Examples
    ///
    /// ```
    /// use regsync_registry::RegistryConfig;
    ///
    /// let url = RegistryConfig::new("localhost:5000").base_url().unwrap();
    /// assert_eq!(url.as_str(), "https://localhost:5000/");
    /// ```
    pub fn base_url(&self) -> Result<Url> {
        let raw = self.url.trim().trim_end_matches('/');
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let url = Url::parse(&with_scheme).map_err(|_| RegistryError::InvalidUrl {
            url: self.url.clone(),
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(RegistryError::InvalidUrl {
                url: self.url.clone(),
            });
        }
        Ok(url)
    }

    /// Returns the registry host name without scheme, port or path.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn host(&self) -> Result<String> {
        let url = self.base_url()?;
        Ok(url.host_str().unwrap_or_default().to_string())
    }
}

/// Pre-acquired credentials for registry access.
#[derive(Debug, Clone)]
pub enum RegistryAuth {
    /// Anonymous access.
    None,

    /// Basic authentication (username/password or username/token).
    Basic {
        /// Username.
        username: String,
        /// Password or token.
        password: String,
    },

    /// Bearer token authentication.
    Bearer {
        /// Token value.
        token: String,
    },
}

impl RegistryAuth {
    /// Creates basic authentication.
    #[must_use]
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Creates bearer token authentication.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }
}

/// TLS configuration for registry connections.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Path to an additional CA certificate (PEM).
    pub ca_cert: Option<PathBuf>,

    /// Whether to skip certificate verification.
    pub insecure_skip_verify: bool,
}

impl TlsConfig {
    /// Creates a TLS configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ca_cert: None,
            insecure_skip_verify: false,
        }
    }

    /// Sets the CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    /// Skips certificate verification. Only meant for test registries.
    #[must_use]
    pub const fn insecure(mut self) -> Self {
        self.insecure_skip_verify = true;
        self
    }
}
