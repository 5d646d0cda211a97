//! # regsync Registry
//!
//! Repository listing for container registry synchronization.
//!
//! A sync pass starts by enumerating the repositories of the source registry.
//! This crate classifies the registry by its host name and provides a
//! [`ListSource`] for it:
//!
//! - **ECR** registries (`<account>.dkr.ecr.<region>.amazonaws.com[.cn]`) are
//!   listed with `DescribeRepositories` through a caller-supplied
//!   [`EcrConnector`]
//! - **Any other** registry is listed through the OCI distribution catalog API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use regsync_registry::{RegistryConfig, SourceFactory};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = SourceFactory::new().create(RegistryConfig::new("registry.example.com"))?;
//!
//!     source.ping().await?;
//!     let repos = source.retrieve(0).await?;
//!     println!("{} repositories", repos.len());
//!
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod catalog;
mod config;
mod ecr;
mod error;
mod identify;
mod source;

pub use catalog::CatalogSource;
pub use config::{RegistryAuth, RegistryConfig, TlsConfig, MAX_PAGE_SIZE};
pub use ecr::{
    DescribeRepositoriesRequest, EcrApi, EcrConnector, EcrSource, EcrSourceConfig, RepositoryPage,
};
pub use error::{BackendError, RegistryError, Result};
pub use identify::{is_ecr, EcrRegistry};
pub use source::{ListSource, SourceFactory, Tag};
