//! # regsync Core
//!
//! Mapping rules for container registry synchronization.
//!
//! A sync run is driven by a list of mapping rules. Each rule names a source
//! path (literal, or a `regex:` pattern), an optional destination path, a tag
//! selector and optional recency/activity filters. This crate validates those
//! rules and answers two questions for the driver:
//!
//! - [`Mapping::filter_repos`] - which source repositories a rule covers
//! - [`Mapping::map_path`] - where a source repository lands in the target
//!
//! ## Example
//!
//! ```rust
//! use regsync_core::MappingConfig;
//!
//! let mapping = MappingConfig::new("regex:^foo/.*")
//!     .with_to("regex:^/foo/(.*)$,/bar/$1")
//!     .with_tags(["latest"])
//!     .validate()?;
//!
//! let repos = mapping.filter_repos(vec!["foo/a".into(), "baz/b".into()]);
//! assert_eq!(repos, vec!["/foo/a"]);
//! assert_eq!(mapping.map_path(&repos[0]), "/bar/a");
//! # Ok::<(), regsync_core::MappingError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod duration;
pub mod error;
pub mod mapping;
pub mod pattern;
pub mod tags;


// Re-export main types at crate root
pub use error::{MappingError, Result};
pub use mapping::{Mapping, MappingConfig};
pub use pattern::{SourcePattern, TargetPattern, REGEX_PREFIX};
pub use tags::{TagFilter, TagFilterFactory, TagSet, TagSetFactory, TagSpecError};
