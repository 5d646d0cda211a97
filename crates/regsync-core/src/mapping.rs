//! Mapping rules.
//!
//! A [`MappingConfig`] holds the raw fields of one configured rule. Validating
//! it yields an immutable [`Mapping`] that decides which source repositories
//! are in scope and where each one lands in the destination registry.
//!
//! ```
//! use regsync_core::MappingConfig;
//!
//! let mapping = MappingConfig::new("regex:library/.*")
//!     .with_to("mirror")
//!     .validate()
//!     .unwrap();
//!
//! let repos = vec!["library/busybox".to_string(), "other/tool".to_string()];
//! let selected = mapping.filter_repos(repos);
//! assert_eq!(selected, vec!["/library/busybox"]);
//! assert_eq!(mapping.map_path(&selected[0]), "/mirror/library/busybox");
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::duration::parse_duration;
use crate::error::{MappingError, Result};
use crate::pattern::{normalize_path, SourcePattern, TargetPattern};
use crate::tags::{TagFilterFactory, TagSet, TagSetFactory};

/// Raw mapping fields as they appear in configuration.
///
/// Scalar fields are kept as strings; interpreting them is the job of
/// [`MappingConfig::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingConfig {
    /// Source path, or `regex:<pattern>`.
    #[serde(default, deserialize_with = "scalar_string")]
    pub from: String,

    /// Destination path, `regex:<pattern>,<replacement>`, or empty.
    #[serde(default, deserialize_with = "scalar_string")]
    pub to: String,

    /// Tag specs.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Platform to sync, e.g. `linux/amd64`.
    #[serde(default, deserialize_with = "scalar_string")]
    pub platform: String,

    /// Whether to sync only active images.
    #[serde(default, deserialize_with = "scalar_string")]
    pub only_active: String,

    /// Only sync images pushed within this duration.
    #[serde(default, deserialize_with = "scalar_string")]
    pub since: String,
}

impl MappingConfig {
    /// Creates a mapping configuration with the given source path.
    #[must_use]
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    /// Sets the destination path.
    #[must_use]
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Sets the tag specs.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the platform.
    #[must_use]
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Sets the raw `only_active` flag.
    #[must_use]
    pub fn with_only_active(mut self, only_active: impl Into<String>) -> Self {
        self.only_active = only_active.into();
        self
    }

    /// Sets the raw `since` duration.
    #[must_use]
    pub fn with_since(mut self, since: impl Into<String>) -> Self {
        self.since = since.into();
        self
    }

    /// Validates the configuration using the default tag selector.
    ///
    /// # Errors
    ///
    /// See [`Mapping::validate_with`].
    pub fn validate(&self) -> Result<Mapping> {
        Mapping::validate_with(self, &TagFilterFactory)
    }
}

/// Accepts strings, booleans and numbers, keeping their textual form.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Flag(bool),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(text)) => text,
        Some(Scalar::Flag(flag)) => flag.to_string(),
        Some(Scalar::Integer(n)) => n.to_string(),
        Some(Scalar::Float(n)) => n.to_string(),
    })
}

/// Parses the boolean spellings accepted in configuration.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// A validated mapping rule.
///
/// Immutable once built; all patterns are compiled.
#[derive(Debug)]
pub struct Mapping {
    from: SourcePattern,
    to: TargetPattern,
    tags: Box<dyn TagSet>,
    platform: Option<String>,
    only_active: bool,
    since: Duration,
}

impl Mapping {
    /// Validates a raw configuration, building the tag selector with the
    /// given factory.
    ///
    /// An unparseable `only_active` value is not an error and resolves to
    /// `false`, whereas an unparseable `since` value fails validation.
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is empty, a pattern does not compile, a
    /// regex `to` lacks its replacement, a tag spec is malformed, or `since`
    /// is not a duration.
    pub fn validate_with(config: &MappingConfig, tags: &dyn TagSetFactory) -> Result<Self> {
        let from = SourcePattern::compile(&config.from)?;
        let to = TargetPattern::compile(&config.to)?;

        let tags = tags
            .build(&config.tags)
            .map_err(|source| MappingError::InvalidTags { source })?;

        let only_active = if config.only_active.is_empty() {
            false
        } else {
            parse_bool(&config.only_active).unwrap_or_else(|| {
                tracing::debug!(
                    value = %config.only_active,
                    "Unrecognised 'only_active' value, treating as false"
                );
                false
            })
        };

        let since = if config.since.is_empty() {
            Duration::ZERO
        } else {
            parse_duration(&config.since).map_err(|source| MappingError::InvalidSince {
                value: config.since.clone(),
                source,
            })?
        };

        let platform = Some(config.platform.clone()).filter(|p| !p.is_empty());

        Ok(Self {
            from,
            to,
            tags,
            platform,
            only_active,
            since,
        })
    }

    /// Narrows a repository list to the repositories this mapping covers.
    ///
    /// With a regex `from`, keeps the repositories whose full path matches,
    /// in input order and normalized to absolute paths. With a literal `from`
    /// the list is returned unchanged: the literal repository is looked up
    /// directly by the caller.
    #[must_use]
    pub fn filter_repos(&self, repos: Vec<String>) -> Vec<String> {
        match &self.from {
            SourcePattern::Regex(re) => repos
                .into_iter()
                .filter(|repo| re.is_match(repo))
                .map(|repo| normalize_path(&repo))
                .collect(),
            SourcePattern::Literal(_) => repos,
        }
    }

    /// Computes the destination path for a source repository path.
    #[must_use]
    pub fn map_path(&self, path: &str) -> String {
        match &self.to {
            TargetPattern::Regex {
                pattern,
                replacement,
            } => pattern.replace_all(path, replacement.as_str()).into_owned(),
            TargetPattern::Literal(to) if self.from.is_regex() => format!("{to}{path}"),
            TargetPattern::Literal(to) => to.clone(),
            TargetPattern::Same => path.to_string(),
        }
    }

    /// Returns the compiled source pattern.
    #[must_use]
    pub const fn source(&self) -> &SourcePattern {
        &self.from
    }

    /// Returns the compiled target pattern.
    #[must_use]
    pub const fn target(&self) -> &TargetPattern {
        &self.to
    }

    /// Returns the literal source path, if `from` is not a regex.
    #[must_use]
    pub fn source_path(&self) -> Option<&str> {
        match &self.from {
            SourcePattern::Literal(path) => Some(path),
            SourcePattern::Regex(_) => None,
        }
    }

    /// Returns the tag selector.
    #[must_use]
    pub fn tags(&self) -> &dyn TagSet {
        self.tags.as_ref()
    }

    /// Returns the platform, if one was configured.
    #[must_use]
    pub fn platform(&self) -> Option<&str> {
        self.platform.as_deref()
    }

    /// Returns true if a `since` time window applies.
    #[must_use]
    pub fn has_since(&self) -> bool {
        !self.since.is_zero()
    }

    /// Returns the `since` time window; zero means no filter.
    #[must_use]
    pub const fn since(&self) -> Duration {
        self.since
    }

    /// Returns true if only active images should be synced.
    #[must_use]
    pub const fn only_active(&self) -> bool {
        self.only_active
    }
}
