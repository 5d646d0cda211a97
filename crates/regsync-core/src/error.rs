//! Error types for mapping validation.
//!
//! Every variant describes a configuration problem: a mapping that fails
//! validation must not be used for filtering or rewriting.

use thiserror::Error;

use crate::duration::DurationError;
use crate::tags::TagSpecError;

/// Result type alias using [`MappingError`] as the error type.
pub type Result<T> = std::result::Result<T, MappingError>;

/// Errors that can occur while validating a mapping.
#[derive(Error, Debug)]
pub enum MappingError {
    /// The source path is empty.
    #[error("mapping without 'from' path")]
    MissingSource,

    /// The source path uses a regular expression that does not compile.
    #[error("'from' uses invalid regular expression '{pattern}': {source}")]
    InvalidSourcePattern {
        /// The pattern with the `regex:` prefix removed.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// The target uses the regex form without a replacement template.
    #[error("replacement expression missing in 'to'")]
    MissingReplacement,

    /// The target uses a regular expression that does not compile.
    #[error("'to' uses invalid regular expression '{pattern}': {source}")]
    InvalidTargetPattern {
        /// The pattern with the `regex:` prefix and template removed.
        pattern: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// A tag spec could not be turned into a selector.
    #[error("'tags' uses invalid format: {source}")]
    InvalidTags {
        /// Underlying tag spec error.
        #[source]
        source: TagSpecError,
    },

    /// The `since` value is not a valid duration.
    #[error("'since' uses invalid duration '{value}': {source}")]
    InvalidSince {
        /// The raw value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: DurationError,
    },
}
