//! Tag selection.
//!
//! A mapping narrows the tags it syncs with a list of tag specs. The mapping
//! only needs a predicate, so selection goes through the [`TagSet`] trait and
//! selectors are built by a [`TagSetFactory`]. [`TagFilter`] is the default
//! implementation:
//!
//! - `v1.2.3` selects the tag with exactly that name
//! - `regex:v1\..*` selects every tag fully matching the expression
//! - `!latest` / `!regex:.*-rc.*` excludes matching tags
//!
//! An empty spec list selects every tag.

use std::fmt;

use regex::Regex;
use thiserror::Error;

use crate::pattern::{compile_regex, REGEX_PREFIX};

/// Prefix negating a tag spec.
pub const NEGATION_PREFIX: char = '!';

/// Errors raised while building a tag selector.
#[derive(Error, Debug)]
pub enum TagSpecError {
    /// A spec is empty or whitespace only.
    #[error("tag spec #{index} is blank")]
    Blank {
        /// Position of the spec in the list.
        index: usize,
    },

    /// A `regex:` spec does not compile.
    #[error("tag spec '{spec}' is not a valid regular expression: {source}")]
    InvalidPattern {
        /// The offending spec.
        spec: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}

/// Predicate deciding which tags of a repository are in scope.
pub trait TagSet: fmt::Debug + Send + Sync {
    /// Returns true if the tag is selected.
    fn matches(&self, tag: &str) -> bool;

    /// Returns true if the selector places no restriction on tags.
    fn is_empty(&self) -> bool;
}

/// Builds tag selectors from raw spec strings.
///
/// Construction is atomic: the first invalid spec aborts with an error and
/// no selector is produced.
pub trait TagSetFactory {
    /// Builds a selector from the given specs.
    ///
    /// # Errors
    ///
    /// Returns an error if any spec is malformed.
    fn build(&self, specs: &[String]) -> Result<Box<dyn TagSet>, TagSpecError>;
}

#[derive(Debug, Clone)]
enum TagMatcher {
    Exact(String),
    Pattern(Regex),
}

impl TagMatcher {
    fn parse(spec: &str) -> Result<Self, TagSpecError> {
        match spec.strip_prefix(REGEX_PREFIX) {
            Some(pattern) => compile_regex(pattern, true)
                .map(Self::Pattern)
                .map_err(|source| TagSpecError::InvalidPattern {
                    spec: spec.to_string(),
                    source,
                }),
            None => Ok(Self::Exact(spec.to_string())),
        }
    }

    fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Exact(name) => name == tag,
            Self::Pattern(re) => re.is_match(tag),
        }
    }
}

/// Default tag selector: literal names and `regex:` patterns, optionally
/// negated with `!`.
///
/// # Examples
///
/// ```
/// use regsync_core::tags::{TagFilter, TagSet};
///
/// let filter = TagFilter::parse(&["regex:v1\\..*", "!v1.0.0-rc1"]).unwrap();
/// assert!(filter.matches("v1.2.0"));
/// assert!(!filter.matches("v1.0.0-rc1"));
/// assert!(!filter.matches("v2.0.0"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    include: Vec<TagMatcher>,
    exclude: Vec<TagMatcher>,
}

impl TagFilter {
    /// Parses a list of tag specs.
    ///
    /// # Errors
    ///
    /// Returns an error for the first blank or malformed spec.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Result<Self, TagSpecError> {
        let mut filter = Self::default();

        for (index, spec) in specs.iter().enumerate() {
            let spec = spec.as_ref().trim();
            let (negated, body) = match spec.strip_prefix(NEGATION_PREFIX) {
                Some(body) => (true, body.trim_start()),
                None => (false, spec),
            };
            if body.is_empty() {
                return Err(TagSpecError::Blank { index });
            }

            let matcher = TagMatcher::parse(body)?;
            if negated {
                filter.exclude.push(matcher);
            } else {
                filter.include.push(matcher);
            }
        }

        Ok(filter)
    }
}

impl TagSet for TagFilter {
    fn matches(&self, tag: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|m| m.matches(tag));
        included && !self.exclude.iter().any(|m| m.matches(tag))
    }

    fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Factory producing [`TagFilter`] selectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagFilterFactory;

impl TagSetFactory for TagFilterFactory {
    fn build(&self, specs: &[String]) -> Result<Box<dyn TagSet>, TagSpecError> {
        Ok(Box::new(TagFilter::parse(specs)?))
    }
}
