//! Path pattern compilation.
//!
//! Mapping paths are either literal repository paths or regular expressions.
//! A regular expression is marked by the [`REGEX_PREFIX`]; the distinction is
//! resolved once at validation time into [`SourcePattern`] and
//! [`TargetPattern`], so filtering and rewriting never look at the prefix
//! again.

use regex::Regex;

use crate::error::{MappingError, Result};

/// Prefix marking a mapping path as a regular expression.
pub const REGEX_PREFIX: &str = "regex:";

/// Compiles a regular expression.
///
/// An anchored expression only matches when it spans the entire input.
/// Unanchored expressions match anywhere, which is what find-and-replace
/// needs.
///
/// # Errors
///
/// Returns the regex error if the pattern does not compile.
///
/// # Examples
///
/// ```
/// use regsync_core::pattern::compile_regex;
///
/// let anchored = compile_regex("foo/.*", true).unwrap();
/// assert!(anchored.is_match("foo/bar"));
/// assert!(!anchored.is_match("x/foo/bar"));
///
/// let partial = compile_regex("foo", false).unwrap();
/// assert!(partial.is_match("x/foo/bar"));
/// ```
pub fn compile_regex(pattern: &str, anchored: bool) -> std::result::Result<Regex, regex::Error> {
    if anchored {
        Regex::new(&format!("^(?:{pattern})$"))
    } else {
        Regex::new(pattern)
    }
}

/// Makes a path absolute by prefixing `/` when missing.
///
/// Nothing else is touched: trailing and repeated slashes stay as they are.
///
/// # Examples
///
/// ```
/// use regsync_core::pattern::normalize_path;
///
/// assert_eq!(normalize_path("library/busybox"), "/library/busybox");
/// assert_eq!(normalize_path("/library//busybox/"), "/library//busybox/");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Compiled form of a mapping's `from` path.
#[derive(Debug, Clone)]
pub enum SourcePattern {
    /// A single repository, normalized to an absolute path.
    Literal(String),
    /// Every repository whose full path matches the expression.
    Regex(Regex),
}

impl SourcePattern {
    /// Compiles a raw `from` value.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingSource`] for an empty value and
    /// [`MappingError::InvalidSourcePattern`] for a pattern that does not
    /// compile.
    pub fn compile(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(MappingError::MissingSource);
        }

        match raw.strip_prefix(REGEX_PREFIX) {
            Some(pattern) => compile_regex(pattern, true)
                .map(Self::Regex)
                .map_err(|source| MappingError::InvalidSourcePattern {
                    pattern: pattern.to_string(),
                    source,
                }),
            None => Ok(Self::Literal(normalize_path(raw))),
        }
    }

    /// Returns true if this is a regular expression.
    #[must_use]
    pub const fn is_regex(&self) -> bool {
        matches!(self, Self::Regex(_))
    }
}

/// Compiled form of a mapping's `to` path.
#[derive(Debug, Clone)]
pub enum TargetPattern {
    /// No target given; repositories keep their source path.
    Same,
    /// A fixed destination path, normalized to an absolute path.
    Literal(String),
    /// A find-and-replace rule applied to the source path.
    Regex {
        /// Unanchored expression.
        pattern: Regex,
        /// Replacement template, may reference capture groups (`$1`).
        replacement: String,
    },
}

impl TargetPattern {
    /// Compiles a raw `to` value.
    ///
    /// The regex form is `regex:<pattern>,<replacement>`, split on the first
    /// comma. The replacement must not be empty.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingReplacement`] when the regex form has no
    /// replacement, and [`MappingError::InvalidTargetPattern`] for a pattern that
    /// does not compile.
    pub fn compile(raw: &str) -> Result<Self> {
        if let Some(rest) = raw.strip_prefix(REGEX_PREFIX) {
            let (pattern, replacement) = rest
                .split_once(',')
                .filter(|(_, replacement)| !replacement.is_empty())
                .ok_or(MappingError::MissingReplacement)?;
            let compiled = compile_regex(pattern, false).map_err(|source| {
                MappingError::InvalidTargetPattern {
                    pattern: pattern.to_string(),
                    source,
                }
            })?;
            return Ok(Self::Regex {
                pattern: compiled,
                replacement: replacement.to_string(),
            });
        }

        if raw.is_empty() {
            Ok(Self::Same)
        } else {
            Ok(Self::Literal(normalize_path(raw)))
        }
    }
}
