//! Pattern matching strategies.
//!
//! A rule pattern is compiled once into a [`PatternMatcher`] and then tested
//! against many paths. Two strategies exist:
//!
//! - **Wildcard**: `*` matches any run of characters (including none), `?`
//!   matches exactly one. The compiled pattern is anchored at the start of the
//!   path but does not need to consume all of it, so `Assets/*.png` also
//!   matches `Assets/a.png.meta`. A pattern with no wildcard characters is a
//!   plain, case-sensitive prefix test: `Assets/Art` means "that directory and
//!   everything under it".
//! - **Regex**: the pattern is used verbatim and may match anywhere in the path.

use regex::Regex;

use crate::config::MatchKind;
use crate::error::PatternError;

/// A compiled rule pattern.
#[derive(Debug, Clone)]
pub enum PatternMatcher {
    /// Literal wildcard pattern with no `*` or `?`.
    Prefix(String),
    /// Wildcard pattern translated to a start-anchored regex.
    Wildcard(Regex),
    /// User-supplied regex, unanchored.
    Regex(Regex),
}

impl PatternMatcher {
    /// Compile `pattern` according to `kind`.
    pub fn compile(pattern: &str, kind: MatchKind) -> Result<Self, PatternError> {
        match kind {
            MatchKind::Wildcard if !has_wildcards(pattern) => {
                Ok(Self::Prefix(pattern.to_string()))
            }
            MatchKind::Wildcard => {
                build_regex(&wildcard_to_regex(pattern), pattern).map(Self::Wildcard)
            }
            MatchKind::Regex => build_regex(pattern, pattern).map(Self::Regex),
        }
    }

    /// Returns `true` if `path` satisfies the pattern.
    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Self::Wildcard(re) | Self::Regex(re) => re.is_match(path),
        }
    }
}

/// Compile and evaluate in one step.
///
/// Prefer [`PatternMatcher::compile`] when the same pattern is tested against
/// many paths.
pub fn matches(pattern: &str, kind: MatchKind, path: &str) -> Result<bool, PatternError> {
    PatternMatcher::compile(pattern, kind).map(|m| m.is_match(path))
}

fn has_wildcards(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Escape every literal character, then turn the escaped `*` and `?` back
/// into their regex equivalents.
fn wildcard_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    format!("^{escaped}")
}

fn build_regex(source: &str, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(source).map_err(|e| PatternError {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}
