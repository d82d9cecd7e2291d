//! Reserved path prefix matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api` alone is not API traffic; only `/api/` and below match
//! - No regex, a single `strip_prefix`

/// Prefix that identifies API traffic on the application's own origin.
pub const API_PREFIX: &str = "/api";

/// Matches request paths under a reserved prefix and strips it.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. Trailing slashes are ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Matcher for [`API_PREFIX`].
    pub fn api() -> Self {
        Self::new(API_PREFIX)
    }

    /// The prefix without a trailing slash.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the path with the prefix removed, or `None` when it does not match.
    ///
    /// The remainder always starts with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())
            .filter(|rest| rest.starts_with('/'))
    }

    /// True when `path` is under the prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }
}

impl Default for PathPrefixMatcher {
    fn default() -> Self {
        Self::api()
    }
}
