//! Static API whitelist.
//!
//! Whitelisted identifiers (full gRPC method names or HTTP paths) bypass
//! token checks. Matching is exact: no prefixes, no wildcards, no case
//! folding.

use std::collections::HashSet;

/// Immutable set of request identifiers that need no token.
#[derive(Debug, Clone, Default)]
pub struct WhitelistMatcher {
    entries: HashSet<String>,
}

impl WhitelistMatcher {
    /// Build a matcher. Empty entries are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        entries.into_iter().collect()
    }

    /// Parse a comma-separated list, trimming whitespace around each entry.
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(',').map(str::trim))
    }

    /// Whether `identifier` is an exact member of the whitelist.
    #[must_use]
    pub fn is_whitelisted(&self, identifier: &str) -> bool {
        self.entries.contains(identifier)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the whitelist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for WhitelistMatcher {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(Into::into)
                .filter(|entry: &String| !entry.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let matcher = WhitelistMatcher::new(["/user.v1.UserService/Login", "/healthz"]);

        assert!(matcher.is_whitelisted("/user.v1.UserService/Login"));
        assert!(matcher.is_whitelisted("/healthz"));
        assert!(!matcher.is_whitelisted("/user.v1.UserService/Login/"));
        assert!(!matcher.is_whitelisted("/user.v1.UserService/login"));
        assert!(!matcher.is_whitelisted("/user.v1.UserService"));
        assert!(!matcher.is_whitelisted(""));
    }

    #[test]
    fn test_empty_whitelist_matches_nothing() {
        let matcher = WhitelistMatcher::default();
        assert!(matcher.is_empty());
        assert!(!matcher.is_whitelisted("/healthz"));
    }

    #[test]
    fn test_from_csv_trims_and_drops_empty() {
        let matcher = WhitelistMatcher::from_csv(" /a , /b,, ,/c ");
        assert_eq!(matcher.len(), 3);
        assert!(matcher.is_whitelisted("/b"));
        assert!(!matcher.is_whitelisted(" /a "));
    }
}
