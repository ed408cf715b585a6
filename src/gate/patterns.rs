//! Path matching for route tables
//!
//! Route tables are data: literal prefixes plus optional regex patterns,
//! compiled once at startup.

use crate::gate::types::RouteCategory;
use crate::error::ConfigError;
use regex::Regex;

/// A single path matcher
#[derive(Debug, Clone)]
pub enum RouteMatcher {
    /// Plain string prefix; `/team` also matches `/teams`
    Prefix(String),
    /// Regex evaluated against the whole path
    Pattern(Regex),
}

impl RouteMatcher {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            RouteMatcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            RouteMatcher::Pattern(regex) => regex.is_match(path),
        }
    }

    /// The configured source text, for logging
    pub fn source(&self) -> &str {
        match self {
            RouteMatcher::Prefix(prefix) => prefix,
            RouteMatcher::Pattern(regex) => regex.as_str(),
        }
    }
}

/// Compiled set of matchers
#[derive(Debug, Clone, Default)]
pub struct MatcherSet {
    matchers: Vec<RouteMatcher>,
}

impl MatcherSet {
    /// Compile prefixes and regex patterns into one set
    pub fn new(prefixes: &[String], patterns: &[String]) -> Result<Self, ConfigError> {
        let mut matchers = Vec::with_capacity(prefixes.len() + patterns.len());

        for prefix in prefixes {
            matchers.push(RouteMatcher::Prefix(prefix.clone()));
        }

        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            })?;
            matchers.push(RouteMatcher::Pattern(regex));
        }

        Ok(Self { matchers })
    }

    /// Prefix-only set
    pub fn prefixes(prefixes: &[String]) -> Self {
        Self {
            matchers: prefixes
                .iter()
                .map(|p| RouteMatcher::Prefix(p.clone()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matchers.iter().any(|m| m.matches(path))
    }

    /// First matcher that accepts the path, returning its source
    pub fn find_match(&self, path: &str) -> Option<&str> {
        self.matchers
            .iter()
            .find(|m| m.matches(path))
            .map(RouteMatcher::source)
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }
}

/// A route category with its matchers and precedence rank
///
/// Lower rank is evaluated first.
#[derive(Debug, Clone)]
pub struct RouteTable {
    category: RouteCategory,
    rank: u8,
    matchers: MatcherSet,
}

impl RouteTable {
    pub fn new(category: RouteCategory, rank: u8, matchers: MatcherSet) -> Self {
        Self {
            category,
            rank,
            matchers,
        }
    }

    pub fn category(&self) -> RouteCategory {
        self.category
    }

    pub fn rank(&self) -> u8 {
        self.rank
    }

    pub fn matches(&self, path: &str) -> bool {
        self.matchers.matches(path)
    }

    pub fn find_match(&self, path: &str) -> Option<&str> {
        self.matchers.find_match(path)
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }
}
