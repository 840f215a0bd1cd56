// crates/broker-gate-security/src/matcher.rs
// ============================================================================
// Module: Endpoint Matchers
// Description: Method/path predicates used to scope security policies.
// Purpose: Decide whether a policy applies to the endpoint of a live request.
// Dependencies: serde::{Deserialize, Serialize}
// ============================================================================

//! ## Overview
//! A [`Matcher`] is a predicate over an [`Endpoint`], the `(method, path)`
//! pair extracted from the live request at evaluation time. Matchers compose
//! through path patterns, method lists, and negation. A [`FilterMatcher`] is
//! a named AND-group of matchers; a filter applies when **any** of its groups
//! matches (OR across groups, AND within a group).
//!
//! ## Invariants
//! - Path patterns support exact segments, `*` (exactly one segment), and a
//!   trailing `**` (any suffix, including the empty suffix).
//! - Endpoints are never cached across requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Method
// ============================================================================

/// HTTP method of an inbound request.
///
/// # Invariants
/// - Represents the closed set of verbs the gateway routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP HEAD.
    Head,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
    /// HTTP OPTIONS.
    Options,
}

impl Method {
    /// Parses a method from its upper- or lower-case name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }

    /// Returns the canonical upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }
}

// ============================================================================
// SECTION: Endpoint
// ============================================================================

/// Method/path pair extracted from a live request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Request method.
    method: Method,
    /// Request path.
    path: String,
}

impl Endpoint {
    /// Creates an endpoint from a method and path.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    /// Returns the request method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

// ============================================================================
// SECTION: Matcher
// ============================================================================

/// Predicate over an [`Endpoint`].
///
/// # Invariants
/// - `Paths` matches when any pattern matches the endpoint path.
/// - `Methods` matches when the endpoint method is listed.
/// - `Not` matches when the conjunction of its inner matchers does not.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches when any of the path patterns matches.
    Paths(Vec<String>),
    /// Matches when the request method is one of the listed methods.
    Methods(Vec<Method>),
    /// Matches when the inner conjunction does not fully match.
    Not(Vec<Matcher>),
}

impl Matcher {
    /// Builds a path matcher from the given patterns.
    #[must_use]
    pub fn paths<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Paths(patterns.into_iter().map(Into::into).collect())
    }

    /// Builds a method matcher from the given methods.
    #[must_use]
    pub fn methods<I>(methods: I) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self::Methods(methods.into_iter().collect())
    }

    /// Builds a negation of the conjunction of the inner matchers.
    #[must_use]
    pub fn negate<I>(inner: I) -> Self
    where
        I: IntoIterator<Item = Matcher>,
    {
        Self::Not(inner.into_iter().collect())
    }

    /// Evaluates the matcher against an endpoint.
    #[must_use]
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        match self {
            Self::Paths(patterns) => {
                patterns.iter().any(|pattern| path_pattern_matches(pattern, endpoint.path()))
            }
            Self::Methods(methods) => methods.contains(&endpoint.method()),
            Self::Not(inner) => !inner.iter().all(|matcher| matcher.matches(endpoint)),
        }
    }
}

// ============================================================================
// SECTION: Filter Matcher
// ============================================================================

/// Named AND-group of matchers attached to a filter.
///
/// # Invariants
/// - An empty group matches every endpoint (conjunction over nothing).
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    /// Group name used in audit events.
    name: String,
    /// Matchers combined with AND.
    matchers: Vec<Matcher>,
}

impl FilterMatcher {
    /// Creates a named AND-group from the given matchers.
    #[must_use]
    pub fn new(name: impl Into<String>, matchers: Vec<Matcher>) -> Self {
        Self {
            name: name.into(),
            matchers,
        }
    }

    /// Returns the group name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends another matcher to the AND-group.
    pub fn push(&mut self, matcher: Matcher) {
        self.matchers.push(matcher);
    }

    /// Returns true when every matcher in the group matches.
    #[must_use]
    pub fn matches(&self, endpoint: &Endpoint) -> bool {
        self.matchers.iter().all(|matcher| matcher.matches(endpoint))
    }
}

/// Returns true when any group in the set matches the endpoint.
///
/// An empty set matches nothing.
#[must_use]
pub fn any_filter_matches(set: &[FilterMatcher], endpoint: &Endpoint) -> bool {
    set.iter().any(|matcher| matcher.matches(endpoint))
}

// ============================================================================
// SECTION: Path Patterns
// ============================================================================

/// Trailing pattern segment matching any suffix, including the empty suffix.
const ANY_SUFFIX: &str = "**";
/// Pattern segment matching exactly one path segment.
const ANY_SEGMENT: &str = "*";

/// Splits a path or pattern into non-empty segments.
fn segments(value: &str) -> Vec<&str> {
    value.split('/').filter(|segment| !segment.is_empty()).collect()
}

/// Evaluates a single path pattern against a request path.
fn path_pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments = segments(pattern);
    let path_segments = segments(path);

    if pattern_segments.last() == Some(&ANY_SUFFIX) {
        let prefix = &pattern_segments[..pattern_segments.len() - 1];
        if path_segments.len() < prefix.len() {
            return false;
        }
        return prefix
            .iter()
            .zip(path_segments.iter())
            .all(|(pattern_segment, path_segment)| segment_matches(pattern_segment, path_segment));
    }

    pattern_segments.len() == path_segments.len()
        && pattern_segments
            .iter()
            .zip(path_segments.iter())
            .all(|(pattern_segment, path_segment)| segment_matches(pattern_segment, path_segment))
}

/// Evaluates a single pattern segment against a path segment.
fn segment_matches(pattern_segment: &str, path_segment: &str) -> bool {
    pattern_segment == ANY_SEGMENT || pattern_segment == path_segment
}

// ============================================================================
// SECTION: Tests
// ============================================================================
