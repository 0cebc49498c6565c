//! Route matching logic.
//!
//! # Responsibilities
//! - Validate route strings (non-empty, leading `/`)
//! - Classify routes: trailing `/` means prefix, anything else is exact
//! - Match event URIs against a route
//!
//! # Design Decisions
//! - Matching is case-sensitive, like the service's URIs
//! - A prefix route matches its own path too (`/lol-chat/` matches `/lol-chat/`)

use std::fmt;
use std::str::FromStr;

use crate::routing::router::RouterError;

const SEPARATOR: char = '/';

/// A validated registration route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Matches only an identical URI.
    Exact(String),
    /// Matches any URI starting with the stored prefix (which ends in `/`).
    Prefix(String),
}

impl Route {
    /// Validate and classify a route string.
    pub fn new(route: impl Into<String>) -> Result<Self, RouterError> {
        let route = route.into();
        if route.is_empty() {
            return Err(RouterError::InvalidRoute {
                route,
                reason: "route cannot be empty",
            });
        }
        if !route.starts_with(SEPARATOR) {
            return Err(RouterError::InvalidRoute {
                route,
                reason: "route must start with '/'",
            });
        }

        if route.ends_with(SEPARATOR) {
            Ok(Route::Prefix(route))
        } else {
            Ok(Route::Exact(route))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Route::Exact(route) | Route::Prefix(route) => route,
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, Route::Prefix(_))
    }

    /// Returns true if an event published on `uri` belongs to this route.
    pub fn matches(&self, uri: &str) -> bool {
        match self {
            Route::Exact(route) => route == uri,
            Route::Prefix(prefix) => uri.starts_with(prefix.as_str()),
        }
    }
}

impl FromStr for Route {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Route::new(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
