//! Router error types.

use thiserror::Error;

/// Result type for routing operations.
pub type RouteResult<T> = Result<T, RouteError>;

/// Errors in route tables and URL generation.
///
/// An unmatched path is not an error: it is redirected to the not-found
/// route. Handler failures are caught at the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Reverse generation is missing a parameter value.
    #[error("Missing value for route parameter ':{0}'")]
    MissingParam(String),

    /// The same parameter name appears twice in one pattern.
    #[error("Duplicate parameter ':{name}' in route pattern '{pattern}'")]
    DuplicateParam { pattern: String, name: String },

    /// The pattern cannot be compiled.
    #[error("Invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A route was registered after the wildcard fallback.
    #[error("Route '{0}' registered after the wildcard route would never match")]
    WildcardNotLast(String),

    /// No route carries the requested name.
    #[error("No route named '{0}'")]
    UnknownRoute(String),

    /// Wildcard patterns have no canonical URL.
    #[error("Route pattern '{0}' contains a wildcard and cannot be reversed")]
    NotReversible(String),

    /// Navigation was requested before the router started.
    #[error("Router has not been initialized")]
    NotInitialized,
}
