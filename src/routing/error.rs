//! Routing error taxonomy.
//!
//! Everything here is a configuration-time failure (raised while collecting,
//! compiling or validating the route table) or a URL generation failure.
//! Request-time "no route" is never an error: the matcher reports it as a
//! [`MatchOutcome`](crate::routing::MatchOutcome) and the router turns it
//! into a 404/405 response.

use thiserror::Error;

use crate::routing::cache::CacheError;

/// Errors raised while building or querying the route table.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The path pattern could not be parsed.
    #[error("invalid route path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A parameter pattern is not a valid regular expression.
    #[error("invalid pattern for parameter `{parameter}` in route `{path}`: {source}")]
    InvalidRegex {
        path: String,
        parameter: String,
        #[source]
        source: Box<regex::Error>,
    },

    /// Two routes share a name.
    #[error("duplicate route name `{0}`")]
    DuplicateName(String),

    /// A route was declared without any HTTP method.
    #[error("route `{0}` accepts no HTTP methods")]
    NoMethods(String),

    /// A method token could not be parsed.
    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    /// An explicit parameter names a placeholder missing from the path.
    #[error("parameter `{parameter}` is not a placeholder of route `{path}`")]
    UnknownParameter { path: String, parameter: String },

    /// Redirect routes only accept 3xx redirection statuses.
    #[error("route `{path}` redirects with non-redirect status {status}")]
    InvalidRedirect { path: String, status: u16 },

    /// A route dispatches to a target nobody registered.
    #[error("route `{route}` dispatches to unregistered handler `{handler}`")]
    UnknownHandler { route: String, handler: String },

    /// A route or the global stack references an unregistered middleware.
    #[error("`{route}` references unknown middleware `{middleware}`")]
    UnknownMiddleware { route: String, middleware: String },

    /// URL generation for a name that is not in the collection.
    #[error("no route named `{0}`")]
    UnknownRoute(String),

    /// URL generation without a required parameter.
    #[error("missing parameter `{parameter}` for route `{route}`")]
    MissingParameter { route: String, parameter: String },

    /// A value does not satisfy the parameter's pattern.
    #[error("value `{value}` for parameter `{parameter}` of route `{route}` does not match `{pattern}`")]
    InvalidParameterValue {
        route: String,
        parameter: String,
        value: String,
        pattern: String,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl RoutingError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
