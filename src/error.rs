//! Typed routing failures.
//!
//! Dispatch fails with [`RoutingError::RouteNotFound`],
//! [`RoutingError::InvalidSignature`] or [`RoutingError::TranslationMissing`];
//! all three are "this link does not work" conditions for the client and map
//! to a 404. URL building fails with [`UrlGenerationError`], which is a
//! programming error (a forgotten parameter, a misspelled route name) and maps
//! to a 500.

use std::fmt;

use crate::route::Route;

/// Failure raised while turning a pattern or route name into a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlGenerationError {
    /// A required placeholder had no value.
    MissingParameter { uri: String, parameter: String },
    /// No route is registered under this name.
    UndefinedRoute { name: String },
    /// The signing key was rejected by the MAC.
    InvalidSigningKey,
}

impl fmt::Display for UrlGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlGenerationError::MissingParameter { uri, parameter } => write!(
                f,
                "unable to generate url for [{uri}] as missing parameter [{parameter}]"
            ),
            UrlGenerationError::UndefinedRoute { name } => {
                write!(f, "unable to generate url from undefined route name [{name}]")
            }
            UrlGenerationError::InvalidSigningKey => f.write_str("invalid url signing key"),
        }
    }
}

impl std::error::Error for UrlGenerationError {}

/// Error returned by dispatch, URL building and handler invocation.
#[derive(Debug)]
pub enum RoutingError {
    /// No candidate survived method, domain, query, path, constraint and refinement filtering.
    RouteNotFound { method: String, uri: String },
    /// A signed route matched structurally but its signature or expiry did not verify.
    ///
    /// `route` is `None` when the check ran without a matched route.
    InvalidSignature {
        route: Option<Box<Route>>,
        message: String,
    },
    /// No locale or translated segment could be established.
    TranslationMissing {
        route: Option<Box<Route>>,
        message: String,
    },
    UrlGeneration(UrlGenerationError),
    /// The handler invoker has nothing registered for a route's handler key.
    HandlerNotFound { handler: String },
}

impl RoutingError {
    pub(crate) fn translation(route: Option<&Route>, message: impl Into<String>) -> Self {
        RoutingError::TranslationMissing {
            route: route.map(|r| Box::new(r.clone())),
            message: message.into(),
        }
    }

    /// HTTP status an error-handling boundary should respond with.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            404
        } else {
            500
        }
    }

    /// `true` for request-time failures, `false` for programming errors.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RoutingError::RouteNotFound { .. }
                | RoutingError::InvalidSignature { .. }
                | RoutingError::TranslationMissing { .. }
        )
    }

    /// The route attached to a signature or translation failure, if any.
    #[must_use]
    pub fn route(&self) -> Option<&Route> {
        match self {
            RoutingError::InvalidSignature { route, .. }
            | RoutingError::TranslationMissing { route, .. } => route.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingError::RouteNotFound { method, uri } => {
                write!(f, "route not found for {method} {uri}")
            }
            RoutingError::InvalidSignature { message, .. } => {
                write!(f, "invalid signature: {message}")
            }
            RoutingError::TranslationMissing { message, .. } => {
                write!(f, "translation missing: {message}")
            }
            RoutingError::UrlGeneration(err) => write!(f, "{err}"),
            RoutingError::HandlerNotFound { handler } => {
                write!(f, "no handler registered for [{handler}]")
            }
        }
    }
}

impl std::error::Error for RoutingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RoutingError::UrlGeneration(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UrlGenerationError> for RoutingError {
    fn from(err: UrlGenerationError) -> Self {
        RoutingError::UrlGeneration(err)
    }
}

/// Result alias used across the crate.
pub type Result<T, E = RoutingError> = std::result::Result<T, E>;
