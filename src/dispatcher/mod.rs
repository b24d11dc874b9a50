//! # Dispatcher Module
//!
//! The dispatcher selects the route for the router's current request. It is
//! a linear first-match scan: the route table is ordered by registration and
//! the first candidate that accepts the request wins.
//!
//! ## Matching
//!
//! For each candidate, in order:
//!
//! 1. Routes with domain bindings are forked for the request domain; a
//!    request without a domain cannot match them.
//! 2. The selected domain must equal the request domain.
//! 3. The method spec (`GET`, `GET|HEAD`, `*`) must allow the request method.
//! 4. If the request carries a query string, the route's query constraint
//!    is applied to the raw query string as a whole.
//! 5. The trimmed path must match the pattern. Static patterns compare
//!    literally; others compile to an anchored regex (see below).
//! 6. Every captured value is re-checked against its constraint rule.
//! 7. The refinement steps (locale, translations, custom) run in order.
//! 8. A signed route that validates signatures must carry a valid,
//!    unexpired signature, otherwise dispatch fails with
//!    [`RoutingError::InvalidSignature`](crate::RoutingError::InvalidSignature).
//!
//! ## Pattern compilation
//!
//! | Segment      | Regex fragment                  |
//! |--------------|---------------------------------|
//! | `blog`       | `/blog`                         |
//! | `{id}`       | `(?P<p0>/(?:[^/]+))`            |
//! | `{?locale}`  | `(?P<p0>/(?:[^/]+))?`           |
//! | `{path*}`    | `(?P<p0>/(?:[^?]+))` and stop   |
//!
//! A constraint resolving to a regex replaces the body of the `(?:...)` group.
//! Compiled regexes are cached per source string.
//!
//! ```rust,ignore
//! use waymark::{Router, RouteRegistrar};
//!
//! router.get("blog/{id}", "blog.show").constrain("id", ":num");
//! let route = router.dispatch()?;
//! assert_eq!(route.request_parameters().get("id"), Some("45"));
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{pattern_source, CompiledPattern, RouteDispatcher, SUPPORTED_METHODS};
