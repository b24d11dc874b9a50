//! # Router Module
//!
//! The router ties the pieces together for one request cycle: it owns the
//! request data, the route table and the URL generator, hands the table to
//! the [dispatcher](crate::dispatcher) exactly once per request, builds
//! links by route name and runs the matched-route pipeline.
//!
//! ## Example
//!
//! ```rust,ignore
//! use http::Method;
//! use waymark::{Handler, RequestData, RouteRegistrar, RouteResponse, Router};
//!
//! let request = RequestData::new(Method::GET, "/blog/45", Some("example.com"));
//! let mut router = Router::new(request, "https://example.com", "secret-key");
//!
//! router
//!     .get("blog/{id}", Handler::closure(|args| RouteResponse::from(args.get("id"))))
//!     .name("blog.show")
//!     .constrain("id", ":num");
//!
//! let route = router.dispatch()?;
//! assert_eq!(route.request_parameters().get("id"), Some("45"));
//!
//! let link = router.url("blog.show", [("id", "46")])?.generate()?;
//! assert_eq!(link, "https://example.com/blog/46");
//! ```
//!
//! ## Request cycle
//!
//! - [`Router::dispatch`] memoizes the matched route until
//!   [`Router::set_request_data`] or [`Router::clear`].
//! - [`Router::clear`] archives named routes so links to them still build
//!   while the table is rebuilt for the next simulated request.
//! - [`Router::respond`] dispatches, fires matched-route listeners, invokes
//!   the handler and shapes the result into a
//!   [`HandlerResponse`](crate::HandlerResponse).

mod core;
#[cfg(test)]
mod tests;

pub use core::Router;
