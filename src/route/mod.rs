//! # Routes
//!
//! A [`Route`] is a method spec, a pattern and a handler plus configuration
//! the dispatcher and the URL builder interpret: name, constraints, query
//! constraint, domain bindings, locale settings, translated segments,
//! signing, base URL and refinement steps.
//!
//! ## Patterns
//!
//! Patterns are `/`-separated segments:
//!
//! - `blog` - static literal
//! - `{id}` - required placeholder
//! - `{?locale}` - optional placeholder; the whole segment including its `/` may be absent
//! - `{path*}` - wildcard, captures every remaining segment; nothing may follow it
//!
//! ## Building route tables
//!
//! Routes are registered through [`RouteRegistrar`], implemented by the
//! router and by [`RouteGroup`]. Groups and resources materialize their
//! routes eagerly when their builder closure returns:
//!
//! ```rust,ignore
//! router.group("admin", |group| {
//!     group.middleware(["auth"]);
//!     group.get("dashboard", "dashboard").name("admin.dashboard");
//!     group.resource("products", "ProductsController", |products| {
//!         products.except(["delete"]);
//!     });
//! });
//! ```

mod core;
mod group;
mod refine;
mod registrar;
mod resource;
#[cfg(test)]
mod tests;

pub use core::{
    normalize_pattern, DomainBinding, DomainConfig, QueryConstraint, Route, RouteFactory,
    RouteParams, DEFAULT_LOCALE_NAME,
};
pub(crate) use core::signature_suffix;
pub use group::RouteGroup;
pub(crate) use refine::refine;
pub use refine::{RefineFn, Refined, Refinement};
pub use registrar::RouteRegistrar;
pub use resource::RouteResource;
