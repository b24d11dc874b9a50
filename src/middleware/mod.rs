//! Request-boundary helpers.
//!
//! These are the two checks an HTTP layer typically runs around the router:
//! rewriting the request verb before dispatch ([`MethodOverride`]) and
//! enforcing link signatures on an already matched route
//! ([`verify_signature`]) for routes registered with
//! `signed(name, false)`.

mod method_override;
mod signature;

pub use method_override::{MethodOverride, DEFAULT_OVERRIDE_FIELD, DEFAULT_OVERRIDE_HEADER};
pub use signature::verify_signature;
