//! # URL Module
//!
//! The inverse of dispatch: patterns plus parameters in, URLs out.
//!
//! - [`UrlGenerator`] resolves placeholders, appends leftover parameters as
//!   a query string, and signs or verifies links with HMAC-SHA256.
//! - [`Url`] is the per-route builder handed out by
//!   [`Router::url`](crate::Router::url). It layers locale selection,
//!   translated segments, domain alternatives and signing over the
//!   generator.
//!
//! ## Signed links
//!
//! A signed route's pattern ends in `/{?signature}/{?expires}`:
//!
//! | Mode  | Layout                                              |
//! |-------|-----------------------------------------------------|
//! | path  | `…/{value}/{signature}` or `…/{value}/{signature}/{expires}` |
//! | query | `?…&signature=<hex>` or `?…&expires=<ts>&signature=<hex>`     |
//!
//! The HMAC covers the fully resolved URL with the signature slot present
//! but empty and the expiry already substituted. Both signing and
//! verification build that string through
//! [`UrlGenerator::canonical_string_to_sign`] or the same URL assembly, and
//! verification compares MACs in constant time.

mod builder;
mod generator;

pub use builder::Url;
pub use generator::{CanonicalSignature, Expiration, UrlGenerator};
