//! # Constraint Rules
//!
//! Named validators for path placeholders. A rule contributes a regex
//! fragment used while compiling a route pattern, a post-match check run on
//! the captured value, or both.
//!
//! Constraints are written either as a delimited string or as a list:
//!
//! | Constraint            | Regex             | Post-match check |
//! |-----------------------|-------------------|------------------|
//! | `":alpha"`            | `[a-zA-Z]+`       | -                |
//! | `":num:4"`            | `[0-9]{4}`        | -                |
//! | `":alphaNum:4:6"`     | `[a-zA-Z0-9]{4,6}`| -                |
//! | `":alpha:4:"`         | `[a-zA-Z]{4,}`    | -                |
//! | `":id"`               | `[0-9]{1,21}`     | value ≥ 1        |
//! | `":id:5:10"`          | `[0-9]{1,5}`      | value ≥ 10       |
//! | `["in", "de", "en"]`  | *(none)*          | membership       |
//! | `"[0-9]+"`            | `[0-9]+`          | -                |
//!
//! Anything that does not name a registered rule is lenient: `regex()` hands
//! back the constraint itself as a literal pattern and `matches()` accepts.

mod core;
mod rules;

pub use core::{Constrainer, Constraint};
pub use rules::{AlphaNumRule, AlphaRule, ConstraintRule, IdRule, InRule, NumRule, Rule};
