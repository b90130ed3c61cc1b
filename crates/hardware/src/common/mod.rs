//! Common types shared across every component of the lane core.
//!
//! 1. **Tags:** [`tag::Tag`] and [`tag::TaggedSource`], the renaming
//!    currency every reservation station and register bank deals in.
//! 2. **Errors:** [`error::DesignFault`] (asserted, never expected) and
//!    [`error::ProtocolOutcome`] (expected, locally recovered).

/// Tags and tagged-source values used for register renaming.
pub mod tag;

/// Error types: design-invariant violations and protocol-level outcomes.
pub mod error;

pub use error::{DesignFault, ProtocolOutcome};
pub use tag::{RegKind, Tag, TaggedSource};
