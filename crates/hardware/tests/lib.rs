//! Integration tests for `zamlet-core`, driven entirely through `Lane`'s
//! public API.
//!
//! Unlike the unit tests colocated in `src/`, these exercise a fully
//! assembled lane across several cycles, the way a scenario running on
//! real firmware would.
pub mod scenarios;
