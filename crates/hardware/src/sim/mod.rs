//! The per-lane cycle driver (§4.8): wires rename/dispatch, the
//! reservation stations, the execution units, the Witem Monitor, the
//! sync coordinator, and the outgoing packet channel into one
//! steppable [`lane::Lane`].

/// The `Lane` driver itself.
pub mod lane;

pub use lane::Lane;
