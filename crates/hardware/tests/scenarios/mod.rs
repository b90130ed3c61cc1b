//! End-to-end scenarios, one module per case, each driving a `Lane`
//! through `dispatch`/`step` rather than poking at a single component.
pub mod rename_hazard;
