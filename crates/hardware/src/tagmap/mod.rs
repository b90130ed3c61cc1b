//! Tag Mapping Calculator: pure combinational functions mapping
//! memory/register tags into byte counts, target peers, and vline ranges
//! (§4.6).
//!
//! All geometry shares the conventions §4.6 opens with: each lane owns
//! `word_bytes` bytes of a memory word, `j_in_l` lanes participate in one
//! word, and `elements_per_vline = vline_bytes * 8 / element_width`.
//!
//! Every function here is a pure `fn`: no `&mut self`, no I/O. They are the
//! only part of the lane core proved with `proptest` rather than
//! hand-picked cases, because their correctness is an algebraic property
//! (the round-trip in §8) rather than a state-machine trace.

/// `computeMemTagBounds`/`computeRegTagBounds`: per-tag byte-count and
/// vline-range arithmetic.
pub mod bounds;
/// `computeMemTagTarget`/`computeRegTagTarget`: peer-lane coordinates for a
/// given vline offset.
pub mod target;
/// `computeTagInfo`: the element/page-boundary byte-count rule used by
/// non-J2J (strided/indexed) transfers.
pub mod info;

pub use bounds::{compute_mem_tag_bounds, compute_reg_tag_bounds, TagBounds};
pub use info::{compute_tag_info, TagInfo};
pub use target::{compute_mem_tag_target, compute_reg_tag_target, PeerCoord};

/// Number of elements held by one vline at a given element width.
#[must_use]
pub fn elements_per_vline(vline_bytes: u32, element_width: u32) -> u32 {
    vline_bytes * 8 / element_width
}
