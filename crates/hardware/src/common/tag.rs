//! Tags: the renaming identifier attached to every outstanding register write.
//!
//! A tag is a small, monotonically-increasing counter scoped to one register
//! bank (A, D, or P) and one register index. While a write is outstanding,
//! readers that observe the register's `pendingTags` bit can carry the
//! expected `(bank, index, tag)` forward instead of a value, and later match
//! it against whatever the result bus delivers.

use std::fmt;

/// Which register bank a [`Tag`] or [`TaggedSource`] belongs to.
///
/// `B` is the unified address bank containing both `A` and `D` registers;
/// it exists only at the rename boundary, where an instruction's address
/// operand has not yet been classified into `A` or `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegKind {
    /// Address / short-value registers.
    A,
    /// Data / wide-value registers.
    D,
    /// Single-bit predicate/mask registers.
    P,
}

impl fmt::Display for RegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegKind::A => write!(f, "A"),
            RegKind::D => write!(f, "D"),
            RegKind::P => write!(f, "P"),
        }
    }
}

/// A renaming tag: identifies one specific outstanding write to one
/// specific register.
///
/// Tags are scoped per `(kind, index)`: two different registers may hold
/// the numerically same tag value without aliasing, because matching
/// always checks `(kind, index, tag)` together, never `tag` alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    /// Register bank this tag was issued against.
    pub kind: RegKind,
    /// Register index within that bank.
    pub index: u32,
    /// The tag value itself, taken modulo the bank's configured tag width.
    pub value: u32,
}

impl Tag {
    /// Creates a new tag, wrapping `value` to `width` bits.
    #[must_use]
    pub fn new(kind: RegKind, index: u32, value: u32, width: u32) -> Self {
        let mask = (1u32 << width) - 1;
        Self {
            kind,
            index,
            value: value & mask,
        }
    }

    /// Returns the next tag value after this one, wrapping at `width` bits.
    #[must_use]
    pub fn next(self, width: u32) -> Self {
        let mask = (1u32 << width) - 1;
        Self {
            value: self.value.wrapping_add(1) & mask,
            ..self
        }
    }
}

/// The result of reading a register: either a resolved value, or an
/// unresolved reference to the tag that will eventually produce it.
///
/// Reservation-station operand slots store `TaggedSource` directly; the
/// result bus snoop logic looks for a `(kind, index, tag)` match on every
/// unresolved source each cycle and, on a hit, replaces it with a resolved
/// value in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedSource {
    /// The value, valid only when `resolved` is `true`.
    pub value: u64,
    /// Whether `value` already holds the final result.
    pub resolved: bool,
    /// The register this source reads, for bus-snoop matching.
    pub kind: RegKind,
    /// The register index this source reads.
    pub index: u32,
    /// The tag expected to resolve this source, when `resolved` is `false`.
    pub tag: Tag,
}

impl TaggedSource {
    /// Builds an already-resolved source (no outstanding write was pending).
    #[must_use]
    pub fn resolved(kind: RegKind, index: u32, value: u64) -> Self {
        Self {
            value,
            resolved: true,
            kind,
            index,
            tag: Tag {
                kind,
                index,
                value: 0,
            },
        }
    }

    /// Builds an unresolved source waiting on `tag`.
    #[must_use]
    pub fn pending(kind: RegKind, index: u32, tag: Tag) -> Self {
        Self {
            value: 0,
            resolved: false,
            kind,
            index,
            tag,
        }
    }

    /// Attempts to resolve this source against one result-bus entry.
    ///
    /// Returns `true` if the entry matched and this source is now resolved.
    pub fn snoop(&mut self, produced: Tag, value: u64) -> bool {
        if !self.resolved && self.tag == produced {
            self.value = value;
            self.resolved = true;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_wraps_at_width() {
        let t = Tag::new(RegKind::A, 3, 0b111, 3);
        assert_eq!(t.value, 0b111);
        let next = t.next(3);
        assert_eq!(next.value, 0);
        assert_eq!(next.index, 3);
    }

    #[test]
    fn snoop_matches_only_exact_tag() {
        let tag = Tag::new(RegKind::D, 5, 2, 4);
        let mut src = TaggedSource::pending(RegKind::D, 5, tag);
        let other = Tag::new(RegKind::D, 5, 3, 4);
        assert!(!src.snoop(other, 99));
        assert!(!src.resolved);
        assert!(src.snoop(tag, 42));
        assert!(src.resolved);
        assert_eq!(src.value, 42);
    }

    #[test]
    fn snoop_is_idempotent_once_resolved() {
        let kind = RegKind::P;
        let mut src = TaggedSource::resolved(kind, 0, 1);
        let tag = Tag::new(kind, 0, 0, 2);
        assert!(!src.snoop(tag, 0));
        assert_eq!(src.value, 1);
    }
}
