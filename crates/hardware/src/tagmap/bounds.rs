//! `computeMemTagBounds`/`computeRegTagBounds` (§4.6).
//!
//! These answer, for one byte tag on one side of a J2J transfer: how many
//! contiguous bytes belong to the same element on *both* sides
//! (`n_bytes`), which vlines on the other side it could land in, and
//! whether this particular lane's element falls inside the transfer's
//! requested range at all (`active`).
//!
//! `computeMemTagBounds` is given a byte tag on the memory side and
//! projects onto the register side; `computeRegTagBounds` is its mirror.
//! Both are pure integer algebra over the geometry in §4.6's preamble.
//!
//! Open question resolved here (see `DESIGN.md`): §4.6 step 6 references a
//! `reg_ve` that step 1-3 never defines for `computeMemTagBounds`. This
//! crate treats it as the `mem_ve` computed in step 1 — the element index
//! is shared across the mem/reg sides of one transfer element, it is only
//! the *bit offset within a vline* that differs by bank. The golden values
//! in §8 scenario 1 (`nBytes=4`, `startRegVline=0`, `endRegVline=0` for
//! `mem_tag ∈ {0, 4}`) are consistent with this reading.

/// The result of `computeMemTagBounds`/`computeRegTagBounds`: whether this
/// lane's element is in range, how many bytes of the tag are shared
/// between mem and reg element boundaries, and which vlines on the
/// *other* side it could span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagBounds {
    /// Whether this lane's computed element index falls inside
    /// `[start_index, start_index + n_elements)`.
    pub active: bool,
    /// Bytes shared by both sides' element boundaries, starting at this
    /// tag; S11 advances `current_tag` by this amount, not by one.
    pub n_bytes: u32,
    /// First vline index, on the other side, this element could land in.
    pub start_vline: u32,
    /// Last vline index, on the other side, this element could land in.
    pub end_vline: u32,
    /// 1 if this tag's bit offset falls before `base_bit_addr` (the
    /// element wraps to the next vline on the other side), else 0.
    pub v_offset: u32,
}

fn div_mod_euclid(value: i64, modulus: i64) -> (i64, i64) {
    (value.div_euclid(modulus), value.rem_euclid(modulus))
}

/// Computes bounds for a byte tag on the memory side, projecting onto the
/// register side.
///
/// - `mem_tag`: byte offset within this lane's memory word.
/// - `mem_ew`/`reg_ew`: element widths (bits) on each side.
/// - `j_in_l`: lanes participating in one memory word.
/// - `mem_vw`: this lane's linear position among the `j_in_l` participants.
/// - `base_bit_addr`: the register-side bit offset the memory word's bit 0
///   aligns to.
/// - `start_index`/`n_elements`: the transfer's requested element range.
/// - `elements_per_vline`: `vline_bytes * 8 / reg_ew`.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn compute_mem_tag_bounds(
    mem_tag: u32,
    mem_ew: u32,
    reg_ew: u32,
    j_in_l: u32,
    mem_vw: u32,
    base_bit_addr: u32,
    start_index: u32,
    n_elements: u32,
    elements_per_vline: u32,
) -> TagBounds {
    let mem_wb = mem_tag * 8;
    let mem_eb = mem_wb % mem_ew;
    let mem_ve = (mem_wb / mem_ew) * j_in_l + mem_vw;

    let mem_bit_in_vline = i64::from(mem_ve) * i64::from(mem_ew) + i64::from(mem_eb);
    let reg_bit = mem_bit_in_vline - i64::from(base_bit_addr);

    let (reg_vw_div, reg_eb) = div_mod_euclid(reg_bit, i64::from(reg_ew));
    let reg_vw = (reg_vw_div.rem_euclid(i64::from(j_in_l))) as u32;
    let _ = reg_vw; // not needed by any caller; kept to mirror compute_reg_tag_bounds's symmetry

    let n_bytes = (mem_ew - mem_eb).min(reg_ew - reg_eb as u32) / 8;

    let start_vline = start_index / elements_per_vline;
    let end_vline = (start_index + n_elements - 1) / elements_per_vline;

    let reg_ve = mem_ve;
    let active = (start_vline..=end_vline)
        .any(|v| {
            let elem = reg_ve + v * elements_per_vline;
            elem >= start_index && elem < start_index + n_elements
        });

    let v_offset = u32::from(mem_bit_in_vline < i64::from(base_bit_addr));

    TagBounds {
        active,
        n_bytes,
        start_vline,
        end_vline,
        v_offset,
    }
}

/// Mirror of [`compute_mem_tag_bounds`]: given a byte tag on the register
/// side, projects onto the memory side.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn compute_reg_tag_bounds(
    reg_tag: u32,
    reg_ew: u32,
    mem_ew: u32,
    j_in_l: u32,
    reg_vw: u32,
    base_bit_addr: u32,
    start_index: u32,
    n_elements: u32,
    elements_per_vline: u32,
) -> TagBounds {
    let reg_wb = reg_tag * 8;
    let reg_eb = reg_wb % reg_ew;
    let reg_ve = (reg_wb / reg_ew) * j_in_l + reg_vw;

    let reg_bit_in_vline = i64::from(reg_ve) * i64::from(reg_ew) + i64::from(reg_eb);
    let mem_bit = reg_bit_in_vline + i64::from(base_bit_addr);

    let (mem_vw_div, mem_eb) = div_mod_euclid(mem_bit, i64::from(mem_ew));
    let mem_vw = (mem_vw_div.rem_euclid(i64::from(j_in_l))) as u32;
    let _ = mem_vw;

    let n_bytes = (reg_ew - reg_eb).min(mem_ew - mem_eb as u32) / 8;

    let start_vline = start_index / elements_per_vline;
    let end_vline = (start_index + n_elements - 1) / elements_per_vline;

    let mem_ve = reg_ve;
    let active = (start_vline..=end_vline).any(|v| {
        let elem = mem_ve + v * elements_per_vline;
        elem >= start_index && elem < start_index + n_elements
    });

    let v_offset = u32::from(mem_bit >= i64::from(base_bit_addr));

    TagBounds {
        active,
        n_bytes,
        start_vline,
        end_vline,
        v_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario 1: LoadJ2JWords single vline.
    #[test]
    fn scenario_load_j2j_single_vline() {
        let elements_per_vline = 128 * 8 / 32;
        let bounds_tag0 = compute_mem_tag_bounds(0, 32, 32, 16, 6, 64, 0, 32, elements_per_vline);
        assert_eq!(bounds_tag0.n_bytes, 4);
        assert_eq!(bounds_tag0.start_vline, 0);
        assert_eq!(bounds_tag0.end_vline, 0);
        assert!(bounds_tag0.active);

        let bounds_tag4 = compute_mem_tag_bounds(4, 32, 32, 16, 6, 64, 0, 32, elements_per_vline);
        assert_eq!(bounds_tag4.n_bytes, 4);
        assert_eq!(bounds_tag4.start_vline, 0);
        assert_eq!(bounds_tag4.end_vline, 0);
        assert!(bounds_tag4.active);
    }

    #[test]
    fn inactive_when_element_outside_requested_range() {
        let elements_per_vline = 128 * 8 / 32;
        let bounds = compute_mem_tag_bounds(0, 32, 32, 16, 0, 64, 100, 4, elements_per_vline);
        assert!(!bounds.active);
    }

    proptest::proptest! {
        #[test]
        fn n_bytes_is_always_at_least_width_over_8_when_aligned(
            mem_vw in 0u32..16,
            base in 0u32..256,
        ) {
            let elements_per_vline = 128 * 8 / 32;
            let bounds = compute_mem_tag_bounds(0, 32, 32, 16, mem_vw, base, 0, 32, elements_per_vline);
            proptest::prop_assert!(bounds.n_bytes >= 1);
            proptest::prop_assert!(bounds.n_bytes <= 4);
        }
    }
}
