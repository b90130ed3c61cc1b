//! `computeTagInfo` (§4.6, §4.3 tag iteration rules): the byte-count rule
//! used by non-J2J (strided/indexed) transfers, where `n_elements ≤
//! j_in_l` means each lane owns exactly one element.
//!
//! A tag is *active* iff it sits on an RF-element, memory-element, or page
//! boundary; `n_bytes` is the smallest of the four remaining-byte counts
//! (§4.3: "`nBytes = min(remaining_rf_elem, remaining_mem_elem,
//! remaining_page, remaining_word)`"). Bytes of the word outside this
//! lane's one element (`[element_start, element_start + element_bytes)`)
//! are never active — they are batch-completed in a single step once
//! iteration reaches `element_start + element_bytes`, matching "tags
//! outside the element's byte range are batch-completed to COMPLETE".

/// Result of [`compute_tag_info`] for one byte tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagInfo {
    /// Whether this tag sits on an element or page boundary *and* lies
    /// inside this lane's one element.
    pub active: bool,
    /// Bytes to advance `current_tag` by.
    pub n_bytes: u32,
    /// Whether the byte range `[tag, tag + n_bytes)` crosses a page
    /// boundary (S8 uses this to decide whether a second TLB request is
    /// needed).
    pub crosses_page: bool,
}

/// Computes tag info for one byte tag of a strided/indexed transfer.
///
/// - `tag`: byte offset within this lane's memory word.
/// - `element_start`/`element_bytes`: the byte range, within the word,
///   that this lane's single element occupies.
/// - `rf_ew`/`mem_ew`: element widths in bits on the register/memory side.
/// - `g_addr`: the virtual byte address of `tag == element_start`.
/// - `page_bytes`: page size, for page-boundary detection.
/// - `word_bytes`: total bytes in this lane's memory word.
#[must_use]
#[allow(clippy::too_many_arguments)]
pub fn compute_tag_info(
    tag: u32,
    element_start: u32,
    element_bytes: u32,
    rf_ew: u32,
    mem_ew: u32,
    g_addr: u64,
    page_bytes: u32,
    word_bytes: u32,
) -> TagInfo {
    let element_end = element_start + element_bytes;

    if tag < element_start {
        return TagInfo {
            active: false,
            n_bytes: element_start - tag,
            crosses_page: false,
        };
    }
    if tag >= element_end {
        return TagInfo {
            active: false,
            n_bytes: word_bytes - tag,
            crosses_page: false,
        };
    }

    let offset_in_element = tag - element_start;
    let rf_elem_bytes = rf_ew / 8;
    let mem_elem_bytes = mem_ew / 8;
    let addr = g_addr + u64::from(offset_in_element);

    let remaining_rf_elem = rf_elem_bytes - (offset_in_element % rf_elem_bytes);
    let remaining_mem_elem = mem_elem_bytes - (offset_in_element % mem_elem_bytes);
    let remaining_page = page_bytes - (addr % u64::from(page_bytes)) as u32;
    let remaining_word = element_end - tag;

    let n_bytes = remaining_rf_elem
        .min(remaining_mem_elem)
        .min(remaining_page)
        .min(remaining_word);

    let active = offset_in_element % rf_elem_bytes == 0
        || offset_in_element % mem_elem_bytes == 0
        || addr % u64::from(page_bytes) == 0;

    let start_page = addr / u64::from(page_bytes);
    let end_page = (addr + u64::from(n_bytes) - 1) / u64::from(page_bytes);

    TagInfo {
        active,
        n_bytes,
        crosses_page: start_page != end_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// §8 scenario 2: StoreStride single element, no page crossing.
    #[test]
    fn scenario_store_stride_single_element() {
        let g_addr = 0x1600u64;
        let info = compute_tag_info(0, 0, 4, 32, 32, g_addr, 4096, 8);
        assert_eq!(info.n_bytes, 4);
        assert!(info.active);
        assert!(!info.crosses_page);

        let out_of_element = compute_tag_info(4, 0, 4, 32, 32, g_addr, 4096, 8);
        assert!(!out_of_element.active);
        assert_eq!(out_of_element.n_bytes, 4);
    }

    /// §8 scenario 3: LoadIndexedUnordered with page crossing.
    #[test]
    fn scenario_load_indexed_page_crossing() {
        let g_addr = 0x0FFEu64;
        let tag0 = compute_tag_info(0, 0, 4, 32, 32, g_addr, 4096, 8);
        assert_eq!(tag0.n_bytes, 2);
        assert!(tag0.active);

        let tag2 = compute_tag_info(2, 0, 4, 32, 32, g_addr, 4096, 8);
        assert_eq!(tag2.n_bytes, 2);
        assert!(tag2.active);

        let tag4 = compute_tag_info(4, 0, 4, 32, 32, g_addr, 4096, 8);
        assert!(!tag4.active);
        assert_eq!(tag4.n_bytes, 4);
    }
}
