//! Helper functions that don't belong to any concrete module of the allocator.

/// It aligns `to_be_aligned` using `aligment`, which has to be a power of two.
///
/// The arena itself makes no alignment promises to its callers, this is only
/// used to round the backing buffer request up to a whole number of pages
/// (see [`crate::kernel::page_size`]). Returns `None` when the rounded value
/// does not fit in a `usize`.
pub fn align(to_be_aligned: usize, aligment: usize) -> Option<usize> {
    Some(to_be_aligned.checked_add(aligment - 1)? & !(aligment - 1))
}
