use std::ops::Range;

/// The `index`-th of `parts` contiguous slices of `0..total`.
///
/// The first `total % parts` slices get one extra element, so slice lengths
/// never differ by more than one. `parts` must be non-zero.
#[must_use]
pub fn even_split(index: usize, parts: usize, total: usize) -> Range<usize> {
    let base = total / parts;
    let remainder = total % parts;
    let start = index * base + index.min(remainder);
    let len = base + usize::from(index < remainder);

    start..start + len
}
