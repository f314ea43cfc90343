/// Turns a configured thread count into a concrete one; `0` means every
/// available processing unit.
#[must_use]
pub fn resolve_worker_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }

    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_count_is_kept() {
        assert_eq!(resolve_worker_count(3), 3);
        assert_eq!(resolve_worker_count(1), 1);
    }

    #[test]
    fn test_zero_uses_available_parallelism() {
        let num_avail_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        assert_eq!(resolve_worker_count(0), num_avail_threads);
        assert!(resolve_worker_count(0) >= 1);
    }
}
