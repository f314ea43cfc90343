use crate::core::actions::schedule::policy::SchedulePolicy;
use crate::core::util::even_split::even_split;
use std::ops::Range;

pub const DEFAULT_DYNAMIC_CHUNK: usize = 64;
pub const DEFAULT_GUIDED_MIN_CHUNK: usize = 1;

/// Splits `0..total` pixel indices into the chunks a policy hands out, in
/// queue order. Chunks are contiguous, non-empty and cover the range exactly.
#[must_use]
pub fn plan_chunks(
    policy: SchedulePolicy,
    total: usize,
    workers: usize,
    chunk_size: Option<usize>,
) -> Vec<Range<usize>> {
    let workers = workers.max(1);

    match policy {
        SchedulePolicy::Static => (0..workers)
            .map(|worker| even_split(worker, workers, total))
            .filter(|chunk| !chunk.is_empty())
            .collect(),
        SchedulePolicy::Dynamic => {
            let size = chunk_size.unwrap_or(DEFAULT_DYNAMIC_CHUNK).max(1);
            (0..total)
                .step_by(size)
                .map(|start| start..(start + size).min(total))
                .collect()
        }
        SchedulePolicy::Guided => {
            let minimum = chunk_size.unwrap_or(DEFAULT_GUIDED_MIN_CHUNK).max(1);
            let mut chunks = Vec::new();
            let mut start = 0;

            while start < total {
                let remaining = total - start;
                let size = remaining.div_ceil(workers).max(minimum).min(remaining);
                chunks.push(start..start + size);
                start += size;
            }

            chunks
        }
    }
}
