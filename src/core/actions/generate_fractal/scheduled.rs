use rayon::{ThreadPool, ThreadPoolBuilder};
use std::ops::Range;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::core::actions::generate_fractal::serial::render_span;
use crate::core::actions::ports::colour_map::ColourMap;
use crate::core::actions::ports::fractal_algorithm::FractalAlgorithm;
use crate::core::actions::schedule::chunk_plan::plan_chunks;
use crate::core::actions::schedule::policy::{ScheduleConfig, ScheduleError, SchedulePolicy};
use crate::core::data::image_dims::{BYTES_PER_PIXEL, ImageDims};
use crate::core::data::pixel_buffer::PixelBuffer;
use crate::core::util::resolve_worker_count::resolve_worker_count;

/// Which pixel index ranges one worker rendered, in the order it took them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkerAssignment {
    pub worker: usize,
    pub ranges: Vec<Range<usize>>,
}

impl WorkerAssignment {
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.ranges.iter().map(|range| range.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    pub policy: SchedulePolicy,
    pub workers: usize,
    pub assignments: Vec<WorkerAssignment>,
    pub elapsed: Duration,
}

/// Shared-memory renderer owning a fixed-size rayon pool.
///
/// The buffer is cut into disjoint `&mut` chunk slices before any worker
/// starts, so pixel writes never need synchronising. Only handing a chunk to a
/// pool thread takes a lock.
#[derive(Debug)]
pub struct ScheduledRenderer {
    config: ScheduleConfig,
    workers: usize,
    pool: ThreadPool,
}

impl ScheduledRenderer {
    pub fn new(config: ScheduleConfig) -> Result<Self, ScheduleError> {
        let workers = resolve_worker_count(config.threads);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("julia-worker-{index}"))
            .build()?;

        Ok(Self {
            config,
            workers,
            pool,
        })
    }

    #[must_use]
    pub fn config(&self) -> ScheduleConfig {
        self.config
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn render<Alg, CMap>(
        &self,
        dims: ImageDims,
        algorithm: &Alg,
        colour_map: &CMap,
    ) -> (PixelBuffer, ScheduleReport)
    where
        Alg: FractalAlgorithm + Sync,
        CMap: ColourMap<Alg::Success> + Sync,
    {
        let mut buffer = PixelBuffer::new(dims);
        let report = self.render_into(&mut buffer, algorithm, colour_map);

        (buffer, report)
    }

    /// Renders into a caller-owned buffer; returns once every pixel is written.
    pub fn render_into<Alg, CMap>(
        &self,
        buffer: &mut PixelBuffer,
        algorithm: &Alg,
        colour_map: &CMap,
    ) -> ScheduleReport
    where
        Alg: FractalAlgorithm + Sync,
        CMap: ColourMap<Alg::Success> + Sync,
    {
        let start = Instant::now();
        let width = buffer.dims().width();
        let plan = plan_chunks(
            self.config.policy,
            buffer.dims().pixel_count(),
            self.workers,
            self.config.chunk_size,
        );
        let chunk_count = plan.len();
        let chunks = split_into_chunks(buffer.buffer_mut(), plan);

        let assignments = match self.config.policy {
            SchedulePolicy::Static => self.run_static(chunks, width, algorithm, colour_map),
            SchedulePolicy::Dynamic | SchedulePolicy::Guided => {
                self.run_queued(chunks, width, algorithm, colour_map)
            }
        };

        let elapsed = start.elapsed();
        debug!(
            policy = %self.config.policy,
            workers = self.workers,
            chunks = chunk_count,
            elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
            "scheduled render finished"
        );

        ScheduleReport {
            policy: self.config.policy,
            workers: self.workers,
            assignments,
            elapsed,
        }
    }

    /// Chunk `i` is rendered by pool thread `i` and no other.
    fn run_static<Alg, CMap>(
        &self,
        chunks: Vec<(Range<usize>, &mut [u8])>,
        width: u32,
        algorithm: &Alg,
        colour_map: &CMap,
    ) -> Vec<WorkerAssignment>
    where
        Alg: FractalAlgorithm + Sync,
        CMap: ColourMap<Alg::Success> + Sync,
    {
        let slots: Vec<Mutex<Option<(Range<usize>, &mut [u8])>>> =
            chunks.into_iter().map(|chunk| Mutex::new(Some(chunk))).collect();

        self.pool.broadcast(|ctx| {
            let mut taken = WorkerAssignment {
                worker: ctx.index(),
                ranges: Vec::new(),
            };

            if let Some((range, out)) = slots.get(ctx.index()).and_then(|slot| lock(slot).take()) {
                render_span(out, range.start, width, algorithm, colour_map);
                taken.ranges.push(range);
            }

            taken
        })
    }

    /// Every pool thread pulls chunks from one shared queue until it drains.
    fn run_queued<Alg, CMap>(
        &self,
        chunks: Vec<(Range<usize>, &mut [u8])>,
        width: u32,
        algorithm: &Alg,
        colour_map: &CMap,
    ) -> Vec<WorkerAssignment>
    where
        Alg: FractalAlgorithm + Sync,
        CMap: ColourMap<Alg::Success> + Sync,
    {
        let queue = Mutex::new(chunks.into_iter());

        self.pool.broadcast(|ctx| {
            let mut taken = WorkerAssignment {
                worker: ctx.index(),
                ranges: Vec::new(),
            };

            while let Some((range, out)) = next_chunk(&queue) {
                render_span(out, range.start, width, algorithm, colour_map);
                taken.ranges.push(range);
            }

            taken
        })
    }
}

type ChunkQueue<'a> = Mutex<std::vec::IntoIter<(Range<usize>, &'a mut [u8])>>;

fn next_chunk<'a>(queue: &ChunkQueue<'a>) -> Option<(Range<usize>, &'a mut [u8])> {
    lock(queue).next()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn split_into_chunks(
    mut rest: &mut [u8],
    plan: Vec<Range<usize>>,
) -> Vec<(Range<usize>, &mut [u8])> {
    let mut chunks = Vec::with_capacity(plan.len());

    for range in plan {
        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len() * BYTES_PER_PIXEL);
        chunks.push((range, head));
        rest = tail;
    }

    chunks
}
