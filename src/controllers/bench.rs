//! Sequential-vs-parallel sweeps that feed the benchmark CSV.

use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;

use crate::adapters::cluster::local_cluster::{ClusterConfig, LocalCluster};
use crate::core::actions::generate_fractal::scheduled::ScheduledRenderer;
use crate::core::actions::generate_fractal::serial::render_serial;
use crate::core::actions::ports::communicator::TransportError;
use crate::core::actions::schedule::policy::{ScheduleConfig, ScheduleError, SchedulePolicy};
use crate::core::data::fractal_params::FractalParams;
use crate::core::data::image_dims::{ImageDims, ImageDimsError};
use crate::core::fractals::julia::algorithm::JuliaAlgorithm;
use crate::core::fractals::julia::colour_mapping::factory::julia_colour_map_factory;
use crate::engine::{EngineError, render_distributed};
use crate::storage::benchmark_csv::{BenchmarkRow, append_rows};

pub const DEFAULT_SIZES: &[u32] = &[256, 512, 1024, 2048, 4096];
pub const DEFAULT_THREADS: &[usize] = &[1, 2, 4, 8, 16];
pub const DEFAULT_RANKS: &[usize] = &[1, 2, 4, 8];

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Dims(#[from] ImageDimsError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to write benchmark results: {0}")]
    Io(#[from] std::io::Error),
}

/// Square image sizes and worker counts to sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkPlan {
    pub params: FractalParams,
    pub sizes: Vec<u32>,
    pub policies: Vec<SchedulePolicy>,
    pub threads: Vec<usize>,
    pub ranks: Vec<usize>,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
            sizes: DEFAULT_SIZES.to_vec(),
            policies: SchedulePolicy::ALL.to_vec(),
            threads: DEFAULT_THREADS.to_vec(),
            ranks: DEFAULT_RANKS.to_vec(),
        }
    }
}

fn time_sequential(params: &FractalParams, dims: ImageDims) -> Duration {
    let algorithm = JuliaAlgorithm::new(params, dims);
    let colour_map = julia_colour_map_factory(params.theme(), params.max_iterations());

    let start = Instant::now();
    let _ = render_serial(dims, &algorithm, &colour_map);
    start.elapsed()
}

/// For every size: one sequential baseline, then every policy at every thread count.
pub fn run_shared_memory_sweep(plan: &BenchmarkPlan) -> Result<Vec<BenchmarkRow>, BenchError> {
    let mut rows = Vec::new();

    for &size in &plan.sizes {
        let dims = ImageDims::new(size, size)?;
        let algorithm = JuliaAlgorithm::new(&plan.params, dims);
        let colour_map =
            julia_colour_map_factory(plan.params.theme(), plan.params.max_iterations());
        let sequential = time_sequential(&plan.params, dims);

        for &policy in &plan.policies {
            for &threads in &plan.threads {
                let renderer = ScheduledRenderer::new(ScheduleConfig::new(policy, threads))?;
                let (_, report) = renderer.render(dims, &algorithm, &colour_map);
                let row =
                    BenchmarkRow::new(size, policy.name(), threads, sequential, report.elapsed);

                info!(
                    size,
                    policy = %policy,
                    threads,
                    speedup = row.speedup(),
                    efficiency = row.efficiency(),
                    "shared-memory sample"
                );
                rows.push(row);
            }
        }
    }

    Ok(rows)
}

/// Distributed pipeline timings, recorded as `static` with ranks in the threads column.
pub fn run_distributed_scaling(plan: &BenchmarkPlan) -> Result<Vec<BenchmarkRow>, BenchError> {
    let mut rows = Vec::new();

    for &size in &plan.sizes {
        let dims = ImageDims::new(size, size)?;
        let sequential = time_sequential(&plan.params, dims);

        for &ranks in &plan.ranks {
            let cluster = LocalCluster::new(ClusterConfig::with_ranks(ranks))?;

            let start = Instant::now();
            let _ = render_distributed(cluster, &plan.params, dims)?;
            let row = BenchmarkRow::new(
                size,
                SchedulePolicy::Static.name(),
                ranks,
                sequential,
                start.elapsed(),
            );

            info!(size, ranks, speedup = row.speedup(), "distributed sample");
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Runs both sweeps and appends every row to `path`.
pub fn run_benchmarks(plan: &BenchmarkPlan, path: impl AsRef<Path>) -> Result<usize, BenchError> {
    let mut rows = run_shared_memory_sweep(plan)?;
    rows.extend(run_distributed_scaling(plan)?);
    append_rows(path, &rows)?;

    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_plan() -> BenchmarkPlan {
        BenchmarkPlan {
            params: FractalParams::default(),
            sizes: vec![8, 16],
            policies: vec![SchedulePolicy::Static, SchedulePolicy::Guided],
            threads: vec![1, 2],
            ranks: vec![1, 3],
        }
    }

    #[test]
    fn test_sweep_emits_one_row_per_combination() {
        let rows = run_shared_memory_sweep(&tiny_plan()).unwrap();

        assert_eq!(rows.len(), 2 * 2 * 2);
        assert_eq!(rows[0].schedule, "static");
        assert_eq!(rows[2].schedule, "guided");
        assert!(rows[..4].iter().all(|row| row.sequential == rows[0].sequential));
    }

    #[test]
    fn test_distributed_rows_use_ranks_as_threads() {
        let rows = run_distributed_scaling(&tiny_plan()).unwrap();

        let ranks: Vec<usize> = rows.iter().map(|row| row.threads).collect();
        assert_eq!(ranks, vec![1, 3, 1, 3]);
        assert!(rows.iter().all(|row| row.schedule == "static"));
    }

    #[test]
    fn test_run_benchmarks_appends_all_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let written = run_benchmarks(&tiny_plan(), &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, 12);
        assert_eq!(contents.lines().count(), 13);
    }
}
