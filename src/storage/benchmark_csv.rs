use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

pub const BENCHMARK_HEADER: &str =
    "ImageSize,Schedule,Threads,SequentialTime,ParallelTime,Speedup,Efficiency";

/// One sequential-vs-parallel measurement. Times are written in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRow {
    pub image_size: u32,
    pub schedule: String,
    /// Worker threads, or ranks for the distributed pipeline.
    pub threads: usize,
    pub sequential: Duration,
    pub parallel: Duration,
}

impl BenchmarkRow {
    pub fn new(
        image_size: u32,
        schedule: impl Into<String>,
        threads: usize,
        sequential: Duration,
        parallel: Duration,
    ) -> Self {
        Self {
            image_size,
            schedule: schedule.into(),
            threads,
            sequential,
            parallel,
        }
    }

    #[must_use]
    pub fn speedup(&self) -> f64 {
        if self.parallel.is_zero() {
            return 0.0;
        }

        self.sequential.as_secs_f64() / self.parallel.as_secs_f64()
    }

    /// Speedup per worker, as a percentage.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.threads == 0 {
            return 0.0;
        }

        self.speedup() / self.threads as f64 * 100.0
    }

    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{:.6},{:.6},{:.4},{:.2}",
            self.image_size,
            self.schedule,
            self.threads,
            self.sequential.as_secs_f64(),
            self.parallel.as_secs_f64(),
            self.speedup(),
            self.efficiency()
        )
    }
}

/// Appends `rows`, writing the header first when the file is new or empty.
pub fn append_rows(path: impl AsRef<Path>, rows: &[BenchmarkRow]) -> std::io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let needs_header = file.metadata()?.len() == 0;
    let mut writer = BufWriter::new(file);

    if needs_header {
        writeln!(writer, "{BENCHMARK_HEADER}")?;
    }
    for row in rows {
        writeln!(writer, "{}", row.to_csv_line())?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(threads: usize, parallel_ms: u64) -> BenchmarkRow {
        BenchmarkRow::new(
            256,
            "dynamic",
            threads,
            Duration::from_millis(800),
            Duration::from_millis(parallel_ms),
        )
    }

    #[test]
    fn test_speedup_and_efficiency() {
        let row = row(4, 250);

        assert!((row.speedup() - 3.2).abs() < 1e-9);
        assert!((row.efficiency() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_parallel_time_does_not_divide_by_zero() {
        assert_eq!(row(2, 0).speedup(), 0.0);
    }

    #[test]
    fn test_csv_line_format() {
        assert_eq!(row(4, 250).to_csv_line(), "256,dynamic,4,0.800000,0.250000,3.2000,80.00");
    }

    #[test]
    fn test_header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        append_rows(&path, &[row(1, 800)]).unwrap();
        append_rows(&path, &[row(2, 400), row(4, 200)]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], BENCHMARK_HEADER);
        assert!(lines[1..].iter().all(|line| line.starts_with("256,dynamic,")));
    }
}
