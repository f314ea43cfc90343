use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

pub const METRICS_HEADER: &str = "Timestamp(s),Latency(ms),Success,Attempt,Replica";

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    /// Time since the client was created.
    pub timestamp: Duration,
    pub latency: Duration,
    pub success: bool,
    pub attempt: u32,
    pub replica: String,
}

impl AttemptRecord {
    #[must_use]
    pub fn to_csv_line(&self) -> String {
        format!(
            "{:.3},{:.3},{},{},{}",
            self.timestamp.as_secs_f64(),
            self.latency.as_secs_f64() * 1_000.0,
            u8::from(self.success),
            self.attempt,
            self.replica
        )
    }
}

/// Where dispatch attempts are reported. Recording must never block or fail
/// the frame it describes.
pub trait MetricsSink: Send + Sync {
    fn record(&self, record: AttemptRecord);
}

#[derive(Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _record: AttemptRecord) {}
}

#[derive(Debug, Default)]
pub struct InMemoryMetricsSink {
    records: Mutex<Vec<AttemptRecord>>,
}

impl InMemoryMetricsSink {
    #[must_use]
    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl MetricsSink for InMemoryMetricsSink {
    fn record(&self, record: AttemptRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }
}

/// Appends records to a CSV file from a background thread.
///
/// The header is written once, when the file is new or empty. Write failures
/// are logged and dropped.
#[derive(Debug)]
pub struct CsvMetricsSink {
    sender: Option<Sender<AttemptRecord>>,
    writer: Option<JoinHandle<()>>,
}

impl CsvMetricsSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut out = BufWriter::new(file);

        if out.get_ref().metadata()?.len() == 0 {
            writeln!(out, "{METRICS_HEADER}")?;
            out.flush()?;
        }

        let (sender, receiver) = mpsc::channel::<AttemptRecord>();
        let display_path = path.display().to_string();
        let writer = thread::Builder::new()
            .name("metrics-log".into())
            .spawn(move || {
                for record in receiver {
                    let written =
                        writeln!(out, "{}", record.to_csv_line()).and_then(|()| out.flush());
                    if let Err(err) = written {
                        warn!(
                            path = %display_path,
                            error = %err,
                            "failed to write dispatch metrics"
                        );
                    }
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            writer: Some(writer),
        })
    }

    /// Flushes pending records and stops the writer thread.
    pub fn close(self) {
        drop(self);
    }
}

impl MetricsSink for CsvMetricsSink {
    fn record(&self, record: AttemptRecord) {
        if let Some(sender) = &self.sender {
            if sender.send(record).is_err() {
                warn!("metrics writer has stopped, dropping record");
            }
        }
    }
}

impl Drop for CsvMetricsSink {
    fn drop(&mut self) {
        self.sender.take();

        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                warn!("metrics writer thread panicked");
            }
        }
    }
}
