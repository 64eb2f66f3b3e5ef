//! Durable append-only metrics store backed by a JSON Lines file
//!
//! Every data point is appended as one line. On open the file is replayed into
//! an in-memory index so reads never touch disk. A single writer task owns the
//! file; appends only enqueue.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use llmo_types::{
	MetricsAggregate, MetricsDataPoint, MetricsStore, MetricsTimeSeries, StorageError,
	StorageResult, StorageStats,
};
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::memory_store::MemoryMetricsStore;

enum WriterCommand {
	Append(String),
	Flush(oneshot::Sender<std::io::Result<()>>),
}

/// JSON Lines metrics store with in-memory read index
#[derive(Debug, Clone)]
pub struct JsonlMetricsStore {
	path: PathBuf,
	index: MemoryMetricsStore,
	writer: mpsc::UnboundedSender<WriterCommand>,
}

impl std::fmt::Debug for WriterCommand {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			WriterCommand::Append(_) => f.write_str("Append"),
			WriterCommand::Flush(_) => f.write_str("Flush"),
		}
	}
}

impl JsonlMetricsStore {
	/// Open (or create) the file at `path`, replaying any existing records
	///
	/// Lines that fail to parse are skipped with a warning; a torn final line
	/// after a crash must not prevent startup.
	pub async fn open(
		path: impl AsRef<Path>,
		max_points_per_provider: usize,
	) -> StorageResult<Self> {
		let path = path.as_ref().to_path_buf();
		let index = MemoryMetricsStore::with_max_points(max_points_per_provider);

		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			tokio::fs::create_dir_all(parent)
				.await
				.map_err(|e| io_error(&path, e))?;
		}

		let replayed = match File::open(&path).await {
			Ok(file) => replay(&path, file, &index).await?,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
			Err(e) => return Err(io_error(&path, e)),
		};

		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(&path)
			.await
			.map_err(|e| io_error(&path, e))?;

		let (writer, rx) = mpsc::unbounded_channel();
		tokio::spawn(run_writer(path.clone(), file, rx));

		info!(
			"Opened metrics file {} ({} records replayed)",
			path.display(),
			replayed
		);

		Ok(Self {
			path,
			index,
			writer,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

async fn replay(path: &Path, file: File, index: &MemoryMetricsStore) -> StorageResult<usize> {
	let mut lines = BufReader::new(file).lines();
	let mut line_no = 0usize;
	let mut replayed = 0usize;

	while let Some(line) = lines.next_line().await.map_err(|e| io_error(path, e))? {
		line_no += 1;
		if line.trim().is_empty() {
			continue;
		}
		match serde_json::from_str::<MetricsDataPoint>(&line) {
			Ok(point) => {
				index.record(point);
				replayed += 1;
			},
			Err(e) => {
				let err = StorageError::CorruptRecord {
					line: line_no,
					message: e.to_string(),
				};
				warn!("Skipping metrics record in {}: {}", path.display(), err);
			},
		}
	}

	Ok(replayed)
}

async fn run_writer(path: PathBuf, file: File, mut rx: mpsc::UnboundedReceiver<WriterCommand>) {
	let mut writer = BufWriter::new(file);

	while let Some(command) = rx.recv().await {
		let mut pending = Some(command);
		// Drain whatever is queued, then flush once
		while let Some(command) = pending.take().or_else(|| rx.try_recv().ok()) {
			match command {
				WriterCommand::Append(line) => {
					if let Err(e) = writer.write_all(line.as_bytes()).await {
						warn!("Failed to append metrics to {}: {}", path.display(), e);
					}
				},
				WriterCommand::Flush(done) => {
					let _ = done.send(writer.flush().await);
				},
			}
		}
		if let Err(e) = writer.flush().await {
			warn!("Failed to flush metrics file {}: {}", path.display(), e);
		}
	}

	debug!("Metrics writer for {} stopped", path.display());
}

fn io_error(path: &Path, err: std::io::Error) -> StorageError {
	StorageError::Io {
		path: path.display().to_string(),
		message: err.to_string(),
	}
}

#[async_trait]
impl MetricsStore for JsonlMetricsStore {
	async fn append(&self, point: MetricsDataPoint) -> StorageResult<()> {
		let mut line = serde_json::to_string(&point)?;
		line.push('\n');
		self.index.record(point);
		self.writer
			.send(WriterCommand::Append(line))
			.map_err(|_| StorageError::Operation {
				message: format!("metrics writer for {} has stopped", self.path.display()),
			})
	}

	async fn recent_aggregate(
		&self,
		provider: &str,
		window: Duration,
	) -> StorageResult<MetricsAggregate> {
		self.index.recent_aggregate(provider, window).await
	}

	async fn points_since(
		&self,
		provider: &str,
		since: DateTime<Utc>,
	) -> StorageResult<Vec<MetricsDataPoint>> {
		self.index.points_since(provider, since).await
	}

	async fn time_series(&self, provider: &str) -> StorageResult<Option<MetricsTimeSeries>> {
		self.index.time_series(provider).await
	}

	async fn health_check(&self) -> StorageResult<bool> {
		Ok(!self.writer.is_closed())
	}

	async fn stats(&self) -> StorageResult<StorageStats> {
		self.index.stats().await
	}

	async fn flush(&self) -> StorageResult<()> {
		let (tx, rx) = oneshot::channel();
		let stopped = || StorageError::Operation {
			message: format!("metrics writer for {} has stopped", self.path.display()),
		};
		self.writer
			.send(WriterCommand::Flush(tx))
			.map_err(|_| stopped())?;
		rx.await
			.map_err(|_| stopped())?
			.map_err(|e| io_error(&self.path, e))
	}
}
