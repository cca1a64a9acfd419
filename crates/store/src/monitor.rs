//! Modification-time polling of the backing file.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::trace;

/// Detects external writes to a file by comparing modification times.
///
/// Missing files and metadata failures read as "no change", so a file that
/// is briefly locked or replaced is simply picked up on a later poll.
#[derive(Debug, Clone)]
pub struct FileMonitor {
	path: PathBuf,
	last_modified: Option<SystemTime>,
	interval: Duration,
}

impl FileMonitor {
	/// Starts watching `path`, taking its current mtime as the baseline.
	pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
		let path = path.into();
		let last_modified = modified(&path);
		Self {
			path,
			last_modified,
			interval,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Suggested poll cadence.
	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Returns `true` once per observed mtime change.
	pub fn poll(&mut self) -> bool {
		let Some(current) = modified(&self.path) else {
			return false;
		};
		if self.last_modified == Some(current) {
			return false;
		}
		trace!(path = %self.path.display(), "backing file changed");
		self.last_modified = Some(current);
		true
	}

	/// Adopts the current mtime, typically right after our own save.
	pub fn acknowledge(&mut self) {
		self.last_modified = modified(&self.path);
	}

	/// Forgets the baseline so the next successful poll reports a change.
	pub fn rewind(&mut self) {
		self.last_modified = None;
	}
}

fn modified(path: &Path) -> Option<SystemTime> {
	std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
