// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The emergency log and the policy that routes pipeline failures into it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use loom_logbook_core::{CustomData, LogEntry};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{LogbookError, Result};
use crate::formatters::ErrorFormatter;
use crate::logbook::Logbook;
use crate::writers::FileLogWriter;

static GLOBAL_EMERGENCY_LOG: OnceLock<Arc<EmergencyLog>> = OnceLock::new();

/// What to do when a writer, subscriber or formatter fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyLogSetting {
	/// Swallow the failure.
	Ignore,
	/// Write a copy of the entry plus the failure to the emergency log.
	AddToEmergencyLog,
	/// Return the failure to the caller.
	#[default]
	ThrowExceptions,
}

/// Fallback logbook for failures inside the logging pipeline, together with
/// the policy deciding when it is used.
///
/// Every [`Logbook`] holds one of these. [`EmergencyLog::global`] is the
/// process-wide instance used when no explicit one is supplied.
#[derive(Debug, Default)]
pub struct EmergencyLog {
	setting: RwLock<EmergencyLogSetting>,
	log: RwLock<Option<Arc<Logbook>>>,
}

impl EmergencyLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// The process-wide emergency log.
	pub fn global() -> Arc<EmergencyLog> {
		GLOBAL_EMERGENCY_LOG
			.get_or_init(|| Arc::new(EmergencyLog::new()))
			.clone()
	}

	pub fn setting(&self) -> EmergencyLogSetting {
		*self.setting.read()
	}

	pub fn set_setting(&self, setting: EmergencyLogSetting) {
		*self.setting.write() = setting;
	}

	pub fn is_configured(&self) -> bool {
		self.log.read().is_some()
	}

	pub fn logbook(&self) -> Option<Arc<Logbook>> {
		self.log.read().clone()
	}

	/// Install `logbook` as the emergency log, replacing any previous one.
	pub fn setup(&self, logbook: Logbook) {
		info!(writers = logbook.writer_count(), "emergency log configured");
		*self.log.write() = Some(Arc::new(logbook));
	}

	/// Set up a file-backed emergency log in `dir` that renders errors as
	/// text. Returns the full path of the log file.
	pub fn setup_file(&self, dir: impl AsRef<Path>, file_name: &str) -> Result<PathBuf> {
		let writer = FileLogWriter::new(dir.as_ref()).with_file_name(file_name);
		let path = writer.current_path();
		let logbook = Logbook::builder()
			.emergency_log(Arc::new(EmergencyLog::new()))
			.formatter(Arc::new(ErrorFormatter::new()))
			.writer(Arc::new(writer))
			.build()?;
		self.setup(logbook);
		info!(path = %path.display(), "emergency log file");
		Ok(path)
	}

	/// Set up a file-backed emergency log with a random name in the system
	/// temp directory.
	pub fn setup_temp(&self) -> Result<PathBuf> {
		let file_name = format!("Logbook_{}.log", Uuid::new_v4().simple());
		self.setup_file(std::env::temp_dir(), &file_name)
	}

	/// Write `entry` to the emergency log. Failures are always returned.
	#[instrument(skip(self, entry, data), fields(entry_id = %entry.id()))]
	pub fn write(&self, entry: &mut LogEntry, data: Option<&dyn CustomData>) -> Result<()> {
		let log = self
			.logbook()
			.ok_or(LogbookError::EmergencyLogNotConfigured)?;

		log.write(entry, data, Some(EmergencyLogSetting::ThrowExceptions))
			.map(|_| ())
			.map_err(|source| emergency_write_error(entry, source))
	}

	pub async fn write_async(&self, entry: &mut LogEntry, data: Option<&dyn CustomData>) -> Result<()> {
		let log = self
			.logbook()
			.ok_or(LogbookError::EmergencyLogNotConfigured)?;

		log.write_async(entry, data, Some(EmergencyLogSetting::ThrowExceptions))
			.await
			.map(|_| ())
			.map_err(|source| emergency_write_error(entry, source))
	}
}

fn emergency_write_error(entry: &LogEntry, source: LogbookError) -> LogbookError {
	LogbookError::EmergencyWrite {
		id: entry.id(),
		title: entry.title.clone(),
		source: Box::new(source),
	}
}
