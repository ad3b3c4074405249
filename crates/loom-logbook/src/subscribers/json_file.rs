// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::{Path, PathBuf};

use loom_logbook_core::{LogEntry, LogEntryFilter, LogSubscriber, SinkError, SinkResult};

/// Writes each received entry to its own pretty-printed JSON file.
///
/// Files are named `<id>.json`, or `<id>-notcreated.json` when a writer
/// failed to store the entry.
pub struct JsonFileSubscriber {
	dir: PathBuf,
	filter: LogEntryFilter,
}

impl JsonFileSubscriber {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self {
			dir: dir.into(),
			filter: LogEntryFilter::default(),
		}
	}

	pub fn with_filter(mut self, filter: LogEntryFilter) -> Self {
		self.filter = filter;
		self
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	pub fn path_for(&self, entry: &LogEntry, was_created: bool) -> PathBuf {
		let suffix = if was_created { "" } else { "-notcreated" };
		self.dir.join(format!("{}{}.json", entry.id(), suffix))
	}
}

impl LogSubscriber for JsonFileSubscriber {
	fn name(&self) -> &str {
		"json-file"
	}

	fn filter(&self) -> &LogEntryFilter {
		&self.filter
	}

	fn try_initialize(&self) -> SinkResult<()> {
		std::fs::create_dir_all(&self.dir).map_err(|e| {
			SinkError::Permanent(format!(
				"unable to create or access the path '{}': {e}",
				self.dir.display()
			))
		})
	}

	fn receive(&self, entry: &LogEntry, was_created: bool) -> SinkResult<()> {
		let json = serde_json::to_string_pretty(entry)?;
		std::fs::write(self.path_for(entry, was_created), json)?;
		Ok(())
	}
}
