// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use loom_logbook_core::{LogEntry, LogEntryFilter, LogSeverity, LogWriter, SinkResult};

/// Forwards entries to the active `tracing` subscriber.
///
/// Critical and Error map to `ERROR`, Warning to `WARN`, Information to
/// `INFO` and Verbose to `DEBUG`.
pub struct TracingLogWriter {
	filter: LogEntryFilter,
}

impl TracingLogWriter {
	pub fn new() -> Self {
		Self {
			filter: LogEntryFilter::default(),
		}
	}

	pub fn with_filter(mut self, filter: LogEntryFilter) -> Self {
		self.filter = filter;
		self
	}
}

impl Default for TracingLogWriter {
	fn default() -> Self {
		Self::new()
	}
}

macro_rules! emit {
	($level:ident, $entry:expr) => {{
		let entry = $entry;
		::tracing::$level!(
			target: "logbook",
			entry_id = %entry.id(),
			severity = %entry.severity,
			source = entry.source.as_deref().unwrap_or_default(),
			area = entry.area.as_deref().unwrap_or_default(),
			title = entry.title.as_deref().unwrap_or_default(),
			custom_data = entry.custom_data().map(|p| p.data.as_str()).unwrap_or_default(),
			"{}",
			entry.message.as_deref().unwrap_or_default()
		)
	}};
}

impl LogWriter for TracingLogWriter {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &LogEntryFilter {
		&self.filter
	}

	fn try_write(&self, entry: &LogEntry) -> SinkResult<()> {
		match entry.severity {
			LogSeverity::Critical | LogSeverity::Error => emit!(error, entry),
			LogSeverity::Warning => emit!(warn, entry),
			LogSeverity::Information => emit!(info, entry),
			LogSeverity::Verbose => emit!(debug, entry),
		}
		Ok(())
	}
}
