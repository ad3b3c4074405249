// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::entry::LogEntry;
use crate::error::{AggregateError, SinkError, SinkResult};
use crate::filter::LogEntryFilter;

fn batch_result(errors: Vec<SinkError>, total: usize) -> Result<(), AggregateError> {
	if errors.is_empty() {
		return Ok(());
	}
	Err(AggregateError::new(
		format!("{} of {} log entries not written", errors.len(), total),
		errors,
	))
}

/// A durable sink for log entries.
#[async_trait]
pub trait LogWriter: Send + Sync {
	fn name(&self) -> &str;

	/// Entries this writer participates in.
	fn filter(&self) -> &LogEntryFilter;

	/// Called once at registration. A writer that fails here is not registered.
	fn try_initialize(&self) -> SinkResult<()> {
		Ok(())
	}

	/// Write exactly one entry.
	fn try_write(&self, entry: &LogEntry) -> SinkResult<()>;

	async fn try_write_async(&self, entry: &LogEntry) -> SinkResult<()> {
		self.try_write(entry)
	}

	/// Write every entry, continuing past failures. All failures are
	/// returned together.
	fn try_write_batch(&self, entries: &[LogEntry]) -> Result<(), AggregateError> {
		let errors: Vec<SinkError> = entries
			.iter()
			.filter_map(|entry| self.try_write(entry).err())
			.collect();
		batch_result(errors, entries.len())
	}

	async fn try_write_batch_async(&self, entries: &[LogEntry]) -> Result<(), AggregateError> {
		let mut errors = Vec::new();
		for entry in entries {
			if let Err(e) = self.try_write_async(entry).await {
				errors.push(e);
			}
		}
		batch_result(errors, entries.len())
	}

	/// Release resources held by the writer.
	fn dispose(&self) -> SinkResult<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	struct EveryOtherWriter {
		filter: LogEntryFilter,
		calls: AtomicUsize,
	}

	impl LogWriter for EveryOtherWriter {
		fn name(&self) -> &str {
			"every-other"
		}

		fn filter(&self) -> &LogEntryFilter {
			&self.filter
		}

		fn try_write(&self, _entry: &LogEntry) -> SinkResult<()> {
			let n = self.calls.fetch_add(1, Ordering::SeqCst);
			if n % 2 == 1 {
				return Err(SinkError::Transient(format!("write {n} failed")));
			}
			Ok(())
		}
	}

	fn writer() -> EveryOtherWriter {
		EveryOtherWriter {
			filter: LogEntryFilter::default(),
			calls: AtomicUsize::new(0),
		}
	}

	fn entries(n: usize) -> Vec<LogEntry> {
		(0..n).map(|i| LogEntry::create(format!("T{i}"), "M")).collect()
	}

	#[test]
	fn batch_continues_past_failures() {
		let writer = writer();
		let err = writer.try_write_batch(&entries(5)).unwrap_err();
		assert_eq!(writer.calls.load(Ordering::SeqCst), 5);
		assert_eq!(err.len(), 2);
		assert_eq!(err.message(), "2 of 5 log entries not written");
	}

	#[test]
	fn batch_of_successes_is_ok() {
		let writer = writer();
		assert!(writer.try_write_batch(&entries(1)).is_ok());
		assert!(writer.try_write_batch(&[]).is_ok());
	}

	#[tokio::test]
	async fn async_defaults_delegate_to_sync() {
		let writer = writer();
		let entry = LogEntry::create("T", "M");
		assert!(writer.try_write_async(&entry).await.is_ok());
		assert!(writer.try_write_async(&entry).await.is_err());

		let err = writer.try_write_batch_async(&entries(4)).await.unwrap_err();
		assert_eq!(err.len(), 2);
		assert_eq!(writer.calls.load(Ordering::SeqCst), 6);
	}
}
