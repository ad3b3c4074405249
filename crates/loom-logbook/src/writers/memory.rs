// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-memory writer that doubles as a reader.

use std::collections::VecDeque;

use loom_logbook_core::{
	collect_matching, LogEntry, LogEntryFilter, LogReader, LogWriter, SinkResult,
};
use parking_lot::RwLock;
use uuid::Uuid;

/// Stores written entries in memory, oldest first.
///
/// With a capacity, the oldest entry is evicted once the writer is full.
pub struct MemoryLogWriter {
	name: String,
	filter: LogEntryFilter,
	entries: RwLock<VecDeque<LogEntry>>,
	capacity: Option<usize>,
}

impl MemoryLogWriter {
	pub fn new() -> Self {
		Self {
			name: "memory".to_string(),
			filter: LogEntryFilter::default(),
			entries: RwLock::new(VecDeque::new()),
			capacity: None,
		}
	}

	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			capacity: Some(capacity),
			entries: RwLock::new(VecDeque::with_capacity(capacity)),
			..Self::new()
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn with_filter(mut self, filter: LogEntryFilter) -> Self {
		self.filter = filter;
		self
	}

	/// Snapshot of all stored entries, oldest first.
	pub fn entries(&self) -> Vec<LogEntry> {
		self.entries.read().iter().cloned().collect()
	}

	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	pub fn clear(&self) {
		self.entries.write().clear();
	}
}

impl Default for MemoryLogWriter {
	fn default() -> Self {
		Self::new()
	}
}

impl LogWriter for MemoryLogWriter {
	fn name(&self) -> &str {
		&self.name
	}

	fn filter(&self) -> &LogEntryFilter {
		&self.filter
	}

	fn try_write(&self, entry: &LogEntry) -> SinkResult<()> {
		let mut entries = self.entries.write();
		if let Some(capacity) = self.capacity {
			while entries.len() >= capacity.max(1) {
				entries.pop_front();
			}
		}
		entries.push_back(entry.clone());
		Ok(())
	}
}

impl LogReader for MemoryLogWriter {
	fn name(&self) -> &str {
		&self.name
	}

	fn read_by_id(&self, id: Uuid) -> SinkResult<Option<LogEntry>> {
		Ok(self.entries.read().iter().find(|e| e.id() == id).cloned())
	}

	fn read_by_filter(&self, filter: &LogEntryFilter, max_count: usize) -> SinkResult<Vec<LogEntry>> {
		Ok(collect_matching(self.entries.read().iter(), filter, max_count))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_logbook_core::LogSeverity;

	#[test]
	fn stores_entries_in_order() {
		let writer = MemoryLogWriter::new();
		for i in 0..3 {
			writer.try_write(&LogEntry::create(format!("T{i}"), "M")).unwrap();
		}
		let titles: Vec<_> = writer
			.entries()
			.into_iter()
			.filter_map(|e| e.title)
			.collect();
		assert_eq!(titles, vec!["T0", "T1", "T2"]);
	}

	#[test]
	fn capacity_evicts_oldest() {
		let writer = MemoryLogWriter::with_capacity(2);
		for i in 0..3 {
			writer.try_write(&LogEntry::create(format!("T{i}"), "M")).unwrap();
		}
		assert_eq!(writer.len(), 2);
		assert_eq!(writer.entries()[0].title.as_deref(), Some("T1"));
	}

	#[test]
	fn reads_by_id_and_filter() {
		let writer = MemoryLogWriter::new();
		let target = LogEntry::error("T", "M", "S", "A");
		writer.try_write(&target).unwrap();
		writer.try_write(&LogEntry::create("U", "M")).unwrap();

		assert_eq!(writer.read_by_id(target.id()).unwrap(), Some(target.clone()));
		assert!(writer.read_by_id(Uuid::new_v4()).unwrap().is_none());

		let errors = LogEntryFilter::all().with_severities([LogSeverity::Error]);
		assert_eq!(writer.read_by_filter(&errors, 0).unwrap(), vec![target]);
		assert_eq!(writer.read_by_filter(&LogEntryFilter::all(), 1).unwrap().len(), 1);
	}

	#[test]
	fn async_reads_match_sync_reads() {
		let writer = MemoryLogWriter::new();
		let entry = LogEntry::create("T", "M");
		writer.try_write(&entry).unwrap();

		let found = tokio_test::block_on(writer.read_by_id_async(entry.id())).unwrap();
		assert_eq!(found, Some(entry));
		let all = tokio_test::block_on(writer.read_by_filter_async(&LogEntryFilter::all(), 0)).unwrap();
		assert_eq!(all.len(), 1);
	}

	#[test]
	fn clear_empties_the_store() {
		let writer = MemoryLogWriter::new();
		writer.try_write(&LogEntry::create("T", "M")).unwrap();
		writer.clear();
		assert!(writer.is_empty());
	}
}
