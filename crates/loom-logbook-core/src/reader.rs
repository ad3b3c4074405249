// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use uuid::Uuid;

use crate::entry::LogEntry;
use crate::error::SinkResult;
use crate::filter::LogEntryFilter;

/// Query side of a log store.
#[async_trait]
pub trait LogReader: Send + Sync {
	fn name(&self) -> &str;

	fn try_initialize(&self) -> SinkResult<()> {
		Ok(())
	}

	fn read_by_id(&self, id: Uuid) -> SinkResult<Option<LogEntry>>;

	/// Entries matching `filter`, at most `max_count` of them. A
	/// `max_count` of zero means unbounded.
	fn read_by_filter(&self, filter: &LogEntryFilter, max_count: usize) -> SinkResult<Vec<LogEntry>>;

	async fn read_by_id_async(&self, id: Uuid) -> SinkResult<Option<LogEntry>> {
		self.read_by_id(id)
	}

	async fn read_by_filter_async(
		&self,
		filter: &LogEntryFilter,
		max_count: usize,
	) -> SinkResult<Vec<LogEntry>> {
		self.read_by_filter(filter, max_count)
	}
}

/// Clone the entries matching `filter`, honouring the zero-is-unbounded
/// `max_count` convention.
pub fn collect_matching<'a, I>(entries: I, filter: &LogEntryFilter, max_count: usize) -> Vec<LogEntry>
where
	I: IntoIterator<Item = &'a LogEntry>,
{
	let limit = if max_count == 0 { usize::MAX } else { max_count };
	entries
		.into_iter()
		.filter(|entry| filter.is_match(entry))
		.take(limit)
		.cloned()
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::entry::LogSeverity;

	#[test]
	fn collect_matching_respects_filter_and_limit() {
		let entries: Vec<LogEntry> = (0..6)
			.map(|i| {
				let severity = if i % 2 == 0 {
					LogSeverity::Error
				} else {
					LogSeverity::Information
				};
				LogEntry::create(format!("T{i}"), "M").with_severity(severity)
			})
			.collect();
		let errors = LogEntryFilter::all().with_severities([LogSeverity::Error]);

		assert_eq!(collect_matching(&entries, &errors, 0).len(), 3);
		let limited = collect_matching(&entries, &errors, 2);
		assert_eq!(limited.len(), 2);
		assert_eq!(limited[0].title.as_deref(), Some("T0"));
		assert_eq!(limited[1].title.as_deref(), Some("T2"));
	}
}
