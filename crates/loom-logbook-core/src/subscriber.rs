// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;

use crate::entry::LogEntry;
use crate::error::SinkResult;
use crate::filter::LogEntryFilter;

/// A passive observer notified after every write attempt.
///
/// A subscriber's outcome never changes the result of the write it observes.
#[async_trait]
pub trait LogSubscriber: Send + Sync {
	fn name(&self) -> &str;

	fn filter(&self) -> &LogEntryFilter;

	fn try_initialize(&self) -> SinkResult<()> {
		Ok(())
	}

	/// `was_created` is true when every matching writer accepted the entry.
	fn receive(&self, entry: &LogEntry, was_created: bool) -> SinkResult<()>;

	async fn receive_async(&self, entry: &LogEntry, was_created: bool) -> SinkResult<()> {
		self.receive(entry, was_created)
	}
}
