// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Real-time streaming of written entries.

use loom_logbook_core::{LogEntry, LogEntryFilter, LogSubscriber, SinkResult};
use tokio::sync::broadcast;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// An entry as seen by a subscriber, with the outcome of its write.
#[derive(Debug, Clone)]
pub struct ReceivedEntry {
	pub entry: LogEntry,
	pub was_created: bool,
}

/// Republishes every received entry on a broadcast channel.
///
/// Sending never fails the write: with no receivers the entry is dropped,
/// and slow receivers observe `RecvError::Lagged`.
pub struct BroadcastSubscriber {
	filter: LogEntryFilter,
	sender: broadcast::Sender<ReceivedEntry>,
}

impl BroadcastSubscriber {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self {
			filter: LogEntryFilter::default(),
			sender,
		}
	}

	pub fn with_filter(mut self, filter: LogEntryFilter) -> Self {
		self.filter = filter;
		self
	}

	pub fn subscribe(&self) -> broadcast::Receiver<ReceivedEntry> {
		self.sender.subscribe()
	}

	pub fn receiver_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for BroadcastSubscriber {
	fn default() -> Self {
		Self::new(DEFAULT_CHANNEL_CAPACITY)
	}
}

impl LogSubscriber for BroadcastSubscriber {
	fn name(&self) -> &str {
		"broadcast"
	}

	fn filter(&self) -> &LogEntryFilter {
		&self.filter
	}

	fn receive(&self, entry: &LogEntry, was_created: bool) -> SinkResult<()> {
		// No receivers is not an error
		let _ = self.sender.send(ReceivedEntry {
			entry: entry.clone(),
			was_created,
		});
		Ok(())
	}
}
