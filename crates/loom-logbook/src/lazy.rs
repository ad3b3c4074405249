// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deferred delivery to a wrapped writer.
//!
//! A [`LazyWriter`] accepts entries into a FIFO queue and returns
//! immediately. A timer thread drains the queue every interval while
//! entries keep arriving and stops once a tick finds nothing left. Dropping
//! or disposing the writer drains whatever is still queued.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use loom_logbook_core::defaults::areas;
use loom_logbook_core::{
	AggregateError, ErrorData, LogEntry, LogEntryFilter, LogWriter, SinkError, SinkResult,
};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::emergency::{EmergencyLog, EmergencyLogSetting};
use crate::error::LogbookError;
use crate::logbook::guarded;

pub const DEFAULT_LAZY_WRITE_INTERVAL: Duration = Duration::from_secs(30);

const TIMER_THREAD_NAME: &str = "logbook-lazy-writer";

/// Configuration for a [`LazyWriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyWriterConfig {
	/// Time between queue drains while the timer is armed.
	pub interval: Duration,
	/// Drain synchronously on every write instead of arming the timer.
	pub auto_flush: bool,
}

impl Default for LazyWriterConfig {
	fn default() -> Self {
		Self {
			interval: DEFAULT_LAZY_WRITE_INTERVAL,
			auto_flush: false,
		}
	}
}

#[derive(Default)]
struct LazyState {
	queue: VecDeque<LogEntry>,
	/// True while a timer thread is armed.
	enabled: bool,
	disposed: bool,
	timer: Option<JoinHandle<()>>,
}

struct LazyCore {
	inner: Arc<dyn LogWriter>,
	emergency: Arc<EmergencyLog>,
	interval: Duration,
	auto_flush: AtomicBool,
	state: Mutex<LazyState>,
	wake: Condvar,
	/// Serializes drains so entries reach the inner writer in FIFO order.
	drain_lock: Mutex<()>,
}

impl LazyCore {
	fn drain(&self) -> Result<(), AggregateError> {
		let _drain = self.drain_lock.lock();
		let batch: Vec<LogEntry> = self.state.lock().queue.drain(..).collect();
		if batch.is_empty() {
			return Ok(());
		}

		let total = batch.len();
		let setting = self.emergency.setting();
		debug!(writer = self.inner.name(), count = total, "draining lazy writer queue");

		let mut errors = Vec::new();
		for entry in batch {
			let Err(e) = guarded(|| self.inner.try_write(&entry)) else {
				continue;
			};
			match setting {
				EmergencyLogSetting::Ignore => {
					warn!(writer = self.inner.name(), entry_id = %entry.id(), error = %e, "ignoring deferred write failure");
				}
				EmergencyLogSetting::AddToEmergencyLog => {
					if let Err(escalation) = self.escalate(&entry, e) {
						errors.push(SinkError::Other(Box::new(escalation)));
					}
				}
				EmergencyLogSetting::ThrowExceptions => errors.push(e),
			}
		}

		if errors.is_empty() {
			Ok(())
		} else {
			Err(AggregateError::new(
				format!("{} of {} log entries not written", errors.len(), total),
				errors,
			))
		}
	}

	fn escalate(&self, entry: &LogEntry, error: SinkError) -> crate::error::Result<()> {
		let mut copy = entry.copy();
		if copy.area.is_none() {
			copy.area = Some(areas::LOG_WRITER.to_string());
		}
		let failure = LogbookError::from(AggregateError::new(
			format!("deferred write to log writer '{}' failed", self.inner.name()),
			vec![error],
		));
		self.emergency.write(&mut copy, Some(&ErrorData::new(failure)))
	}
}

fn run_timer(core: Arc<LazyCore>) {
	debug!(interval_ms = core.interval.as_millis() as u64, "lazy writer timer armed");
	loop {
		{
			let mut state = core.state.lock();
			let deadline = Instant::now() + core.interval;
			while !state.disposed && !core.wake.wait_until(&mut state, deadline).timed_out() {}
			if state.disposed {
				return;
			}
		}

		if let Err(e) = core.drain() {
			error!(writer = core.inner.name(), error = %e, "lazy writer failed to flush queue");
		}

		let mut state = core.state.lock();
		if state.disposed {
			return;
		}
		if state.queue.is_empty() {
			state.enabled = false;
			debug!("lazy writer timer disarmed");
			return;
		}
	}
}

/// Writer decorator that defers delivery to `inner`.
///
/// Failures of deferred writes never reach the original caller. They follow
/// the emergency log setting of the bound [`EmergencyLog`], per entry.
pub struct LazyWriter {
	core: Arc<LazyCore>,
}

impl LazyWriter {
	/// Wrap `inner`, bound to the process-wide emergency log.
	pub fn new(inner: Arc<dyn LogWriter>, config: LazyWriterConfig) -> Self {
		Self::with_context(inner, config, EmergencyLog::global())
	}

	pub fn with_context(
		inner: Arc<dyn LogWriter>,
		config: LazyWriterConfig,
		emergency: Arc<EmergencyLog>,
	) -> Self {
		info!(
			writer = inner.name(),
			interval_ms = config.interval.as_millis() as u64,
			auto_flush = config.auto_flush,
			"lazy writer created"
		);
		Self {
			core: Arc::new(LazyCore {
				inner,
				emergency,
				interval: config.interval,
				auto_flush: AtomicBool::new(config.auto_flush),
				state: Mutex::new(LazyState::default()),
				wake: Condvar::new(),
				drain_lock: Mutex::new(()),
			}),
		}
	}

	pub fn inner(&self) -> &Arc<dyn LogWriter> {
		&self.core.inner
	}

	pub fn auto_flush(&self) -> bool {
		self.core.auto_flush.load(Ordering::SeqCst)
	}

	pub fn set_auto_flush(&self, auto_flush: bool) {
		self.core.auto_flush.store(auto_flush, Ordering::SeqCst);
	}

	/// Whether the timer is currently armed.
	pub fn is_enabled(&self) -> bool {
		self.core.state.lock().enabled
	}

	pub fn queue_len(&self) -> usize {
		self.core.state.lock().queue.len()
	}

	/// Drain the queue now, on the calling thread.
	pub fn flush(&self) -> Result<(), AggregateError> {
		self.core.drain()
	}

	fn arm_timer(&self, state: &mut LazyState) -> bool {
		let core = Arc::clone(&self.core);
		match thread::Builder::new()
			.name(TIMER_THREAD_NAME.to_string())
			.spawn(move || run_timer(core))
		{
			Ok(handle) => {
				state.enabled = true;
				// A previous timer has already disarmed itself and is exiting.
				state.timer = Some(handle);
				true
			}
			Err(e) => {
				warn!(error = %e, "failed to start lazy writer timer, writing synchronously");
				false
			}
		}
	}
}

fn into_sink_error(err: AggregateError) -> SinkError {
	SinkError::Other(Box::new(err))
}

impl LogWriter for LazyWriter {
	fn name(&self) -> &str {
		self.core.inner.name()
	}

	fn filter(&self) -> &LogEntryFilter {
		self.core.inner.filter()
	}

	fn try_initialize(&self) -> SinkResult<()> {
		self.core.inner.try_initialize()
	}

	fn try_write(&self, entry: &LogEntry) -> SinkResult<()> {
		let drain_now = {
			let mut state = self.core.state.lock();
			if state.disposed {
				return Err(SinkError::Permanent(format!(
					"lazy writer '{}' has been disposed",
					self.core.inner.name()
				)));
			}
			state.queue.push_back(entry.clone());

			if self.auto_flush() {
				true
			} else if state.enabled {
				false
			} else {
				!self.arm_timer(&mut state)
			}
		};

		if drain_now {
			self.core.drain().map_err(into_sink_error)
		} else {
			Ok(())
		}
	}

	/// Stop the timer, drain the queue and dispose the inner writer.
	fn dispose(&self) -> SinkResult<()> {
		let timer = {
			let mut state = self.core.state.lock();
			if state.disposed {
				return Ok(());
			}
			state.disposed = true;
			state.enabled = false;
			state.timer.take()
		};
		self.core.wake.notify_all();

		if let Some(handle) = timer {
			if handle.thread().id() != thread::current().id() && handle.join().is_err() {
				error!("lazy writer timer panicked");
			}
		}

		let drained = self.core.drain();
		let disposed = self.core.inner.dispose();
		info!(writer = self.core.inner.name(), "lazy writer disposed");
		drained.map_err(into_sink_error)?;
		disposed
	}
}

impl Drop for LazyWriter {
	fn drop(&mut self) {
		if let Err(e) = LogWriter::dispose(self) {
			error!(error = %e, "lazy writer failed to flush on drop");
		}
	}
}
