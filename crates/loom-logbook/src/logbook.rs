// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The log dispatcher.
//!
//! A [`Logbook`] owns the formatter, writer, subscriber and reader registries.
//! Writing an entry formats any custom data, fans the entry out to every
//! matching writer, routes failures through the [`EmergencyLogSetting`]
//! policy and then notifies matching subscribers.

use std::any::Any;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use loom_logbook_core::defaults::areas;
use loom_logbook_core::{
	AggregateError, CustomData, ErrorData, FormatError, LogEntry, LogEntryFilter, LogFormatter,
	LogReader, LogSubscriber, LogWriter, SinkError, SinkResult,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::emergency::{EmergencyLog, EmergencyLogSetting};
use crate::error::{CollaboratorKind, LogbookError, Result};

const WRITER_FAILURE_MESSAGE: &str = "unhandled errors occurred in one or more log writers";
const SUBSCRIBER_FAILURE_MESSAGE: &str = "unhandled errors occurred in one or more log subscribers";
const DISPOSE_FAILURE_MESSAGE: &str = "unhandled errors occurred while disposing log writers";

static DEFAULT_LOGBOOK: OnceLock<Arc<Logbook>> = OnceLock::new();

/// How the synchronous write path fans out to writers and subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
	/// One at a time, in registration order.
	#[default]
	Sequential,
	/// Concurrently on scoped threads. No ordering guarantee.
	Parallel,
}

/// Run a collaborator call, converting a panic into [`SinkError::Panicked`].
pub(crate) fn guarded<T>(call: impl FnOnce() -> SinkResult<T>) -> SinkResult<T> {
	catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| Err(SinkError::from_panic(payload)))
}

fn run_sequential<C: ?Sized>(
	collaborators: &[Arc<C>],
	call: impl Fn(&C) -> SinkResult<()>,
	name: impl Fn(&C) -> &str,
) -> Vec<SinkError> {
	collaborators
		.iter()
		.filter_map(|c| {
			guarded(|| call(c.as_ref())).err().inspect(|e| {
				warn!(collaborator = name(c.as_ref()), error = %e, "log collaborator failed");
			})
		})
		.collect()
}

fn run_parallel<C: ?Sized + Send + Sync>(
	collaborators: &[Arc<C>],
	call: impl Fn(&C) -> SinkResult<()> + Sync,
	name: impl Fn(&C) -> &str,
) -> Vec<SinkError> {
	let call = &call;
	let results: Vec<SinkResult<()>> = std::thread::scope(|scope| {
		let handles: Vec<_> = collaborators
			.iter()
			.map(|c| scope.spawn(move || call(c.as_ref())))
			.collect();
		handles
			.into_iter()
			.map(|handle| handle.join().unwrap_or_else(|payload| Err(SinkError::from_panic(payload))))
			.collect()
	});

	collaborators
		.iter()
		.zip(results)
		.filter_map(|(c, result)| {
			result.err().inspect(|e| {
				warn!(collaborator = name(c.as_ref()), error = %e, "log collaborator failed");
			})
		})
		.collect()
}

async fn join_all(mut set: JoinSet<(String, SinkResult<()>)>) -> Vec<SinkError> {
	let mut errors = Vec::new();
	while let Some(joined) = set.join_next().await {
		match joined {
			Ok((_, Ok(()))) => {}
			Ok((name, Err(e))) => {
				warn!(collaborator = %name, error = %e, "log collaborator failed");
				errors.push(e);
			}
			Err(e) => {
				warn!(error = %e, "log collaborator task failed");
				errors.push(match e.try_into_panic() {
					Ok(payload) => SinkError::from_panic(payload),
					Err(e) => SinkError::Other(Box::new(e)),
				});
			}
		}
	}
	errors
}

/// Central log dispatcher.
pub struct Logbook {
	formatters: RwLock<Vec<Arc<dyn LogFormatter>>>,
	writers: RwLock<Vec<Arc<dyn LogWriter>>>,
	subscribers: RwLock<Vec<Arc<dyn LogSubscriber>>>,
	readers: RwLock<Vec<Arc<dyn LogReader>>>,
	emergency: Arc<EmergencyLog>,
	dispatch_mode: DispatchMode,
}

impl Logbook {
	/// Create an empty logbook bound to the process-wide emergency log.
	pub fn new() -> Self {
		Self::with_context(EmergencyLog::global())
	}

	/// Create an empty logbook bound to `emergency`.
	pub fn with_context(emergency: Arc<EmergencyLog>) -> Self {
		Self {
			formatters: RwLock::new(Vec::new()),
			writers: RwLock::new(Vec::new()),
			subscribers: RwLock::new(Vec::new()),
			readers: RwLock::new(Vec::new()),
			emergency,
			dispatch_mode: DispatchMode::default(),
		}
	}

	pub fn builder() -> LogbookBuilder {
		LogbookBuilder::default()
	}

	/// The process-wide logbook, created empty on first access.
	pub fn default_instance() -> Arc<Logbook> {
		DEFAULT_LOGBOOK
			.get_or_init(|| Arc::new(Logbook::new()))
			.clone()
	}

	/// Build a logbook from complete registries, initializing every
	/// collaborator up front. At least one writer is required.
	pub fn create(
		writers: Vec<Arc<dyn LogWriter>>,
		formatters: Vec<Arc<dyn LogFormatter>>,
		subscribers: Vec<Arc<dyn LogSubscriber>>,
		readers: Vec<Arc<dyn LogReader>>,
	) -> Result<Logbook> {
		LogbookBuilder {
			writers,
			formatters,
			subscribers,
			readers,
			..Default::default()
		}
		.build()
	}

	pub fn emergency_log(&self) -> &Arc<EmergencyLog> {
		&self.emergency
	}

	pub fn dispatch_mode(&self) -> DispatchMode {
		self.dispatch_mode
	}

	pub fn register_formatter(&self, formatter: Arc<dyn LogFormatter>) {
		debug!(formatter = formatter.name(), "registering log formatter");
		self.formatters.write().push(formatter);
	}

	pub fn register_writer(&self, writer: Arc<dyn LogWriter>) -> Result<()> {
		writer
			.try_initialize()
			.map_err(|source| LogbookError::Initialization {
				kind: CollaboratorKind::Writer,
				name: writer.name().to_string(),
				source,
			})?;
		debug!(writer = writer.name(), "registered log writer");
		self.writers.write().push(writer);
		Ok(())
	}

	pub fn register_subscriber(&self, subscriber: Arc<dyn LogSubscriber>) -> Result<()> {
		subscriber
			.try_initialize()
			.map_err(|source| LogbookError::Initialization {
				kind: CollaboratorKind::Subscriber,
				name: subscriber.name().to_string(),
				source,
			})?;
		debug!(subscriber = subscriber.name(), "registered log subscriber");
		self.subscribers.write().push(subscriber);
		Ok(())
	}

	pub fn register_reader(&self, reader: Arc<dyn LogReader>) -> Result<()> {
		reader
			.try_initialize()
			.map_err(|source| LogbookError::Initialization {
				kind: CollaboratorKind::Reader,
				name: reader.name().to_string(),
				source,
			})?;
		debug!(reader = reader.name(), "registered log reader");
		self.readers.write().push(reader);
		Ok(())
	}

	pub fn writer_count(&self) -> usize {
		self.writers.read().len()
	}

	pub fn subscriber_count(&self) -> usize {
		self.subscribers.read().len()
	}

	/// First registered formatter accepting `data`.
	pub fn find_formatter(&self, data: Option<&dyn CustomData>) -> Option<Arc<dyn LogFormatter>> {
		self
			.formatters
			.read()
			.iter()
			.find(|f| f.is_valid_formatter_for(data))
			.cloned()
	}

	fn formatter_named(&self, name: &str) -> Option<Arc<dyn LogFormatter>> {
		self
			.formatters
			.read()
			.iter()
			.find(|f| f.name() == name)
			.cloned()
	}

	fn matching_writers(&self, entry: &LogEntry) -> Vec<Arc<dyn LogWriter>> {
		self
			.writers
			.read()
			.iter()
			.filter(|w| w.filter().is_match(entry))
			.cloned()
			.collect()
	}

	fn matching_subscribers(&self, entry: &LogEntry) -> Vec<Arc<dyn LogSubscriber>> {
		self
			.subscribers
			.read()
			.iter()
			.filter(|s| s.filter().is_match(entry))
			.cloned()
			.collect()
	}

	fn readers_snapshot(&self) -> Vec<Arc<dyn LogReader>> {
		self.readers.read().clone()
	}

	/// Write an entry with the default emergency log setting.
	pub fn write_entry(&self, entry: &mut LogEntry) -> Result<bool> {
		self.write(entry, None, None)
	}

	/// Write an entry with custom data and the default emergency log setting.
	pub fn write_entry_with(&self, entry: &mut LogEntry, data: &dyn CustomData) -> Result<bool> {
		self.write(entry, Some(data), None)
	}

	/// Write an entry through the full pipeline.
	///
	/// Returns `Ok(true)` when no matching writer failed. An entry that no
	/// writer matches counts as written. Writer and subscriber failures are
	/// routed through `setting`, or the emergency log's configured setting
	/// when `None`. A missing formatter for `data` is always an error.
	#[instrument(skip(self, entry, data), fields(entry_id = %entry.id()))]
	pub fn write(
		&self,
		entry: &mut LogEntry,
		data: Option<&dyn CustomData>,
		setting: Option<EmergencyLogSetting>,
	) -> Result<bool> {
		let setting = setting.unwrap_or_else(|| self.emergency.setting());

		if let Some(data) = data {
			if let Some(failure) = self.format(entry, data)? {
				self.escalate(entry, failure, setting)?;
			}
		}

		let writers = self.matching_writers(entry);
		let entry_ref: &LogEntry = entry;
		let errors = if writers.is_empty() {
			debug!("no matching log writers");
			Vec::new()
		} else {
			match self.dispatch_mode {
				DispatchMode::Sequential => run_sequential(&writers, |w| w.try_write(entry_ref), |w| w.name()),
				DispatchMode::Parallel => run_parallel(&writers, |w| w.try_write(entry_ref), |w| w.name()),
			}
		};

		let was_created = errors.is_empty();
		if !was_created {
			let failure = AggregateError::new(WRITER_FAILURE_MESSAGE, errors).into();
			self.escalate(entry, failure, setting)?;
		}

		let subscribers = self.matching_subscribers(entry);
		if !subscribers.is_empty() {
			let errors = match self.dispatch_mode {
				DispatchMode::Sequential => run_sequential(
					&subscribers,
					|s| s.receive(entry_ref, was_created),
					|s| s.name(),
				),
				DispatchMode::Parallel => run_parallel(
					&subscribers,
					|s| s.receive(entry_ref, was_created),
					|s| s.name(),
				),
			};
			if !errors.is_empty() {
				let failure = AggregateError::new(SUBSCRIBER_FAILURE_MESSAGE, errors).into();
				self.escalate(entry, failure, setting)?;
			}
		}

		Ok(was_created)
	}

	pub async fn write_entry_async(&self, entry: &mut LogEntry) -> Result<bool> {
		self.write_async(entry, None, None).await
	}

	pub async fn write_entry_with_async(
		&self,
		entry: &mut LogEntry,
		data: &dyn CustomData,
	) -> Result<bool> {
		self.write_async(entry, Some(data), None).await
	}

	/// Asynchronous form of [`Logbook::write`]. Writers and subscribers are
	/// always invoked concurrently.
	#[instrument(skip(self, entry, data), fields(entry_id = %entry.id()))]
	pub async fn write_async(
		&self,
		entry: &mut LogEntry,
		data: Option<&dyn CustomData>,
		setting: Option<EmergencyLogSetting>,
	) -> Result<bool> {
		let setting = setting.unwrap_or_else(|| self.emergency.setting());

		if let Some(data) = data {
			if let Some(failure) = self.format(entry, data)? {
				self.escalate_async(entry, failure, setting).await?;
			}
		}

		let writers = self.matching_writers(entry);
		let shared = Arc::new(entry.clone());

		let mut set = JoinSet::new();
		for writer in writers {
			let entry = Arc::clone(&shared);
			set.spawn(async move {
				let result = writer.try_write_async(&entry).await;
				(writer.name().to_string(), result)
			});
		}
		let errors = join_all(set).await;

		let was_created = errors.is_empty();
		if !was_created {
			let failure = AggregateError::new(WRITER_FAILURE_MESSAGE, errors).into();
			self.escalate_async(entry, failure, setting).await?;
		}

		let mut set = JoinSet::new();
		for subscriber in self.matching_subscribers(entry) {
			let entry = Arc::clone(&shared);
			set.spawn(async move {
				let result = subscriber.receive_async(&entry, was_created).await;
				(subscriber.name().to_string(), result)
			});
		}
		let errors = join_all(set).await;
		if !errors.is_empty() {
			let failure = AggregateError::new(SUBSCRIBER_FAILURE_MESSAGE, errors).into();
			self.escalate_async(entry, failure, setting).await?;
		}

		Ok(was_created)
	}

	/// Format `data` into `entry`. A missing formatter is an error; a failing
	/// formatter is returned for escalation.
	fn format(&self, entry: &mut LogEntry, data: &dyn CustomData) -> Result<Option<LogbookError>> {
		let formatter = self
			.find_formatter(Some(data))
			.ok_or_else(|| LogbookError::NoFormatter {
				type_name: data.type_name().to_string(),
			})?;

		let result = catch_unwind(AssertUnwindSafe(|| formatter.format(entry, data))).unwrap_or_else(
			|payload| Err(FormatError::Panicked(loom_logbook_core::panic_message(payload.as_ref()))),
		);

		Ok(result.err().map(|source| {
			warn!(formatter = formatter.name(), error = %source, "log formatter failed");
			LogbookError::Format {
				formatter: formatter.name().to_string(),
				source,
			}
		}))
	}

	fn escalate(
		&self,
		entry: &LogEntry,
		failure: LogbookError,
		setting: EmergencyLogSetting,
	) -> Result<()> {
		match setting {
			EmergencyLogSetting::Ignore => {
				warn!(entry_id = %entry.id(), error = %failure, "ignoring log pipeline failure");
				Ok(())
			}
			EmergencyLogSetting::AddToEmergencyLog => {
				let mut emergency_entry = emergency_copy(entry, &failure);
				self
					.emergency
					.write(&mut emergency_entry, Some(&ErrorData::new(failure)))
			}
			EmergencyLogSetting::ThrowExceptions => Err(failure),
		}
	}

	async fn escalate_async(
		&self,
		entry: &LogEntry,
		failure: LogbookError,
		setting: EmergencyLogSetting,
	) -> Result<()> {
		match setting {
			EmergencyLogSetting::AddToEmergencyLog => {
				let mut emergency_entry = emergency_copy(entry, &failure);
				let data = ErrorData::new(failure);
				// The emergency log is itself a Logbook, so this recursion needs a boxed future.
				Box::pin(self.emergency.write_async(&mut emergency_entry, Some(&data))).await
			}
			_ => self.escalate(entry, failure, setting),
		}
	}

	/// First entry with `id` found by any reader.
	pub fn read_entry(&self, id: Uuid) -> Result<Option<LogEntry>> {
		for reader in self.readers_snapshot() {
			let found = reader
				.read_by_id(id)
				.map_err(|source| read_error(reader.as_ref(), source))?;
			if found.is_some() {
				return Ok(found);
			}
		}
		Ok(None)
	}

	/// Entries matching `filter` across all readers, de-duplicated by id.
	/// A `max_count` of zero means unbounded.
	pub fn read_entries(&self, filter: &LogEntryFilter, max_count: usize) -> Result<Vec<LogEntry>> {
		let mut merged = Merged::new(max_count);
		for reader in self.readers_snapshot() {
			let entries = reader
				.read_by_filter(filter, max_count)
				.map_err(|source| read_error(reader.as_ref(), source))?;
			if merged.extend(entries) {
				break;
			}
		}
		Ok(merged.into_entries())
	}

	pub async fn read_entry_async(&self, id: Uuid) -> Result<Option<LogEntry>> {
		for reader in self.readers_snapshot() {
			let found = reader
				.read_by_id_async(id)
				.await
				.map_err(|source| read_error(reader.as_ref(), source))?;
			if found.is_some() {
				return Ok(found);
			}
		}
		Ok(None)
	}

	pub async fn read_entries_async(
		&self,
		filter: &LogEntryFilter,
		max_count: usize,
	) -> Result<Vec<LogEntry>> {
		let mut merged = Merged::new(max_count);
		for reader in self.readers_snapshot() {
			let entries = reader
				.read_by_filter_async(filter, max_count)
				.await
				.map_err(|source| read_error(reader.as_ref(), source))?;
			if merged.extend(entries) {
				break;
			}
		}
		Ok(merged.into_entries())
	}

	/// Parse the entry's payload back using the formatter that produced it.
	pub fn try_parse_custom_data(&self, entry: &LogEntry) -> Option<Box<dyn Any + Send>> {
		let payload = entry.custom_data()?;
		let formatter = self.formatter_named(&payload.formatter)?;
		formatter.try_parse_custom_data(entry)
	}

	pub fn parse_custom_data<T: Any>(&self, entry: &LogEntry) -> Option<T> {
		self
			.try_parse_custom_data(entry)
			.and_then(|value| value.downcast::<T>().ok())
			.map(|value| *value)
	}

	/// Dispose every registered writer, collecting failures.
	pub fn dispose(&self) -> Result<()> {
		let writers = self.writers.read().clone();
		let errors = run_sequential(&writers, |w| w.dispose(), |w| w.name());
		if errors.is_empty() {
			Ok(())
		} else {
			Err(AggregateError::new(DISPOSE_FAILURE_MESSAGE, errors).into())
		}
	}
}

impl Default for Logbook {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Logbook {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Logbook")
			.field("formatters", &self.formatters.read().len())
			.field("writers", &self.writers.read().len())
			.field("subscribers", &self.subscribers.read().len())
			.field("readers", &self.readers.read().len())
			.field("dispatch_mode", &self.dispatch_mode)
			.finish()
	}
}

fn emergency_copy(entry: &LogEntry, failure: &LogbookError) -> LogEntry {
	let mut copy = entry.copy();
	if copy.area.is_none() {
		let area = match failure {
			LogbookError::Format { .. } => areas::LOG_FORMATTER,
			LogbookError::Aggregate(a) if a.message() == SUBSCRIBER_FAILURE_MESSAGE => {
				areas::LOG_SUBSCRIBER
			}
			_ => areas::LOG_WRITER,
		};
		copy.area = Some(area.to_string());
	}
	copy
}

fn read_error(reader: &dyn LogReader, source: SinkError) -> LogbookError {
	LogbookError::Read {
		name: reader.name().to_string(),
		source,
	}
}

struct Merged {
	seen: HashSet<Uuid>,
	entries: Vec<LogEntry>,
	limit: usize,
}

impl Merged {
	fn new(max_count: usize) -> Self {
		Self {
			seen: HashSet::new(),
			entries: Vec::new(),
			limit: if max_count == 0 { usize::MAX } else { max_count },
		}
	}

	/// Returns true once the limit is reached.
	fn extend(&mut self, entries: Vec<LogEntry>) -> bool {
		for entry in entries {
			if self.entries.len() >= self.limit {
				break;
			}
			if self.seen.insert(entry.id()) {
				self.entries.push(entry);
			}
		}
		self.entries.len() >= self.limit
	}

	fn into_entries(self) -> Vec<LogEntry> {
		self.entries
	}
}

/// Builder for a [`Logbook`] with complete registries.
#[derive(Default)]
pub struct LogbookBuilder {
	writers: Vec<Arc<dyn LogWriter>>,
	formatters: Vec<Arc<dyn LogFormatter>>,
	subscribers: Vec<Arc<dyn LogSubscriber>>,
	readers: Vec<Arc<dyn LogReader>>,
	emergency: Option<Arc<EmergencyLog>>,
	dispatch_mode: DispatchMode,
}

impl LogbookBuilder {
	pub fn writer(mut self, writer: Arc<dyn LogWriter>) -> Self {
		self.writers.push(writer);
		self
	}

	pub fn formatter(mut self, formatter: Arc<dyn LogFormatter>) -> Self {
		self.formatters.push(formatter);
		self
	}

	pub fn subscriber(mut self, subscriber: Arc<dyn LogSubscriber>) -> Self {
		self.subscribers.push(subscriber);
		self
	}

	pub fn reader(mut self, reader: Arc<dyn LogReader>) -> Self {
		self.readers.push(reader);
		self
	}

	/// Bind to an explicit emergency log instead of the process-wide one.
	pub fn emergency_log(mut self, emergency: Arc<EmergencyLog>) -> Self {
		self.emergency = Some(emergency);
		self
	}

	pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
		self.dispatch_mode = mode;
		self
	}

	/// Initialize every collaborator and build the logbook. Fails on the
	/// first initialization error.
	pub fn build(self) -> Result<Logbook> {
		if self.writers.is_empty() {
			return Err(LogbookError::NoWriters);
		}

		let mut logbook =
			Logbook::with_context(self.emergency.unwrap_or_else(EmergencyLog::global));
		logbook.dispatch_mode = self.dispatch_mode;

		for formatter in self.formatters {
			logbook.register_formatter(formatter);
		}
		for writer in self.writers {
			logbook.register_writer(writer)?;
		}
		for subscriber in self.subscribers {
			logbook.register_subscriber(subscriber)?;
		}
		for reader in self.readers {
			logbook.register_reader(reader)?;
		}

		Ok(logbook)
	}
}
