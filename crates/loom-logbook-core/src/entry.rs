// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The log entry model.
//!
//! - [`LogSeverity`]: the five severity levels, most severe first
//! - [`LogEntry`]: a single record moving through the dispatcher
//! - [`CustomDataPayload`]: the formatted custom data stamped by a formatter

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LogSeverity {
	Critical,
	Error,
	Warning,
	#[default]
	Information,
	Verbose,
}

impl LogSeverity {
	/// Returns all severity levels from most to least severe.
	pub fn all() -> &'static [LogSeverity] {
		&[
			LogSeverity::Critical,
			LogSeverity::Error,
			LogSeverity::Warning,
			LogSeverity::Information,
			LogSeverity::Verbose,
		]
	}

	fn rank(self) -> u8 {
		match self {
			LogSeverity::Critical => 4,
			LogSeverity::Error => 3,
			LogSeverity::Warning => 2,
			LogSeverity::Information => 1,
			LogSeverity::Verbose => 0,
		}
	}
}

impl PartialOrd for LogSeverity {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for LogSeverity {
	fn cmp(&self, other: &Self) -> Ordering {
		// Critical > Error > Warning > Information > Verbose
		self.rank().cmp(&other.rank())
	}
}

impl fmt::Display for LogSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			LogSeverity::Critical => "Critical",
			LogSeverity::Error => "Error",
			LogSeverity::Warning => "Warning",
			LogSeverity::Information => "Information",
			LogSeverity::Verbose => "Verbose",
		};
		write!(f, "{s}")
	}
}

/// Custom data rendered by a formatter.
///
/// The three fields only ever exist together: an entry either carries a
/// complete payload or none at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDataPayload {
	/// The rendered custom data.
	pub data: String,
	/// Name of the formatter that rendered `data`.
	pub formatter: String,
	/// Fully-qualified type name of the original value.
	pub type_name: String,
}

/// A single log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
	id: Uuid,
	created_on: DateTime<FixedOffset>,

	/// Groups entries produced within one logical request or transaction.
	pub correlation_id: Option<Uuid>,

	/// Short title.
	pub title: Option<String>,
	/// Free text message.
	pub message: Option<String>,
	/// Originating subsystem or component.
	pub source: Option<String>,
	/// Sub-component or operation within the source.
	pub area: Option<String>,
	pub severity: LogSeverity,

	/// Identifier of the client that produced the entry.
	pub client: Option<String>,
	/// Free text about the client (address, user agent).
	pub client_info: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	custom_data: Option<CustomDataPayload>,

	/// Tamper-evidence signature, set by an external signer.
	pub signature: Option<String>,
	/// Name of the signing method used for `signature`.
	pub signature_method: Option<String>,
}

impl Default for LogEntry {
	fn default() -> Self {
		Self::new()
	}
}

impl LogEntry {
	/// Create an empty entry with a fresh id and the current local time.
	pub fn new() -> Self {
		Self {
			id: Uuid::new_v4(),
			created_on: Local::now().fixed_offset(),
			correlation_id: None,
			title: None,
			message: None,
			source: None,
			area: None,
			severity: LogSeverity::default(),
			client: None,
			client_info: None,
			custom_data: None,
			signature: None,
			signature_method: None,
		}
	}

	/// Create an informational entry.
	pub fn create(title: impl Into<String>, message: impl Into<String>) -> Self {
		Self::new().with_title(title).with_message(message)
	}

	fn classified(
		severity: LogSeverity,
		title: impl Into<String>,
		message: impl Into<String>,
		source: impl Into<String>,
		area: impl Into<String>,
	) -> Self {
		Self::create(title, message)
			.with_source(source)
			.with_area(area)
			.with_severity(severity)
	}

	pub fn warning(
		title: impl Into<String>,
		message: impl Into<String>,
		source: impl Into<String>,
		area: impl Into<String>,
	) -> Self {
		Self::classified(LogSeverity::Warning, title, message, source, area)
	}

	pub fn error(
		title: impl Into<String>,
		message: impl Into<String>,
		source: impl Into<String>,
		area: impl Into<String>,
	) -> Self {
		Self::classified(LogSeverity::Error, title, message, source, area)
	}

	pub fn critical(
		title: impl Into<String>,
		message: impl Into<String>,
		source: impl Into<String>,
		area: impl Into<String>,
	) -> Self {
		Self::classified(LogSeverity::Critical, title, message, source, area)
	}

	/// Create a verbose entry. Title and message are optional for verbose
	/// tracing output.
	pub fn verbose(source: impl Into<String>, area: impl Into<String>) -> Self {
		Self::new()
			.with_source(source)
			.with_area(area)
			.with_severity(LogSeverity::Verbose)
	}

	/// Clone the entry, keeping its id and timestamp.
	pub fn copy(&self) -> Self {
		self.clone()
	}

	/// Clone the entry as a new record with a fresh id and timestamp.
	///
	/// The correlation id is inherited unless `correlation_id` overrides it.
	pub fn copy_new(&self, correlation_id: Option<Uuid>) -> Self {
		Self {
			id: Uuid::new_v4(),
			created_on: Local::now().fixed_offset(),
			correlation_id: correlation_id.or(self.correlation_id),
			..self.clone()
		}
	}

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn created_on(&self) -> DateTime<FixedOffset> {
		self.created_on
	}

	/// Creation time as `yyyy-MM-ddTHH:mm:ss.fffffffzzz`.
	pub fn created_on_string(&self) -> String {
		let ticks = (self.created_on.timestamp_subsec_nanos() / 100).min(9_999_999);
		format!(
			"{}.{:07}{}",
			self.created_on.format("%Y-%m-%dT%H:%M:%S"),
			ticks,
			self.created_on.format("%:z")
		)
	}

	pub fn custom_data(&self) -> Option<&CustomDataPayload> {
		self.custom_data.as_ref()
	}

	/// Replace the formatted payload. Called by formatters.
	pub fn set_custom_data(&mut self, payload: CustomDataPayload) {
		self.custom_data = Some(payload);
	}

	pub fn clear_custom_data(&mut self) {
		self.custom_data = None;
	}

	pub fn with_title(mut self, title: impl Into<String>) -> Self {
		self.title = Some(title.into());
		self
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}

	pub fn with_source(mut self, source: impl Into<String>) -> Self {
		self.source = Some(source.into());
		self
	}

	pub fn with_area(mut self, area: impl Into<String>) -> Self {
		self.area = Some(area.into());
		self
	}

	pub fn with_severity(mut self, severity: LogSeverity) -> Self {
		self.severity = severity;
		self
	}

	pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
		self.correlation_id = Some(correlation_id);
		self
	}

	/// Set the client identifier and free-text client details.
	pub fn with_client(
		mut self,
		client: impl Into<String>,
		client_info: Option<impl Into<String>>,
	) -> Self {
		self.client = Some(client.into());
		self.client_info = client_info.map(Into::into);
		self
	}

	pub fn with_signature(
		mut self,
		signature: impl Into<String>,
		method: impl Into<String>,
	) -> Self {
		self.signature = Some(signature.into());
		self.signature_method = Some(method.into());
		self
	}
}
