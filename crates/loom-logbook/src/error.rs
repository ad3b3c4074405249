// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use loom_logbook_core::{AggregateError, FormatError, SinkError};
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, LogbookError>;

/// Kind of collaborator that failed to initialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorKind {
	Writer,
	Subscriber,
	Reader,
}

impl std::fmt::Display for CollaboratorKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			CollaboratorKind::Writer => "writer",
			CollaboratorKind::Subscriber => "subscriber",
			CollaboratorKind::Reader => "reader",
		};
		write!(f, "{s}")
	}
}

#[derive(Error, Debug)]
pub enum LogbookError {
	#[error("{kind} '{name}' failed to initialize: {source}")]
	Initialization {
		kind: CollaboratorKind,
		name: String,
		#[source]
		source: SinkError,
	},

	#[error("a logbook requires at least one writer")]
	NoWriters,

	#[error("no formatter registered for custom data of type '{type_name}'")]
	NoFormatter { type_name: String },

	#[error("formatter '{formatter}' failed: {source}")]
	Format {
		formatter: String,
		#[source]
		source: FormatError,
	},

	#[error(transparent)]
	Aggregate(#[from] AggregateError),

	#[error("the emergency log has not been set up")]
	EmergencyLogNotConfigured,

	#[error("an emergency log entry was not written: {id} with the title {title:?}")]
	EmergencyWrite {
		id: Uuid,
		title: Option<String>,
		#[source]
		source: Box<LogbookError>,
	},

	#[error("reader '{name}' failed: {source}")]
	Read {
		name: String,
		#[source]
		source: SinkError,
	},

	#[error("failed to read config file {path}: {source}")]
	ConfigRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	ConfigParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidConfig { key: String, message: String },
}

impl LogbookError {
	/// Inner collaborator errors when this is an aggregate failure.
	pub fn aggregate(&self) -> Option<&AggregateError> {
		match self {
			LogbookError::Aggregate(aggregate) => Some(aggregate),
			_ => None,
		}
	}
}
