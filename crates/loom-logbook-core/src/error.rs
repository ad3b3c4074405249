// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use thiserror::Error;

pub type SinkResult<T> = Result<T, SinkError>;

/// Text of a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"unknown panic payload".to_string()
	}
}

/// Error returned by a writer, subscriber or reader.
#[derive(Error, Debug)]
pub enum SinkError {
	#[error("transient error: {0}")]
	Transient(String),

	#[error("permanent error: {0}")]
	Permanent(String),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("collaborator panicked: {0}")]
	Panicked(String),

	#[error(transparent)]
	Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl SinkError {
	/// Build a [`SinkError::Panicked`] from a caught panic payload.
	pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
		SinkError::Panicked(panic_message(payload.as_ref()))
	}
}

/// Error returned by a formatter while rendering custom data.
#[derive(Error, Debug)]
pub enum FormatError {
	#[error("serialization failed: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("formatter '{formatter}' cannot render values of type '{type_name}'")]
	UnsupportedData {
		formatter: String,
		type_name: String,
	},

	#[error("formatter panicked: {0}")]
	Panicked(String),

	#[error("{0}")]
	Other(String),
}

/// Several collaborator failures collected into one error.
#[derive(Debug)]
pub struct AggregateError {
	message: String,
	errors: Vec<SinkError>,
}

impl AggregateError {
	pub fn new(message: impl Into<String>, errors: Vec<SinkError>) -> Self {
		Self {
			message: message.into(),
			errors,
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn errors(&self) -> &[SinkError] {
		&self.errors
	}

	pub fn into_errors(self) -> Vec<SinkError> {
		self.errors
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}
}

impl fmt::Display for AggregateError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({} inner errors)", self.message, self.errors.len())
	}
}

impl std::error::Error for AggregateError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.errors.first().map(|e| e as &(dyn std::error::Error + 'static))
	}
}
