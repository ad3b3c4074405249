// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed custom data attached to log entries.
//!
//! Values implement [`CustomData`] to describe their type name, the type tags
//! they satisfy, and how to view them as JSON or as an error. Formatter
//! selection works purely on those descriptors.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

/// Tag every value satisfies. Also used as the lookup type for absent data.
pub const OBJECT_TYPE: &str = "object";

/// Tag satisfied by every error value.
pub const ERROR_TYPE: &str = "std::error::Error";

/// A value that can be attached to a log entry and rendered by a formatter.
pub trait CustomData: Send + Sync {
	/// Fully-qualified type name of the value.
	fn type_name(&self) -> &str;

	/// Additional type tags this value satisfies, checked when a formatter
	/// matches subtypes. [`OBJECT_TYPE`] is implied and need not be listed.
	fn type_tags(&self) -> &[&'static str] {
		&[]
	}

	fn to_json(&self) -> Result<Value, serde_json::Error>;

	/// Error view of the value, if it is one.
	fn as_error(&self) -> Option<&(dyn StdError + 'static)> {
		None
	}

	/// Backtrace captured alongside the value.
	fn backtrace(&self) -> Option<&Backtrace> {
		None
	}
}

/// Attaches any serializable value as custom data, named by its Rust type.
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T> CustomData for Json<T>
where
	T: Serialize + Send + Sync,
{
	fn type_name(&self) -> &str {
		std::any::type_name::<T>()
	}

	fn to_json(&self) -> Result<Value, serde_json::Error> {
		serde_json::to_value(&self.0)
	}
}

/// Attaches an error as custom data, capturing a backtrace at construction.
pub struct ErrorData {
	error: Box<dyn StdError + Send + Sync + 'static>,
	type_name: &'static str,
	backtrace: Backtrace,
}

impl ErrorData {
	pub fn new<E>(error: E) -> Self
	where
		E: StdError + Send + Sync + 'static,
	{
		Self {
			error: Box::new(error),
			type_name: std::any::type_name::<E>(),
			backtrace: Backtrace::capture(),
		}
	}

	/// Wrap an already type-erased error. Its type name is [`ERROR_TYPE`].
	pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
		Self {
			error,
			type_name: ERROR_TYPE,
			backtrace: Backtrace::capture(),
		}
	}

	pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
		self.error.as_ref()
	}
}

impl fmt::Debug for ErrorData {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ErrorData")
			.field("type_name", &self.type_name)
			.field("error", &self.error.to_string())
			.finish()
	}
}

impl CustomData for ErrorData {
	fn type_name(&self) -> &str {
		self.type_name
	}

	fn type_tags(&self) -> &[&'static str] {
		&[ERROR_TYPE]
	}

	fn to_json(&self) -> Result<Value, serde_json::Error> {
		let mut chain = Vec::new();
		let mut source = self.error.source();
		while let Some(err) = source {
			chain.push(err.to_string());
			source = err.source();
		}
		Ok(json!({
			"type": self.type_name,
			"message": self.error.to_string(),
			"sources": chain,
		}))
	}

	fn as_error(&self) -> Option<&(dyn StdError + 'static)> {
		Some(self.error.as_ref())
	}

	fn backtrace(&self) -> Option<&Backtrace> {
		Some(&self.backtrace)
	}
}
