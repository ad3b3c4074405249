// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::error::Error as StdError;
use std::fmt::Write;

use loom_logbook_core::{
	AggregateError, CustomData, FormatError, LogFormatter, TypeMatcher, ERROR_TYPE,
};

use crate::error::LogbookError;

/// Renders any error value as plain text: the error, its source chain, the
/// members of an aggregate error and the captured backtrace.
pub struct ErrorFormatter {
	matcher: TypeMatcher,
}

impl ErrorFormatter {
	pub const NAME: &'static str = "error-text";

	pub fn new() -> Self {
		Self {
			matcher: TypeMatcher::with_subtypes([ERROR_TYPE]),
		}
	}
}

impl Default for ErrorFormatter {
	fn default() -> Self {
		Self::new()
	}
}

fn short_type_name(type_name: &str) -> &str {
	let base = type_name.split('<').next().unwrap_or(type_name);
	base.rsplit("::").next().unwrap_or(base)
}

fn aggregate_of<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AggregateError> {
	if let Some(aggregate) = err.downcast_ref::<AggregateError>() {
		return Some(aggregate);
	}
	err.downcast_ref::<LogbookError>()
		.and_then(LogbookError::aggregate)
}

impl LogFormatter for ErrorFormatter {
	fn name(&self) -> &str {
		Self::NAME
	}

	fn type_matcher(&self) -> &TypeMatcher {
		&self.matcher
	}

	fn render(&self, data: &dyn CustomData) -> Result<String, FormatError> {
		let err = data.as_error().ok_or_else(|| FormatError::UnsupportedData {
			formatter: Self::NAME.to_string(),
			type_name: data.type_name().to_string(),
		})?;

		let mut out = String::new();
		let _ = writeln!(out, "[{}]: {}", short_type_name(data.type_name()), err);

		if let Some(aggregate) = aggregate_of(err) {
			let total = aggregate.len();
			for (i, inner) in aggregate.errors().iter().enumerate() {
				let _ = writeln!(out, "\n[{} of {}]: {}", i + 1, total, inner);
			}
		}

		let mut source = err.source();
		while let Some(inner) = source {
			let _ = writeln!(out, "\n[caused by]: {inner}");
			source = inner.source();
		}

		let _ = write!(out, "\nComplete stack trace:\n");
		if let Some(backtrace) = data.backtrace() {
			let _ = write!(out, "{backtrace}");
		}

		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_logbook_core::{ErrorData, Json, LogEntry, SinkError};

	#[derive(Debug, thiserror::Error)]
	#[error("outer failure")]
	struct Outer {
		#[source]
		inner: std::io::Error,
	}

	#[test]
	fn matches_errors_only() {
		let formatter = ErrorFormatter::new();
		assert!(formatter.is_valid_formatter_for(Some(&ErrorData::new(std::io::Error::other("x")))));
		assert!(formatter.is_valid_formatter_for(Some(&ErrorData::from_boxed("x".into()))));
		assert!(!formatter.is_valid_formatter_for(Some(&Json("person"))));
		assert!(!formatter.is_valid_formatter_for(None));
	}

	#[test]
	fn renders_error_and_source_chain() {
		let err = Outer {
			inner: std::io::Error::other("pipe closed"),
		};
		let mut entry = LogEntry::create("T", "M");
		ErrorFormatter::new()
			.format(&mut entry, &ErrorData::new(err))
			.unwrap();

		let payload = entry.custom_data().unwrap();
		assert!(payload.data.starts_with("[Outer]: outer failure\n"));
		assert!(payload.data.contains("[caused by]: pipe closed"));
		assert!(payload.data.contains("Complete stack trace:"));
		assert_eq!(payload.formatter, ErrorFormatter::NAME);
	}

	#[test]
	fn renders_aggregate_members() {
		let aggregate = AggregateError::new(
			"unhandled errors occurred in one or more log writers",
			vec![
				SinkError::Transient("first".to_string()),
				SinkError::Permanent("second".to_string()),
			],
		);
		let rendered = ErrorFormatter::new()
			.render(&ErrorData::new(LogbookError::from(aggregate)))
			.unwrap();

		assert!(rendered.starts_with("[LogbookError]: unhandled errors occurred"));
		assert!(rendered.contains("[1 of 2]: transient error: first"));
		assert!(rendered.contains("[2 of 2]: permanent error: second"));
	}

	#[test]
	fn rejects_non_error_data() {
		let err = ErrorFormatter::new().render(&Json(1u8)).unwrap_err();
		assert!(matches!(err, FormatError::UnsupportedData { .. }));
	}

	#[test]
	fn short_type_names() {
		assert_eq!(short_type_name("std::io::error::Error"), "Error");
		assert_eq!(short_type_name("a::b::Wrapper<c::D>"), "Wrapper");
		assert_eq!(short_type_name("plain"), "plain");
	}
}
