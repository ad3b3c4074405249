// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Formatter contract and type matching.

use std::any::Any;

use crate::custom_data::{CustomData, OBJECT_TYPE};
use crate::entry::{CustomDataPayload, LogEntry};
use crate::error::FormatError;

/// The set of type names a formatter accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMatcher {
	targets: Vec<String>,
	match_subtypes: bool,
}

impl TypeMatcher {
	pub fn new<I, S>(targets: I, match_subtypes: bool) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			targets: targets.into_iter().map(Into::into).collect(),
			match_subtypes,
		}
	}

	/// Accepts only values whose type name is in `targets`.
	pub fn exact<I, S>(targets: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(targets, false)
	}

	/// Accepts values whose type name or any type tag is in `targets`.
	pub fn with_subtypes<I, S>(targets: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::new(targets, true)
	}

	pub fn targets(&self) -> &[String] {
		&self.targets
	}

	pub fn match_subtypes(&self) -> bool {
		self.match_subtypes
	}

	fn contains(&self, type_name: &str) -> bool {
		self.targets.iter().any(|t| t == type_name)
	}

	/// Absent data is looked up as [`OBJECT_TYPE`].
	pub fn matches(&self, data: Option<&dyn CustomData>) -> bool {
		let Some(data) = data else {
			return self.contains(OBJECT_TYPE);
		};

		if self.contains(data.type_name()) {
			return true;
		}

		if !self.match_subtypes {
			return false;
		}

		self.contains(OBJECT_TYPE) || data.type_tags().iter().any(|tag| self.contains(tag))
	}
}

/// Renders custom data into an entry's payload.
///
/// Formatters are selected by the dispatcher on a first-match basis using
/// [`LogFormatter::is_valid_formatter_for`].
pub trait LogFormatter: Send + Sync {
	/// Name stamped into [`CustomDataPayload::formatter`]. Used to find the
	/// formatter again when parsing a payload back.
	fn name(&self) -> &str;

	fn type_matcher(&self) -> &TypeMatcher;

	fn is_valid_formatter_for(&self, data: Option<&dyn CustomData>) -> bool {
		self.type_matcher().matches(data)
	}

	/// Render `data` to its payload string.
	fn render(&self, data: &dyn CustomData) -> Result<String, FormatError>;

	/// Render `data` and stamp the entry with the payload, this formatter's
	/// name and the data's type name.
	fn format(&self, entry: &mut LogEntry, data: &dyn CustomData) -> Result<(), FormatError> {
		let rendered = self.render(data)?;
		entry.set_custom_data(CustomDataPayload {
			data: rendered,
			formatter: self.name().to_string(),
			type_name: data.type_name().to_string(),
		});
		Ok(())
	}

	/// Parse a previously rendered payload back into a value.
	///
	/// Returns `None` when the entry has no payload, the type is unknown, or
	/// parsing fails.
	fn try_parse_custom_data(&self, _entry: &LogEntry) -> Option<Box<dyn Any + Send>> {
		None
	}
}

/// Parse `entry`'s payload with `formatter` and downcast it to `T`.
pub fn parse_custom_data_as<T: Any>(formatter: &dyn LogFormatter, entry: &LogEntry) -> Option<T> {
	formatter
		.try_parse_custom_data(entry)
		.and_then(|value| value.downcast::<T>().ok())
		.map(|value| *value)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::custom_data::{ErrorData, Json, ERROR_TYPE};
	use serde::Serialize;

	#[derive(Serialize)]
	struct Person {
		name: String,
	}

	#[derive(Debug, thiserror::Error)]
	#[error("bad argument: {0}")]
	struct ArgumentError(String);

	struct UpperFormatter {
		matcher: TypeMatcher,
	}

	impl LogFormatter for UpperFormatter {
		fn name(&self) -> &str {
			"upper"
		}

		fn type_matcher(&self) -> &TypeMatcher {
			&self.matcher
		}

		fn render(&self, data: &dyn CustomData) -> Result<String, FormatError> {
			Ok(data.to_json()?.to_string().to_uppercase())
		}
	}

	#[test]
	fn error_matcher_with_subtypes() {
		let matcher = TypeMatcher::with_subtypes([ERROR_TYPE]);
		let argument = ErrorData::new(ArgumentError("x".to_string()));
		let base = ErrorData::from_boxed("base".into());
		let person = Json(Person {
			name: "Ada".to_string(),
		});

		assert!(matcher.matches(Some(&argument)));
		assert!(matcher.matches(Some(&base)));
		assert!(!matcher.matches(Some(&person)));
	}

	#[test]
	fn exact_matcher_ignores_tags() {
		let matcher = TypeMatcher::exact([ERROR_TYPE]);
		let argument = ErrorData::new(ArgumentError("x".to_string()));
		let base = ErrorData::from_boxed("base".into());

		assert!(!matcher.matches(Some(&argument)));
		assert!(matcher.matches(Some(&base)));
	}

	#[test]
	fn absent_data_is_looked_up_as_object() {
		assert!(TypeMatcher::exact([OBJECT_TYPE]).matches(None));
		assert!(!TypeMatcher::with_subtypes([ERROR_TYPE]).matches(None));
	}

	#[test]
	fn object_with_subtypes_matches_everything() {
		let matcher = TypeMatcher::with_subtypes([OBJECT_TYPE]);
		assert!(matcher.matches(Some(&Json(1u8))));
		assert!(matcher.matches(Some(&ErrorData::from_boxed("e".into()))));
	}

	#[test]
	fn format_stamps_formatter_and_type() {
		let formatter = UpperFormatter {
			matcher: TypeMatcher::with_subtypes([OBJECT_TYPE]),
		};
		let mut entry = LogEntry::create("T", "M");
		formatter
			.format(&mut entry, &Json("hello".to_string()))
			.unwrap();

		let payload = entry.custom_data().unwrap();
		assert_eq!(payload.data, "\"HELLO\"");
		assert_eq!(payload.formatter, "upper");
		assert_eq!(payload.type_name, std::any::type_name::<String>());
	}

	#[test]
	fn default_parse_back_is_none() {
		let formatter = UpperFormatter {
			matcher: TypeMatcher::exact([OBJECT_TYPE]),
		};
		let entry = LogEntry::create("T", "M");
		assert!(formatter.try_parse_custom_data(&entry).is_none());
		assert!(parse_custom_data_as::<String>(&formatter, &entry).is_none());
	}
}
