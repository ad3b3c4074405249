// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::any::Any;
use std::collections::HashMap;

use loom_logbook_core::{CustomData, FormatError, LogEntry, LogFormatter, TypeMatcher, OBJECT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

type Parser = Box<dyn Fn(&str) -> Result<Box<dyn Any + Send>, serde_json::Error> + Send + Sync>;

/// Renders any custom data as JSON.
///
/// Parse-back is supported for types registered with
/// [`JsonFormatter::register`]. When `throw_on_error` is off, a value that
/// fails to serialize is replaced by a JSON document describing the failure.
pub struct JsonFormatter {
	matcher: TypeMatcher,
	indent: bool,
	throw_on_error: bool,
	parsers: HashMap<String, Parser>,
}

impl JsonFormatter {
	pub const NAME: &'static str = "json";

	pub fn new() -> Self {
		Self {
			matcher: TypeMatcher::with_subtypes([OBJECT_TYPE]),
			indent: false,
			throw_on_error: false,
			parsers: HashMap::new(),
		}
	}

	/// Restrict the formatter to the given type names.
	pub fn with_matcher(mut self, matcher: TypeMatcher) -> Self {
		self.matcher = matcher;
		self
	}

	pub fn with_indent(mut self, indent: bool) -> Self {
		self.indent = indent;
		self
	}

	pub fn with_throw_on_error(mut self, throw_on_error: bool) -> Self {
		self.throw_on_error = throw_on_error;
		self
	}

	/// Allow payloads rendered from a `T` to be parsed back.
	pub fn register<T>(mut self) -> Self
	where
		T: DeserializeOwned + Send + 'static,
	{
		let parser: Parser = Box::new(|data: &str| -> Result<Box<dyn Any + Send>, serde_json::Error> {
			let value: T = serde_json::from_str(data)?;
			Ok(Box::new(value))
		});
		self.parsers.insert(std::any::type_name::<T>().to_string(), parser);
		self
	}

	fn serialize(&self, data: &dyn CustomData) -> Result<String, serde_json::Error> {
		let value = data.to_json()?;
		if self.indent {
			serde_json::to_string_pretty(&value)
		} else {
			serde_json::to_string(&value)
		}
	}
}

impl Default for JsonFormatter {
	fn default() -> Self {
		Self::new()
	}
}

impl LogFormatter for JsonFormatter {
	fn name(&self) -> &str {
		Self::NAME
	}

	fn type_matcher(&self) -> &TypeMatcher {
		&self.matcher
	}

	fn render(&self, data: &dyn CustomData) -> Result<String, FormatError> {
		match self.serialize(data) {
			Ok(rendered) => Ok(rendered),
			Err(e) if self.throw_on_error => Err(FormatError::Serialization(e)),
			Err(e) => {
				debug!(type_name = data.type_name(), error = %e, "substituting serialization failure");
				Ok(json!({
					"serialization_error": e.to_string(),
					"type": data.type_name(),
				})
				.to_string())
			}
		}
	}

	fn try_parse_custom_data(&self, entry: &LogEntry) -> Option<Box<dyn Any + Send>> {
		let payload = entry.custom_data()?;
		let parser = self.parsers.get(&payload.type_name)?;
		parser(&payload.data).ok()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_logbook_core::{parse_custom_data_as, Json};
	use serde::{Deserialize, Serialize};
	use std::collections::BTreeMap;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Person {
		name: String,
		age: u32,
		tags: Vec<String>,
	}

	fn person() -> Person {
		Person {
			name: "Ada".to_string(),
			age: 36,
			tags: vec!["math".to_string()],
		}
	}

	#[test]
	fn round_trips_registered_type() {
		let formatter = JsonFormatter::new().register::<Person>();
		let mut entry = LogEntry::create("T", "M");
		formatter.format(&mut entry, &Json(person())).unwrap();

		assert_eq!(entry.custom_data().unwrap().formatter, JsonFormatter::NAME);
		assert_eq!(parse_custom_data_as::<Person>(&formatter, &entry), Some(person()));
	}

	#[test]
	fn parse_back_fails_softly() {
		let formatter = JsonFormatter::new();
		let mut entry = LogEntry::create("T", "M");
		assert!(formatter.try_parse_custom_data(&entry).is_none());

		formatter.format(&mut entry, &Json(person())).unwrap();
		assert!(formatter.try_parse_custom_data(&entry).is_none());

		let strict = JsonFormatter::new().register::<u64>();
		let mut entry = LogEntry::create("T", "M");
		strict.format(&mut entry, &Json(person())).unwrap();
		assert!(parse_custom_data_as::<u64>(&strict, &entry).is_none());
	}

	#[test]
	fn indent_option() {
		let compact = JsonFormatter::new().render(&Json(person())).unwrap();
		let pretty = JsonFormatter::new()
			.with_indent(true)
			.render(&Json(person()))
			.unwrap();
		assert!(!compact.contains('\n'));
		assert!(pretty.contains("\n  \"name\""));
	}

	#[test]
	fn serialization_failure_is_substituted_or_raised() {
		let mut bad = BTreeMap::new();
		bad.insert((1u8, 2u8), "tuple keys are not JSON keys");

		let substituted = JsonFormatter::new().render(&Json(bad.clone())).unwrap();
		let value: serde_json::Value = serde_json::from_str(&substituted).unwrap();
		assert!(value["serialization_error"].as_str().is_some());

		let err = JsonFormatter::new()
			.with_throw_on_error(true)
			.render(&Json(bad))
			.unwrap_err();
		assert!(matches!(err, FormatError::Serialization(_)));
	}

	#[test]
	fn matches_everything_by_default() {
		let formatter = JsonFormatter::new();
		assert!(formatter.is_valid_formatter_for(Some(&Json(1u8))));
		assert!(formatter.is_valid_formatter_for(None));
	}
}
