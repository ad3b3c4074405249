// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entry filters used by writers, subscribers and readers.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::entry::{LogEntry, LogSeverity};

type Predicate = Arc<dyn Fn(&LogEntry) -> bool + Send + Sync>;

/// String equality used when matching sources and areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringComparison {
	Ordinal,
	#[default]
	OrdinalIgnoreCase,
}

impl StringComparison {
	pub fn equals(self, a: &str, b: &str) -> bool {
		match self {
			StringComparison::Ordinal => a == b,
			StringComparison::OrdinalIgnoreCase => {
				a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
			}
		}
	}
}

/// A predicate over [`LogEntry`].
///
/// A filter is either declarative (allow-lists plus an inclusive date range)
/// or driven by an explicit predicate. An unset allow-list places no
/// restriction on its dimension. Setting a predicate clears the declarative
/// fields, and setting any declarative field clears the predicate. The
/// default filter matches everything.
#[derive(Clone, Default)]
pub struct LogEntryFilter {
	predicate: Option<Predicate>,
	sources: Option<Vec<String>>,
	areas: Option<Vec<String>>,
	severities: Option<Vec<LogSeverity>>,
	from: Option<DateTime<FixedOffset>>,
	to: Option<DateTime<FixedOffset>>,
	comparison: StringComparison,
}

impl LogEntryFilter {
	/// A filter that matches every entry.
	pub fn all() -> Self {
		Self::default()
	}

	pub fn from_predicate<F>(predicate: F) -> Self
	where
		F: Fn(&LogEntry) -> bool + Send + Sync + 'static,
	{
		let mut filter = Self::default();
		filter.set_predicate(predicate);
		filter
	}

	pub fn with_sources<I, S>(mut self, sources: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.set_sources(Some(sources.into_iter().map(Into::into).collect()));
		self
	}

	pub fn with_areas<I, S>(mut self, areas: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.set_areas(Some(areas.into_iter().map(Into::into).collect()));
		self
	}

	pub fn with_severities(mut self, severities: impl IntoIterator<Item = LogSeverity>) -> Self {
		self.set_severities(Some(severities.into_iter().collect()));
		self
	}

	/// Restrict to entries created within `[from, to]`. Either bound may be open.
	pub fn with_date_range(
		mut self,
		from: Option<DateTime<FixedOffset>>,
		to: Option<DateTime<FixedOffset>>,
	) -> Self {
		self.set_date_range(from, to);
		self
	}

	pub fn with_comparison(mut self, comparison: StringComparison) -> Self {
		self.comparison = comparison;
		self
	}

	pub fn set_predicate<F>(&mut self, predicate: F)
	where
		F: Fn(&LogEntry) -> bool + Send + Sync + 'static,
	{
		self.predicate = Some(Arc::new(predicate));
		self.sources = None;
		self.areas = None;
		self.severities = None;
		self.from = None;
		self.to = None;
	}

	pub fn set_sources(&mut self, sources: Option<Vec<String>>) {
		self.sources = sources;
		self.predicate = None;
	}

	pub fn set_areas(&mut self, areas: Option<Vec<String>>) {
		self.areas = areas;
		self.predicate = None;
	}

	pub fn set_severities(&mut self, severities: Option<Vec<LogSeverity>>) {
		self.severities = severities;
		self.predicate = None;
	}

	pub fn set_date_range(
		&mut self,
		from: Option<DateTime<FixedOffset>>,
		to: Option<DateTime<FixedOffset>>,
	) {
		self.from = from;
		self.to = to;
		self.predicate = None;
	}

	pub fn has_predicate(&self) -> bool {
		self.predicate.is_some()
	}

	pub fn sources(&self) -> Option<&[String]> {
		self.sources.as_deref()
	}

	pub fn areas(&self) -> Option<&[String]> {
		self.areas.as_deref()
	}

	pub fn severities(&self) -> Option<&[LogSeverity]> {
		self.severities.as_deref()
	}

	pub fn comparison(&self) -> StringComparison {
		self.comparison
	}

	pub fn is_match(&self, entry: &LogEntry) -> bool {
		if let Some(predicate) = &self.predicate {
			return predicate(entry);
		}

		self.source_matches(entry)
			&& self.area_matches(entry)
			&& self.severity_matches(entry)
			&& self.date_matches(entry)
	}

	fn source_matches(&self, entry: &LogEntry) -> bool {
		allow_list_contains(self.sources.as_deref(), entry.source.as_deref(), self.comparison)
	}

	fn area_matches(&self, entry: &LogEntry) -> bool {
		allow_list_contains(self.areas.as_deref(), entry.area.as_deref(), self.comparison)
	}

	fn severity_matches(&self, entry: &LogEntry) -> bool {
		self
			.severities
			.as_ref()
			.is_none_or(|list| list.contains(&entry.severity))
	}

	fn date_matches(&self, entry: &LogEntry) -> bool {
		let created_on = entry.created_on();
		self.from.is_none_or(|from| created_on >= from) && self.to.is_none_or(|to| created_on <= to)
	}
}

fn allow_list_contains(
	list: Option<&[String]>,
	value: Option<&str>,
	comparison: StringComparison,
) -> bool {
	match (list, value) {
		(None, _) => true,
		(Some(list), Some(value)) => list.iter().any(|item| comparison.equals(item, value)),
		(Some(_), None) => false,
	}
}

impl fmt::Debug for LogEntryFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LogEntryFilter")
			.field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
			.field("sources", &self.sources)
			.field("areas", &self.areas)
			.field("severities", &self.severities)
			.field("from", &self.from)
			.field("to", &self.to)
			.field("comparison", &self.comparison)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use proptest::prelude::*;

	#[test]
	fn default_matches_everything() {
		let filter = LogEntryFilter::default();
		assert!(filter.is_match(&LogEntry::create("T", "M")));
		assert!(filter.is_match(&LogEntry::verbose("s", "a")));
		assert!(filter.is_match(&LogEntry::new()));
	}

	#[test]
	fn sources_are_case_insensitive_by_default() {
		let filter = LogEntryFilter::all().with_sources(["Application"]);
		let entry = LogEntry::create("T", "M").with_source("APPLICATION");
		assert!(filter.is_match(&entry));
	}

	#[test]
	fn ordinal_comparison_is_case_sensitive() {
		let filter = LogEntryFilter::all()
			.with_sources(["Application"])
			.with_comparison(StringComparison::Ordinal);
		assert!(!filter.is_match(&LogEntry::create("T", "M").with_source("application")));
		assert!(filter.is_match(&LogEntry::create("T", "M").with_source("Application")));
	}

	#[test]
	fn string_comparison_equals() {
		assert!(StringComparison::Ordinal.equals("Api", "Api"));
		assert!(!StringComparison::Ordinal.equals("Api", "API"));
		assert!(StringComparison::OrdinalIgnoreCase.equals("Api", "API"));
		assert!(!StringComparison::OrdinalIgnoreCase.equals("Api", "Web"));
		assert_ne!(StringComparison::Ordinal, StringComparison::OrdinalIgnoreCase);
	}

	#[test]
	fn missing_source_does_not_match_allow_list() {
		let filter = LogEntryFilter::all().with_sources(["Application"]);
		assert!(!filter.is_match(&LogEntry::create("T", "M")));
	}

	#[test]
	fn severity_allow_list() {
		let filter = LogEntryFilter::all().with_severities([LogSeverity::Error, LogSeverity::Critical]);
		assert!(filter.is_match(&LogEntry::error("t", "m", "s", "a")));
		assert!(!filter.is_match(&LogEntry::warning("t", "m", "s", "a")));
	}

	#[test]
	fn date_range_is_inclusive() {
		let entry = LogEntry::create("T", "M");
		let at = entry.created_on();
		let exact = LogEntryFilter::all().with_date_range(Some(at), Some(at));
		assert!(exact.is_match(&entry));

		let later = LogEntryFilter::all().with_date_range(Some(at + Duration::seconds(1)), None);
		assert!(!later.is_match(&entry));

		let earlier = LogEntryFilter::all().with_date_range(None, Some(at - Duration::seconds(1)));
		assert!(!earlier.is_match(&entry));
	}

	#[test]
	fn predicate_takes_precedence_and_clears_declarative() {
		let mut filter = LogEntryFilter::all().with_sources(["nope"]);
		filter.set_predicate(|e| e.title.as_deref() == Some("T"));
		assert!(filter.has_predicate());
		assert!(filter.sources().is_none());
		assert!(filter.is_match(&LogEntry::create("T", "M").with_source("other")));
		assert!(!filter.is_match(&LogEntry::create("X", "M")));
	}

	#[test]
	fn declarative_setter_clears_predicate() {
		let mut filter = LogEntryFilter::from_predicate(|_| false);
		filter.set_areas(Some(vec!["Area".to_string()]));
		assert!(!filter.has_predicate());
		assert!(filter.is_match(&LogEntry::create("T", "M").with_area("area")));
	}

	#[test]
	fn comparison_survives_mode_switch() {
		let mut filter = LogEntryFilter::all().with_comparison(StringComparison::Ordinal);
		filter.set_predicate(|_| true);
		filter.set_sources(Some(vec!["A".to_string()]));
		assert_eq!(filter.comparison(), StringComparison::Ordinal);
	}

	fn severity_strategy() -> impl Strategy<Value = LogSeverity> {
		prop::sample::select(LogSeverity::all().to_vec())
	}

	fn name_strategy() -> impl Strategy<Value = Option<String>> {
		prop::option::of(prop::sample::select(vec![
			"app".to_string(),
			"App".to_string(),
			"web".to_string(),
			"db".to_string(),
		]))
	}

	proptest! {
		#[test]
		fn declarative_filter_is_conjunction_of_dimensions(
			source in name_strategy(),
			area in name_strategy(),
			severity in severity_strategy(),
			sources in prop::option::of(prop::collection::vec("[a-zA-Z]{1,4}", 0..4)),
			areas in prop::option::of(prop::collection::vec("[a-zA-Z]{1,4}", 0..4)),
			severities in prop::option::of(prop::collection::vec(severity_strategy(), 0..5)),
			from_offset in prop::option::of(-5i64..5),
			to_offset in prop::option::of(-5i64..5),
		) {
			let mut entry = LogEntry::new().with_severity(severity);
			entry.source = source.clone();
			entry.area = area.clone();
			let now = entry.created_on();

			let from = from_offset.map(|s| now + Duration::seconds(s));
			let to = to_offset.map(|s| now + Duration::seconds(s));

			let mut filter = LogEntryFilter::all();
			filter.set_sources(sources.clone());
			filter.set_areas(areas.clone());
			filter.set_severities(severities.clone());
			filter.set_date_range(from, to);

			let ci = |list: &Option<Vec<String>>, value: &Option<String>| match (list, value) {
				(None, _) => true,
				(Some(list), Some(v)) => list.iter().any(|x| x.to_lowercase() == v.to_lowercase()),
				(Some(_), None) => false,
			};
			let source_ok = ci(&sources, &source);
			let area_ok = ci(&areas, &area);
			let severity_ok = severities.as_ref().is_none_or(|l| l.contains(&severity));
			let date_ok = from.is_none_or(|f| now >= f) && to.is_none_or(|t| now <= t);

			prop_assert_eq!(filter.is_match(&entry), source_ok && area_ok && severity_ok && date_ok);
		}

		#[test]
		fn predicate_filter_ignores_declarative_state(title in "[a-z]{0,6}") {
			let expected = title.len() % 2 == 0;
			let mut filter = LogEntryFilter::all().with_sources(["never"]);
			filter.set_predicate(|e| e.title.as_deref().map(|t| t.len() % 2 == 0).unwrap_or(false));
			let entry = LogEntry::new().with_title(title);
			prop_assert_eq!(filter.is_match(&entry), expected);
		}
	}
}
