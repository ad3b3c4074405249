// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use loom_logbook_core::{LogEntry, LogEntryFilter, LogWriter, SinkError, SinkResult};
use parking_lot::Mutex;
use uuid::Uuid;

const HEADER: &str =
	"CreatedOn;Id;Severity;Title;Source;Area;Client;ClientInfo;Message;CustomData;CustomDataFormatter\n";

const DEFAULT_FILE_NAME: &str = "Logbook.txt";

/// Appends entries as semicolon-separated lines to a file in a directory.
///
/// Each file starts with a header row. With one file per day (the default)
/// the current date is appended to the file stem, e.g. `Logbook20240305.txt`.
pub struct FileLogWriter {
	dir: PathBuf,
	stem: String,
	extension: String,
	per_day: bool,
	filter: LogEntryFilter,
	lock: Mutex<()>,
}

impl FileLogWriter {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		let mut writer = Self {
			dir: dir.into(),
			stem: String::new(),
			extension: String::new(),
			per_day: true,
			filter: LogEntryFilter::default(),
			lock: Mutex::new(()),
		};
		writer.set_file_name(DEFAULT_FILE_NAME);
		writer
	}

	/// Use `file_name` in a single file, without a date suffix.
	pub fn with_file_name(mut self, file_name: &str) -> Self {
		self.set_file_name(file_name);
		self.per_day = false;
		self
	}

	pub fn with_one_file_per_day(mut self, per_day: bool) -> Self {
		self.per_day = per_day;
		self
	}

	pub fn with_filter(mut self, filter: LogEntryFilter) -> Self {
		self.filter = filter;
		self
	}

	fn set_file_name(&mut self, file_name: &str) {
		let path = Path::new(file_name);
		self.stem = path
			.file_stem()
			.map(|s| s.to_string_lossy().into_owned())
			.unwrap_or_default();
		self.extension = path
			.extension()
			.map(|e| format!(".{}", e.to_string_lossy()))
			.unwrap_or_default();
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Path of the file entries are currently written to.
	pub fn current_path(&self) -> PathBuf {
		let suffix = if self.per_day {
			Local::now().format("%Y%m%d").to_string()
		} else {
			String::new()
		};
		self
			.dir
			.join(format!("{}{}{}", self.stem, suffix, self.extension))
	}

	fn format_line(entry: &LogEntry) -> String {
		let payload = entry.custom_data();
		let fields = [
			Some(entry.id().to_string()),
			Some(entry.severity.to_string()),
			entry.title.clone(),
			entry.source.clone(),
			entry.area.clone(),
			entry.client.clone(),
			entry.client_info.clone(),
			entry.message.clone(),
			payload.map(|p| p.data.clone()),
			payload.map(|p| p.formatter.clone()),
		];

		let mut line = entry.created_on_string();
		for field in fields {
			line.push_str(";\"");
			line.push_str(&field.unwrap_or_default().replace('"', "\"\""));
			line.push('"');
		}
		line.push('\n');
		line
	}
}

impl LogWriter for FileLogWriter {
	fn name(&self) -> &str {
		"file"
	}

	fn filter(&self) -> &LogEntryFilter {
		&self.filter
	}

	fn try_initialize(&self) -> SinkResult<()> {
		std::fs::create_dir_all(&self.dir).map_err(|e| {
			SinkError::Permanent(format!(
				"unable to create or access the path '{}': {e}",
				self.dir.display()
			))
		})?;

		let probe = self.dir.join(format!(".logbook-probe-{}", Uuid::new_v4().simple()));
		std::fs::write(&probe, "Logbook")
			.and_then(|_| std::fs::remove_file(&probe))
			.map_err(|e| {
				SinkError::Permanent(format!(
					"unable to write and/or delete the test file '{}': {e}",
					probe.display()
				))
			})
	}

	fn try_write(&self, entry: &LogEntry) -> SinkResult<()> {
		let path = self.current_path();
		let line = Self::format_line(entry);

		let _guard = self.lock.lock();
		let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
		if file.metadata()?.len() == 0 {
			file.write_all(HEADER.as_bytes())?;
		}
		file.write_all(line.as_bytes())?;
		file.flush()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use loom_logbook_core::CustomDataPayload;
	use tempfile::TempDir;

	#[test]
	fn initialize_creates_directory() {
		let root = TempDir::new().unwrap();
		let dir = root.path().join("nested/logs");
		let writer = FileLogWriter::new(&dir);
		writer.try_initialize().unwrap();
		assert!(dir.is_dir());
		assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
	}

	#[test]
	fn initialize_fails_when_path_is_a_file() {
		let root = TempDir::new().unwrap();
		let blocker = root.path().join("blocker");
		std::fs::write(&blocker, "x").unwrap();
		let writer = FileLogWriter::new(blocker.join("logs"));
		assert!(matches!(writer.try_initialize(), Err(SinkError::Permanent(_))));
	}

	#[test]
	fn writes_header_once_then_lines() {
		let root = TempDir::new().unwrap();
		let writer = FileLogWriter::new(root.path()).with_file_name("app.log");
		writer.try_initialize().unwrap();

		let mut entry = LogEntry::error("Title", "say \"hi\"", "Source", "Area");
		entry.set_custom_data(CustomDataPayload {
			data: "{}".to_string(),
			formatter: "json".to_string(),
			type_name: "object".to_string(),
		});
		writer.try_write(&entry).unwrap();
		writer.try_write(&LogEntry::create("Second", "M")).unwrap();

		let contents = std::fs::read_to_string(root.path().join("app.log")).unwrap();
		let lines: Vec<_> = contents.lines().collect();
		assert_eq!(lines.len(), 3);
		assert_eq!(format!("{}\n", lines[0]), HEADER);
		assert!(lines[1].starts_with(&entry.created_on_string()));
		assert!(lines[1].contains(&format!("\"{}\"", entry.id())));
		assert!(lines[1].contains(";\"Error\";\"Title\";\"Source\";\"Area\""));
		assert!(lines[1].contains("\"say \"\"hi\"\"\""));
		assert!(lines[1].ends_with(";\"{}\";\"json\""));
		assert!(lines[2].contains("\"Second\""));
	}

	#[test]
	fn per_day_file_name_has_date_suffix() {
		let writer = FileLogWriter::new("/var/log/app");
		let expected = format!("Logbook{}.txt", Local::now().format("%Y%m%d"));
		assert_eq!(
			writer.current_path().file_name().unwrap().to_string_lossy(),
			expected
		);

		let single = FileLogWriter::new("/var/log/app").with_file_name("emergency.log");
		assert_eq!(single.current_path(), Path::new("/var/log/app/emergency.log"));
	}
}
