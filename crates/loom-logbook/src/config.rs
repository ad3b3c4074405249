// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered logbook configuration: defaults, a TOML file, then environment
//! variables.
//!
//! Environment convention: `LOOM_LOGBOOK_<FIELD>`.

use std::path::PathBuf;
use std::time::Duration;

use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::emergency::{EmergencyLog, EmergencyLogSetting};
use crate::error::{LogbookError, Result};
use crate::lazy::LazyWriterConfig;
use crate::logbook::{DispatchMode, Logbook, LogbookBuilder};

pub const DEFAULT_LAZY_WRITE_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_EMERGENCY_LOG_FILE: &str = "emergency.log";
pub const SYSTEM_CONFIG_PATH: &str = "/etc/loom/logbook.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LogbookConfigLayer {
	pub emergency_log_setting: Option<EmergencyLogSetting>,
	pub emergency_log_dir: Option<PathBuf>,
	pub emergency_log_file: Option<String>,
	pub lazy_write_interval_ms: Option<u64>,
	pub lazy_auto_flush: Option<bool>,
	pub sync_dispatch: Option<DispatchMode>,
}

impl LogbookConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.emergency_log_setting.is_some() {
			self.emergency_log_setting = other.emergency_log_setting;
		}
		if other.emergency_log_dir.is_some() {
			self.emergency_log_dir = other.emergency_log_dir;
		}
		if other.emergency_log_file.is_some() {
			self.emergency_log_file = other.emergency_log_file;
		}
		if other.lazy_write_interval_ms.is_some() {
			self.lazy_write_interval_ms = other.lazy_write_interval_ms;
		}
		if other.lazy_auto_flush.is_some() {
			self.lazy_auto_flush = other.lazy_auto_flush;
		}
		if other.sync_dispatch.is_some() {
			self.sync_dispatch = other.sync_dispatch;
		}
	}

	pub fn finalize(self) -> LogbookConfig {
		LogbookConfig {
			emergency_log_setting: self.emergency_log_setting.unwrap_or_default(),
			emergency_log_dir: self.emergency_log_dir,
			emergency_log_file: self
				.emergency_log_file
				.unwrap_or_else(|| DEFAULT_EMERGENCY_LOG_FILE.to_string()),
			lazy_write_interval_ms: self
				.lazy_write_interval_ms
				.unwrap_or(DEFAULT_LAZY_WRITE_INTERVAL_MS),
			lazy_auto_flush: self.lazy_auto_flush.unwrap_or(false),
			sync_dispatch: self.sync_dispatch.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogbookConfig {
	pub emergency_log_setting: EmergencyLogSetting,
	/// When set, [`LogbookConfig::apply`] sets up a file-backed emergency log.
	pub emergency_log_dir: Option<PathBuf>,
	pub emergency_log_file: String,
	pub lazy_write_interval_ms: u64,
	pub lazy_auto_flush: bool,
	/// Fan-out mode of the synchronous write path.
	pub sync_dispatch: DispatchMode,
}

impl Default for LogbookConfig {
	fn default() -> Self {
		LogbookConfigLayer::default().finalize()
	}
}

impl LogbookConfig {
	pub fn lazy_writer(&self) -> LazyWriterConfig {
		LazyWriterConfig {
			interval: Duration::from_millis(self.lazy_write_interval_ms),
			auto_flush: self.lazy_auto_flush,
		}
	}

	/// A builder with the configured dispatch mode.
	pub fn logbook_builder(&self) -> LogbookBuilder {
		Logbook::builder().dispatch_mode(self.sync_dispatch)
	}

	/// Install the emergency log setting and, when a directory is
	/// configured, a file-backed emergency log. Returns the emergency log
	/// file path if one was set up.
	pub fn apply(&self, emergency: &EmergencyLog) -> Result<Option<PathBuf>> {
		emergency.set_setting(self.emergency_log_setting);
		info!(setting = ?self.emergency_log_setting, "emergency log setting applied");

		match &self.emergency_log_dir {
			Some(dir) => emergency.setup_file(dir, &self.emergency_log_file).map(Some),
			None => Ok(None),
		}
	}
}

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LogbookConfigLayer>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LogbookConfigLayer> {
		debug!("loading defaults");
		Ok(LogbookConfigLayer::default())
	}
}

/// TOML file source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(SYSTEM_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LogbookConfigLayer> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LogbookConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| LogbookError::ConfigRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LogbookConfigLayer =
			toml::from_str(&content).map_err(|e| LogbookError::ConfigParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed logbook config layer from TOML");
		Ok(layer)
	}
}

pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LogbookConfigLayer> {
		debug!("loading environment variables");
		layer_from(|name| std::env::var(name).ok())
	}
}

fn layer_from(lookup: impl Fn(&str) -> Option<String>) -> Result<LogbookConfigLayer> {
	let var = |name: &str| lookup(name).filter(|s| !s.is_empty());

	Ok(LogbookConfigLayer {
		emergency_log_setting: parse_enum(
			"LOOM_LOGBOOK_EMERGENCY_LOG_SETTING",
			var("LOOM_LOGBOOK_EMERGENCY_LOG_SETTING"),
		)?,
		emergency_log_dir: var("LOOM_LOGBOOK_EMERGENCY_LOG_DIR").map(PathBuf::from),
		emergency_log_file: var("LOOM_LOGBOOK_EMERGENCY_LOG_FILE"),
		lazy_write_interval_ms: parse_u64(
			"LOOM_LOGBOOK_LAZY_WRITE_INTERVAL_MS",
			var("LOOM_LOGBOOK_LAZY_WRITE_INTERVAL_MS"),
		)?,
		lazy_auto_flush: var("LOOM_LOGBOOK_LAZY_AUTO_FLUSH")
			.map(|v| v.eq_ignore_ascii_case("true") || v == "1"),
		sync_dispatch: parse_enum("LOOM_LOGBOOK_SYNC_DISPATCH", var("LOOM_LOGBOOK_SYNC_DISPATCH"))?,
	})
}

fn parse_u64(key: &str, value: Option<String>) -> Result<Option<u64>> {
	match value {
		Some(v) => v.parse().map(Some).map_err(|_| LogbookError::InvalidConfig {
			key: key.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn parse_enum<T: DeserializeOwned>(key: &str, value: Option<String>) -> Result<Option<T>> {
	let Some(v) = value else {
		return Ok(None);
	};
	let normalized = v.to_ascii_lowercase();
	let deserializer: StrDeserializer<'_, ValueError> = normalized.as_str().into_deserializer();
	T::deserialize(deserializer)
		.map(Some)
		.map_err(|e| LogbookError::InvalidConfig {
			key: key.to_string(),
			message: e.to_string(),
		})
}

fn load_from(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<LogbookConfig> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LogbookConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading logbook configuration source");
		merged.merge(source.load()?);
	}
	Ok(merged.finalize())
}

/// Load configuration from defaults, the system config file and the
/// environment.
pub fn load_config() -> Result<LogbookConfig> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(config_path: impl Into<PathBuf>) -> Result<LogbookConfig> {
	load_from(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}
