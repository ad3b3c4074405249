// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Structured log dispatcher.
//!
//! A [`Logbook`] formats custom data attached to a [`LogEntry`], fans the
//! entry out to every matching [`LogWriter`] and then notifies matching
//! [`LogSubscriber`]s. Collaborator failures are aggregated and routed
//! through the [`EmergencyLogSetting`] of the bound [`EmergencyLog`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use loom_logbook::{ErrorFormatter, JsonFormatter, LogEntry, Logbook, MemoryLogWriter};
//!
//! let logbook = Logbook::builder()
//! 	.formatter(Arc::new(ErrorFormatter::new()))
//! 	.formatter(Arc::new(JsonFormatter::new()))
//! 	.writer(Arc::new(MemoryLogWriter::new()))
//! 	.build()?;
//! logbook.write_entry(&mut LogEntry::create("Started", "service is up"))?;
//! # Ok::<(), loom_logbook::LogbookError>(())
//! ```

pub mod config;
pub mod emergency;
pub mod error;
pub mod formatters;
pub mod lazy;
pub mod logbook;
pub mod subscribers;
pub mod writers;

pub use config::{
	load_config, load_config_with_file, ConfigSource, DefaultsSource, EnvSource, LogbookConfig,
	LogbookConfigLayer, Precedence, TomlSource,
};
pub use emergency::{EmergencyLog, EmergencyLogSetting};
pub use error::{CollaboratorKind, LogbookError, Result};
pub use formatters::{ErrorFormatter, JsonFormatter};
pub use lazy::{LazyWriter, LazyWriterConfig, DEFAULT_LAZY_WRITE_INTERVAL};
pub use logbook::{DispatchMode, Logbook, LogbookBuilder};
pub use subscribers::{BroadcastSubscriber, JsonFileSubscriber, ReceivedEntry};
pub use writers::{FileLogWriter, MemoryLogWriter, TracingLogWriter};

pub use loom_logbook_core::{
	defaults, AggregateError, CustomData, CustomDataPayload, ErrorData, FormatError, Json,
	LogEntry, LogEntryFilter, LogFormatter, LogReader, LogSeverity, LogSubscriber, LogWriter,
	SinkError, SinkResult, StringComparison, TypeMatcher, ERROR_TYPE, OBJECT_TYPE,
};
