// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Loom logbook.
//!
//! This crate holds the data model and the contracts that collaborators
//! implement. The dispatcher itself lives in `loom-logbook`.
//!
//! - [`LogEntry`]: a single log record with optional formatted payload
//! - [`LogEntryFilter`]: predicate gating collaborator participation
//! - [`LogFormatter`]: type-directed rendering of custom data
//! - [`LogWriter`], [`LogSubscriber`], [`LogReader`]: collaborator contracts

pub mod custom_data;
pub mod defaults;
pub mod entry;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod reader;
pub mod subscriber;
pub mod writer;

pub use custom_data::{CustomData, ErrorData, Json, ERROR_TYPE, OBJECT_TYPE};
pub use entry::{CustomDataPayload, LogEntry, LogSeverity};
pub use error::{panic_message, AggregateError, FormatError, SinkError, SinkResult};
pub use filter::{LogEntryFilter, StringComparison};
pub use formatter::{parse_custom_data_as, LogFormatter, TypeMatcher};
pub use reader::{collect_matching, LogReader};
pub use subscriber::LogSubscriber;
pub use writer::LogWriter;
