// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Well-known source and area names.

/// Source names used for entries the logbook produces about itself and for
/// common application tiers.
pub mod sources {
	pub const LOGBOOK: &str = "Logbook";
	pub const APPLICATION: &str = "Application";
	pub const WEB_CLIENT: &str = "WebClient";
	pub const WEB_SERVER: &str = "WebServer";
}

/// Area names identifying which part of the pipeline raised an entry.
pub mod areas {
	pub const LOG_WRITER: &str = "LogWriter";
	pub const LOG_FORMATTER: &str = "LogFormatter";
	pub const LOG_SUBSCRIBER: &str = "LogSubscriber";
}
