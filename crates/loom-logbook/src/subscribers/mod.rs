// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod broadcast;
mod json_file;

pub use broadcast::{BroadcastSubscriber, ReceivedEntry, DEFAULT_CHANNEL_CAPACITY};
pub use json_file::JsonFileSubscriber;
