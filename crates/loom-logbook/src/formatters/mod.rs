// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod error;
mod json;

pub use error::ErrorFormatter;
pub use json::JsonFormatter;
