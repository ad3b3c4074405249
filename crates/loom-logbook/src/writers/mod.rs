// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod file;
mod memory;
mod tracing;

pub use self::file::FileLogWriter;
pub use self::memory::MemoryLogWriter;
pub use self::tracing::TracingLogWriter;
