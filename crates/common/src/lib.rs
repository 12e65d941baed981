// Retrace - Recorded Trace Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

// SPDX-License-Identifier: AGPL-3.0
//! Retrace Common - Shared functionality for retrace components
//!
//! This crate provides the pieces shared by the stepping engine and the
//! `retrace` binary: the execution trace file format, breakpoint location
//! strings, and the logging setup.

/// Common types used throughout retrace, including execution traces and breakpoint specs
pub mod types;

/// Logging setup and utilities for consistent logging across retrace components
pub mod logging;

pub use logging::*;
