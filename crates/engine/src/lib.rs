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

//! Retrace Engine - stepping through a recorded execution trace.
//!
//! Source text and a trace are analyzed once when a [`Session`] starts
//! ([`scope`] and [`depth`]); afterwards every action is a bounded scan over
//! the trace ([`stepping`], [`occurrence`]) driven by the session.

pub mod command;
pub use command::*;

pub mod config;
pub use config::*;

pub mod depth;
pub use depth::*;

pub mod error;
pub use error::*;

pub mod occurrence;

pub mod rpc;
pub use rpc::*;

pub mod scope;
pub use scope::*;

pub mod session;
pub use session::*;

pub mod stepping;
pub use stepping::*;
