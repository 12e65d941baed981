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

//! JSON-RPC server for remote control of a debugging session.
//!
//! Front ends that do not link the engine drive a session over HTTP with
//! JSON-RPC 2.0. The server hosts a single session; multi-session hosting is
//! left to whatever embeds it.
//!
//! # Architecture
//!
//! - **Server** ([`server`]) - Axum HTTP server with `POST /` and `GET /health`
//! - **Methods** ([`methods`]) - `retrace_*` method decoding and dispatch
//! - **Types** ([`types`]) - Request/response data structures and error codes
//! - **Utils** ([`utils`]) - Port discovery and error conversion
//!
//! # Usage
//!
//! ```rust,ignore
//! use retrace_engine::{rpc::DebugRpcServer, Session};
//!
//! let handle = DebugRpcServer::new(Session::default()).start_on_port(0).await?;
//! println!("listening on {}", handle.addr());
//! ```
//!
//! # Protocol
//!
//! ```json
//! {"jsonrpc": "2.0", "id": 1, "method": "retrace_start",
//!  "params": {"source": "x = 1\ny = 2", "trace": [1, 2]}}
//! {"jsonrpc": "2.0", "id": 2, "method": "retrace_step"}
//! ```

pub mod methods;
pub mod server;
pub mod types;
pub mod utils;

pub use server::*;
pub use types::*;
