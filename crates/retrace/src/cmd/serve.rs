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

//! Serving a session over JSON-RPC

use std::path::Path;

use eyre::Result;
use retrace_common::types::BreakpointSpec;
use retrace_engine::{start_debug_server, RetraceConfig};
use tracing::{error, info};

use crate::utils::start_session;

/// Start a session on the given program and serve it until Ctrl+C
pub async fn serve_trace(
    source: &Path,
    trace: &Path,
    breakpoints: &[BreakpointSpec],
    port: Option<u16>,
    config: &RetraceConfig,
) -> Result<()> {
    let session = start_session(source, trace, breakpoints, config)?;

    let mut server_config = config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }

    let handle = start_debug_server(session, &server_config).await?;
    info!("RPC server is running on {}", handle.addr());
    println!("Listening on http://{}", handle.addr());

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    // Gracefully shutdown the RPC server
    if let Err(e) = handle.shutdown() {
        error!("Failed to shutdown RPC server: {}", e);
    } else {
        info!("RPC server shut down successfully");
    }

    Ok(())
}
