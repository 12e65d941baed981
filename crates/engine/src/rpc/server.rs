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

//! RPC server implementation
//!
//! The server hosts exactly one [`Session`]. Axum handlers share it through a
//! [`MethodHandler`], which serializes every request on the session's mutex.
//! Session operations never block, so the lock is only held for the length of
//! a single trace scan.

use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{Json as JsonExtract, State},
    response::Json as JsonResponse,
    routing::{get, post},
    Router,
};
use eyre::{Context, Result};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::{
    methods::MethodHandler,
    types::{error_codes, RpcRequest, RpcResponse},
    utils::to_rpc_error,
};
use crate::{ServerConfig, Session};

/// Handle to the running RPC server
#[derive(Debug)]
pub struct RpcServerHandle {
    /// Address the server is listening on
    pub addr: SocketAddr,
    /// Shutdown signal
    shutdown_tx: oneshot::Sender<()>,
}

impl RpcServerHandle {
    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Gracefully shutdown the RPC server
    pub fn shutdown(self) -> Result<()> {
        if self.shutdown_tx.send(()).is_err() {
            warn!("RPC server already shut down");
        }
        Ok(())
    }
}

/// Debug RPC server hosting a single session
#[derive(Debug, Clone)]
pub struct DebugRpcServer {
    /// Method handler for RPC dispatch
    method_handler: Arc<MethodHandler>,
}

impl DebugRpcServer {
    /// Create a server that takes ownership of `session`
    pub fn new(session: Session) -> Self {
        Self::with_shared_session(Arc::new(Mutex::new(session)))
    }

    /// Create a server around a session that the caller keeps access to
    pub fn with_shared_session(session: Arc<Mutex<Session>>) -> Self {
        Self { method_handler: Arc::new(MethodHandler::new(session)) }
    }

    /// The hosted session
    pub fn session(&self) -> Arc<Mutex<Session>> {
        self.method_handler.session().clone()
    }

    /// Start the RPC server on a specific localhost port (0 picks any)
    pub async fn start_on_port(self, port: u16) -> Result<RpcServerHandle> {
        self.start_on(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await
    }

    /// Start the RPC server on the address from `config`
    pub async fn start_with_config(self, config: &ServerConfig) -> Result<RpcServerHandle> {
        self.start_on(config.socket_addr()).await
    }

    /// Start the RPC server on `addr`
    pub async fn start_on(self, addr: SocketAddr) -> Result<RpcServerHandle> {
        let app = Router::new()
            .route("/", post(handle_rpc_request))
            .route("/health", get(health_check))
            .with_state(self.method_handler);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("Failed to bind RPC server to {addr}"))?;
        let actual_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await;
            match result {
                Ok(()) => info!("Debug RPC server on {} stopped", actual_addr),
                Err(e) => error!("Debug RPC server on {} failed: {}", actual_addr, e),
            }
        });

        info!("Debug RPC server started on {}", actual_addr);

        Ok(RpcServerHandle { addr: actual_addr, shutdown_tx })
    }
}

/// Handle RPC requests by dispatching onto the hosted session
async fn handle_rpc_request(
    State(handler): State<Arc<MethodHandler>>,
    JsonExtract(request): JsonExtract<RpcRequest>,
) -> JsonResponse<RpcResponse> {
    // Validate JSON-RPC version
    if request.jsonrpc != "2.0" {
        return JsonResponse(RpcResponse::failure(
            request.id,
            to_rpc_error(
                error_codes::INVALID_REQUEST,
                "Invalid Request - JSON-RPC version must be 2.0",
                None,
            ),
        ));
    }

    let response = match handler.handle_method(&request.method, request.params) {
        Ok(result) => RpcResponse::success(request.id, result),
        Err(error) => {
            warn!("RPC method {} failed: {}", request.method, error.message);
            RpcResponse::failure(request.id, error)
        }
    };

    JsonResponse(response)
}

/// Health check endpoint
async fn health_check() -> JsonResponse<serde_json::Value> {
    JsonResponse(serde_json::json!({
        "status": "healthy",
        "service": "retrace-debug-rpc-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Create and start a debug RPC server for `session` as configured
pub async fn start_debug_server(
    session: Session,
    config: &ServerConfig,
) -> Result<RpcServerHandle> {
    DebugRpcServer::new(session).start_with_config(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DebugRpcServer>();
        assert_send_sync::<Arc<MethodHandler>>();
    }
}
