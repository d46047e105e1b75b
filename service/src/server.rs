//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Policy server implementation
//!
//! The PolicyServer binds the configured address and runs the accept loop.
//! Every accepted connection is served by its own [`Session`] task; sessions
//! share nothing with each other or with the accept loop.

use crate::{
    PolicyError, PolicyHandler, PolicyListener, Result, ServeContext, ServerConfig, Session,
};
use metrics::counter;
use polserv_codec::ConnectionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, debug, error, info, instrument, warn};

/// Delay before accepting again after a failed accept
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Postfix policy server
///
/// # Example
///
/// ```no_run
/// use polserv_service::{PolicyRecord, PolicyResponse, PolicyServer, ServeContext, ServerConfig};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = PolicyServer::new(ServerConfig::new().with_port("10040"));
///     let ctx = ServeContext::new(CancellationToken::new());
///
///     let handler = |record: PolicyRecord| {
///         if record.sender.ends_with("@spam.example") {
///             PolicyResponse::reject()
///         } else {
///             PolicyResponse::dunno()
///         }
///     };
///
///     server.run(ctx, Arc::new(handler)).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PolicyServer {
    config: ServerConfig,
}

impl PolicyServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until `ctx` is cancelled.
    ///
    /// Configuration and bind failures are returned immediately; the bind is
    /// not retried.
    pub async fn run(&self, ctx: ServeContext, handler: Arc<dyn PolicyHandler>) -> Result<()> {
        let listener = self.bind().await?;
        serve(listener, &self.config, ctx, handler).await
    }

    /// Validate the configuration and bind the listening socket.
    pub async fn bind(&self) -> Result<TcpListener> {
        self.config.validate()?;

        let address = self.config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| PolicyError::Bind {
                address: address.clone(),
                source,
            })?;

        match listener.local_addr() {
            Ok(local) => info!("Policy server bound to {}", local),
            Err(_) => info!("Policy server bound to {}", address),
        }
        Ok(listener)
    }
}

/// Serve policy clients from an already bound listener until `ctx` is
/// cancelled.
///
/// On cancellation the listener is closed, sessions are asked to stop, and
/// this waits up to `config.shutdown_timeout` for them to finish. Accept
/// failures and session errors are logged (unless the context is quiet) and
/// never end the loop.
#[instrument(skip_all, fields(local_addr = ?listener.local_addr()))]
pub async fn serve<L>(
    mut listener: L,
    config: &ServerConfig,
    ctx: ServeContext,
    handler: Arc<dyn PolicyHandler>,
) -> Result<()>
where
    L: PolicyListener,
{
    config.validate_session()?;

    let tracker = TaskTracker::new();
    let mut next_id: u64 = 0;

    info!("Accepting policy connections");
    loop {
        let accepted = tokio::select! {
            biased;
            _ = ctx.token().cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer_addr)) => {
                next_id += 1;
                let id = ConnectionId::new(next_id);
                let conn = ctx.connection(id, peer_addr);
                debug!(connection_id = %id, peer = ?peer_addr, "Accepted connection");

                let quiet = conn.quiet;
                let session = Session::new(stream, handler.clone(), conn, config);
                tracker.spawn(
                    async move {
                        if let Err(e) = session.run().await {
                            if !quiet {
                                warn!(connection_id = %id, error = %e, "Session terminated with error");
                            }
                        }
                    }
                    .in_current_span(),
                );
            }
            Err(e) => {
                counter!("polserv.errors.accept").increment(1);
                if ctx.is_cancelled() {
                    break;
                }
                if !ctx.is_quiet() {
                    error!(error = %e, "Failed to accept connection");
                }

                // Back off on errors to avoid tight loop
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }

    drop(listener);
    tracker.close();
    info!(sessions = tracker.len(), "Shutting down policy server");

    if tokio::time::timeout(config.shutdown_timeout, tracker.wait())
        .await
        .is_err()
        && !ctx.is_quiet()
    {
        warn!(
            sessions = tracker.len(),
            "Sessions still running after shutdown timeout"
        );
    }

    info!("Policy server shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticHandler;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_server_lifecycle() {
        let config = ServerConfig::new().with_address("127.0.0.1").with_port("0");
        let server = PolicyServer::new(config);
        let ctx = ServeContext::new(CancellationToken::new()).quiet(true);

        let task = {
            let ctx = ctx.clone();
            tokio::spawn(async move { server.run(ctx, Arc::new(StaticHandler::default())).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        ctx.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_session_errors_are_logged() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = ServerConfig::new().with_max_line_length(Some(16));
        let ctx = ServeContext::new(CancellationToken::new());

        let serve_ctx = ctx.clone();
        let task = tokio::spawn(
            async move {
                serve(listener, &config, serve_ctx, Arc::new(StaticHandler::default())).await
            }
            .in_current_span(),
        );

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(b"request=smtpd_access_policy\n\n")
            .await
            .unwrap();
        let mut rest = Vec::new();
        let _ = client.read_to_end(&mut rest).await;

        ctx.cancel();
        task.await.unwrap().unwrap();
        assert!(logs_contain("Session terminated with error"));
    }

    #[tokio::test]
    async fn test_serve_ignores_listen_address() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig::new().with_address("").with_port("not-a-port");
        let ctx = ServeContext::new(CancellationToken::new()).quiet(true);

        let serve_ctx = ctx.clone();
        let task = tokio::spawn(async move {
            serve(listener, &config, serve_ctx, Arc::new(StaticHandler::default())).await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        ctx.cancel();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_serve_rejects_invalid_session_settings() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig::new().with_write_timeout(Duration::ZERO);
        let ctx = ServeContext::new(CancellationToken::new());
        let err = serve(listener, &config, ctx, Arc::new(StaticHandler::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_server_rejects_invalid_port() {
        let server = PolicyServer::new(ServerConfig::new().with_port("99999"));
        let ctx = ServeContext::new(CancellationToken::new());
        let err = server
            .run(ctx, Arc::new(StaticHandler::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPort(_)));
        assert!(err.is_startup_error());
    }
}
