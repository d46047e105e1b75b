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

//! Policy Echo Server Example
//!
//! This example demonstrates a policy server that:
//! - Listens on the default address and port (0.0.0.0:10005)
//! - Logs every attribute of every request it receives
//! - Answers `DUNNO` so Postfix carries on with its other restrictions
//!
//! ## Usage
//!
//! Run the server:
//! ```bash
//! RUST_LOG=info cargo run --example echo_server
//! ```
//!
//! Point Postfix at it in `main.cf` and reload:
//! ```text
//! smtpd_recipient_restrictions =
//!     ...
//!     reject_unauth_destination
//!     check_policy_service inet:127.0.0.1:10005
//! ```
//!
//! Or talk to it by hand:
//! ```bash
//! printf 'request=smtpd_access_policy\nsender=a@example.com\n\n' | nc 127.0.0.1 10005
//! ```

use polserv_service::{PolicyRecord, PolicyResponse, PolicyServer, ServeContext, ServerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let token = CancellationToken::new();
    let ctx = ServeContext::new(token.clone());

    // Stop on Ctrl+C
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        token.cancel();
    });

    tracing::info!("Starting policy echo server");
    let server = PolicyServer::new(ServerConfig::default());
    server.run(ctx, Arc::new(echo)).await?;

    Ok(())
}

/// Log the whole record and let Postfix decide
fn echo(record: PolicyRecord) -> PolicyResponse {
    let connection = record
        .connection_id
        .map(|id| id.to_string())
        .unwrap_or_default();

    tracing::info!(connection_id = %connection, "Received new policy request");
    for (attribute, value) in record.attributes() {
        tracing::info!(connection_id = %connection, "  {} = {}", attribute, value);
    }

    PolicyResponse::dunno()
}
