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

//! Postfix Policy Server Implementation
//!
//! This crate provides an async policy delegation server for the Postfix
//! SMTP daemon (`check_policy_service`). The server accepts connections,
//! decodes request blocks into [`PolicyRecord`] values, asks a
//! [`PolicyHandler`] for a decision and writes the answer back, for as many
//! requests as the client sends on the connection.
//!
//! # Architecture
//!
//! ```text
//! PolicyServer / serve
//!     ↓
//! PolicyListener (TCP, Unix)
//!     ↓
//! Session → PolicyCodec → PolicyHandler
//! ```
//!
//! Shutdown is driven by the [`CancellationToken`] inside the
//! [`ServeContext`]: cancelling it stops the accept loop and every session.
//!
//! # Example
//!
//! ```no_run
//! use polserv_service::{PolicyResponse, PolicyServer, ServeContext, ServerConfig, StaticHandler};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let token = CancellationToken::new();
//!     let ctx = ServeContext::new(token.clone());
//!
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         token.cancel();
//!     });
//!
//!     let server = PolicyServer::new(ServerConfig::default());
//!     server
//!         .run(ctx, Arc::new(StaticHandler(PolicyResponse::dunno())))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod config;
mod context;
mod error;
mod handler;
mod listener;
mod server;
mod session;

pub use config::{DEFAULT_ADDRESS, DEFAULT_PORT, ServerConfig};
pub use context::{ConnectionContext, ServeContext};
pub use error::{PolicyError, Result};
pub use handler::{PolicyHandler, StaticHandler};
pub use listener::PolicyListener;
pub use server::{PolicyServer, serve};
pub use session::{Session, SessionState};

pub use polserv_codec::{
    Attribute, AttributeKind, AttributeValue, CodecError, ConnectionId, PolicyAction,
    PolicyCodec, PolicyRecord, PolicyResponse,
};
