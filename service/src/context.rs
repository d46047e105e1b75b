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

//! Cancellation scopes for the server and its connections

use polserv_codec::ConnectionId;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// The scope a server runs in.
///
/// Cancelling the token stops the accept loop and every session spawned from
/// it. `quiet` suppresses error logging for conditions that are expected
/// while a test harness tears the server down.
#[derive(Debug, Clone, Default)]
pub struct ServeContext {
    token: CancellationToken,
    quiet: bool,
}

impl ServeContext {
    /// Create a context driven by `token`
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            quiet: false,
        }
    }

    /// Enable or disable quiet mode
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Whether error logging is suppressed
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// The cancellation token of this scope
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request shutdown
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether shutdown was requested
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Build the context for a newly accepted connection.
    pub fn connection(&self, id: ConnectionId, peer_addr: Option<SocketAddr>) -> ConnectionContext {
        ConnectionContext {
            id,
            peer_addr,
            quiet: self.quiet,
            token: self.token.child_token(),
        }
    }
}

/// Per-connection values, created once at accept time.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Server-assigned connection identifier
    pub id: ConnectionId,
    /// Remote address, when the transport has one
    pub peer_addr: Option<SocketAddr>,
    /// Suppress error logging
    pub quiet: bool,
    /// Cancelled when the server shuts down or the connection is torn down
    pub token: CancellationToken,
}

impl ConnectionContext {
    /// A standalone context, not tied to any server scope
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            peer_addr: None,
            quiet: false,
            token: CancellationToken::new(),
        }
    }

    /// Set the peer address
    pub fn with_peer_addr(mut self, peer_addr: SocketAddr) -> Self {
        self.peer_addr = Some(peer_addr);
        self
    }

    /// Replace the cancellation token
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    /// Enable or disable quiet mode
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}
