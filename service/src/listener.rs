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

//! Listening transports
//!
//! The server accepts connections through [`PolicyListener`] so that callers
//! can hand it an already bound socket, including a local (Unix domain)
//! socket as commonly used between the MTA and a policy daemon on one host.

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// A bound socket that yields policy client connections
#[async_trait]
pub trait PolicyListener: Send + 'static {
    /// Stream type of an accepted connection
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Wait for the next connection
    ///
    /// The peer address is `None` for transports without IP addressing.
    async fn accept(&mut self) -> io::Result<(Self::Stream, Option<SocketAddr>)>;

    /// The local address the listener is bound to, if it has one
    fn local_addr(&self) -> Option<SocketAddr>;
}

#[async_trait]
impl PolicyListener for TcpListener {
    type Stream = TcpStream;

    async fn accept(&mut self) -> io::Result<(TcpStream, Option<SocketAddr>)> {
        let (stream, peer_addr) = TcpListener::accept(self).await?;
        Ok((stream, Some(peer_addr)))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        TcpListener::local_addr(self).ok()
    }
}

#[cfg(unix)]
#[async_trait]
impl PolicyListener for tokio::net::UnixListener {
    type Stream = tokio::net::UnixStream;

    async fn accept(&mut self) -> io::Result<(tokio::net::UnixStream, Option<SocketAddr>)> {
        let (stream, _) = tokio::net::UnixListener::accept(self).await?;
        Ok((stream, None))
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tcp_listener_accept() {
        let mut listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = PolicyListener::local_addr(&listener).unwrap();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await.unwrap() });
        let (_stream, peer_addr) = PolicyListener::accept(&mut listener).await.unwrap();
        let client = client.await.unwrap();

        assert_eq!(peer_addr, Some(client.local_addr().unwrap()));
    }
}
