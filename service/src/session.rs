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

//! Connection session
//!
//! A [`Session`] owns one accepted connection and runs the request/response
//! loop on it:
//!
//! ```text
//! Reading → Deciding → Writing → Reading ...
//!    ↓                    ↓
//!  Closed ←───────────────┘
//! ```
//!
//! Blocks without a `request` attribute go straight back to reading. The
//! session ends when the peer closes, a transport error occurs, a response
//! cannot be written within the write deadline, or the connection's
//! cancellation token fires.

use crate::{ConnectionContext, PolicyError, PolicyHandler, Result, ServerConfig};
use futures_util::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use polserv_codec::{ConnectionId, PolicyCodec, PolicyRecord, PolicyResponse};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, instrument, trace};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the next request block
    Reading,
    /// The handler is deciding on a request
    Deciding,
    /// The response is being written
    Writing,
    /// The session is finished and its stream closed
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Reading => write!(f, "Reading"),
            SessionState::Deciding => write!(f, "Deciding"),
            SessionState::Writing => write!(f, "Writing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}

/// The request/response loop of one connection
pub struct Session<S> {
    framed: Framed<S, PolicyCodec>,
    handler: Arc<dyn PolicyHandler>,
    context: ConnectionContext,
    write_timeout: Duration,
    read_timeout: Option<Duration>,
    state: SessionState,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a session over `stream`, taking timeouts and limits from `config`
    pub fn new(
        stream: S,
        handler: Arc<dyn PolicyHandler>,
        context: ConnectionContext,
        config: &ServerConfig,
    ) -> Self {
        let codec = match config.max_line_length {
            Some(limit) => PolicyCodec::with_max_line_length(limit),
            None => PolicyCodec::new(),
        };

        Self {
            framed: Framed::new(stream, codec),
            handler,
            context,
            write_timeout: config.write_timeout,
            read_timeout: config.read_timeout,
            state: SessionState::Reading,
        }
    }

    /// The connection identifier
    pub fn id(&self) -> ConnectionId {
        self.context.id
    }

    /// The current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to completion.
    ///
    /// Returns `Ok(())` when the peer closed the connection or the session was
    /// cancelled, and the fatal error otherwise. The stream is shut down and
    /// dropped before this returns, whatever the outcome.
    #[instrument(
        name = "session",
        skip(self),
        fields(connection_id = %self.context.id, peer = ?self.context.peer_addr)
    )]
    pub async fn run(mut self) -> Result<()> {
        counter!("polserv.connections.total").increment(1);
        gauge!("polserv.connections.active").increment(1.0);
        debug!("Session started");

        let result = self.serve().await;
        if result.is_err() {
            counter!("polserv.errors.session").increment(1);
        }

        self.close().await;
        gauge!("polserv.connections.active").decrement(1.0);
        debug!(state = %self.state, "Session finished");
        result
    }

    async fn serve(&mut self) -> Result<()> {
        loop {
            self.state = SessionState::Reading;
            let Some(mut record) = self.read_record().await? else {
                return Ok(());
            };

            if !record.is_actionable() {
                counter!("polserv.requests.skipped").increment(1);
                trace!("Skipping request block without request attribute");
                continue;
            }
            counter!("polserv.requests.received").increment(1);

            self.state = SessionState::Deciding;
            record.connection_id = Some(self.context.id);
            let start = Instant::now();
            let response = self.handler.handle(record);
            histogram!("polserv.handler.duration").record(start.elapsed().as_secs_f64());

            self.state = SessionState::Writing;
            self.write_response(response).await?;
        }
    }

    /// Read the next request block.
    ///
    /// `Ok(None)` means the session is over without error: the peer closed the
    /// stream, or the connection was cancelled (an error surfacing after the
    /// cancellation counts as part of the teardown).
    async fn read_record(&mut self) -> Result<Option<PolicyRecord>> {
        let token = self.context.token.clone();
        let read_timeout = self.read_timeout;
        let framed = &mut self.framed;

        let next = async move {
            match read_timeout {
                Some(limit) => timeout(limit, framed.next())
                    .await
                    .map_err(|_| PolicyError::ReadTimeout(limit)),
                None => Ok(framed.next().await),
            }
        };

        let frame = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Session cancelled while reading");
                return Ok(None);
            }
            frame = next => frame?,
        };

        match frame {
            None => {
                trace!("Peer closed connection");
                Ok(None)
            }
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) if token.is_cancelled() => {
                trace!(error = %e, "Read failed after cancellation");
                Ok(None)
            }
            Some(Err(e)) => Err(e.into()),
        }
    }

    async fn write_response(&mut self, response: PolicyResponse) -> Result<()> {
        trace!(action = %response, "Sending response");
        let start = Instant::now();
        match timeout(self.write_timeout, self.framed.send(response)).await {
            Ok(Ok(())) => {
                counter!("polserv.responses.sent").increment(1);
                histogram!("polserv.response.write_duration")
                    .record(start.elapsed().as_secs_f64());
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(PolicyError::WriteTimeout(self.write_timeout)),
        }
    }

    async fn close(&mut self) {
        self.state = SessionState::Closed;
        let stream = self.framed.get_mut();
        match timeout(self.write_timeout, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => trace!(error = %e, "Stream shutdown failed"),
            Err(_) => trace!("Stream shutdown timed out"),
        }
    }
}

impl<S> fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.context.id)
            .field("peer_addr", &self.context.peer_addr)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticHandler;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    fn session<S>(stream: S, response: PolicyResponse) -> Session<S>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        Session::new(
            stream,
            Arc::new(StaticHandler(response)),
            ConnectionContext::new(ConnectionId::new(1)),
            &ServerConfig::default(),
        )
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Reading.to_string(), "Reading");
        assert_eq!(SessionState::Closed.to_string(), "Closed");
    }

    #[tokio::test]
    async fn test_session_answers_and_closes() {
        let (mut client, server) = duplex(1024);
        let session = session(server, PolicyResponse::ok());
        assert_eq!(session.state(), SessionState::Reading);
        let task = tokio::spawn(session.run());

        client
            .write_all(b"request=smtpd_access_policy\nsender=a@example.com\n\n")
            .await
            .unwrap();
        let mut response = [0u8; 11];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(&response, b"action=OK\n\n");

        drop(client);
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_session_stamps_connection_id() {
        let (mut client, server) = duplex(1024);
        let handler = |record: PolicyRecord| match record.connection_id {
            Some(id) if id == ConnectionId::new(42) => PolicyResponse::ok(),
            _ => PolicyResponse::reject(),
        };
        let session = Session::new(
            server,
            Arc::new(handler),
            ConnectionContext::new(ConnectionId::new(42)),
            &ServerConfig::default(),
        );
        let task = tokio::spawn(session.run());

        client.write_all(b"request=smtpd_access_policy\n\n").await.unwrap();
        let mut response = [0u8; 11];
        client.read_exact(&mut response).await.unwrap();
        assert_eq!(&response, b"action=OK\n\n");

        drop(client);
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_session_cancelled_while_reading() {
        let (mut client, server) = duplex(1024);
        let context = ConnectionContext::new(ConnectionId::new(7));
        let token = context.token.clone();
        let session = Session::new(
            server,
            Arc::new(StaticHandler::default()),
            context,
            &ServerConfig::default(),
        );
        let task = tokio::spawn(session.run());

        client.write_all(b"request=smtpd_access_policy\n").await.unwrap();
        token.cancel();
        assert!(task.await.unwrap().is_ok());

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_read_timeout() {
        let (_client, server) = duplex(1024);
        let config = ServerConfig::default().with_read_timeout(Some(Duration::from_secs(30)));
        let session = Session::new(
            server,
            Arc::new(StaticHandler::default()),
            ConnectionContext::new(ConnectionId::new(1)),
            &config,
        );

        let result = session.run().await;
        assert!(matches!(result, Err(PolicyError::ReadTimeout(_))));
    }

    #[tokio::test]
    async fn test_session_line_too_long() {
        let (mut client, server) = duplex(1024);
        let config = ServerConfig::default().with_max_line_length(Some(32));
        let session = Session::new(
            server,
            Arc::new(StaticHandler::default()),
            ConnectionContext::new(ConnectionId::new(1)),
            &config,
        );
        let task = tokio::spawn(session.run());

        client.write_all(&[b'x'; 64]).await.unwrap();
        let result = task.await.unwrap();
        assert!(matches!(result, Err(PolicyError::Codec(_))));
    }
}
