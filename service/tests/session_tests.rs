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

//! Session tests over in-memory streams

use polserv_service::{
    ConnectionContext, ConnectionId, PolicyError, PolicyRecord, PolicyResponse, ServeContext,
    ServerConfig, Session, StaticHandler,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio_util::sync::CancellationToken;

fn spawn_session(
    handler: Arc<dyn polserv_service::PolicyHandler>,
    context: ConnectionContext,
    config: ServerConfig,
) -> (
    DuplexStream,
    tokio::task::JoinHandle<polserv_service::Result<()>>,
) {
    let (client, server) = duplex(4096);
    let session = Session::new(server, handler, context, &config);
    (client, tokio::spawn(session.run()))
}

#[tokio::test]
async fn session_processes_blocks_in_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();
    let handler = move |record: PolicyRecord| {
        recorder.lock().unwrap().push(record.recipient.clone());
        PolicyResponse::ok()
    };

    let (mut client, task) = spawn_session(
        Arc::new(handler),
        ConnectionContext::new(ConnectionId::new(1)),
        ServerConfig::default(),
    );

    client
        .write_all(
            b"request=smtpd_access_policy\nrecipient=a@example.com\n\n\
              request=smtpd_access_policy\nrecipient=b@example.com\n\n\
              request=smtpd_access_policy\nrecipient=c@example.com\n\n",
        )
        .await
        .unwrap();

    let mut responses = [0u8; 33];
    client.read_exact(&mut responses).await.unwrap();
    assert_eq!(&responses, b"action=OK\n\naction=OK\n\naction=OK\n\n");

    drop(client);
    task.await.unwrap().unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["a@example.com", "b@example.com", "c@example.com"]
    );
}

#[tokio::test]
async fn session_ignores_unknown_attributes() {
    let handler = |record: PolicyRecord| {
        if record.size == 0 && record.client_address.is_none() {
            PolicyResponse::dunno()
        } else {
            PolicyResponse::reject()
        }
    };
    let (mut client, task) = spawn_session(
        Arc::new(handler),
        ConnectionContext::new(ConnectionId::new(1)),
        ServerConfig::default(),
    );

    client
        .write_all(
            b"request=smtpd_access_policy\nsize=big\nclient_address=localhost\n\
              no_equals_sign\nfuture_attribute=1\n\n",
        )
        .await
        .unwrap();

    let mut response = [0u8; 14];
    client.read_exact(&mut response).await.unwrap();
    assert_eq!(&response, b"action=DUNNO\n\n");

    drop(client);
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn session_ends_on_eof_mid_block() {
    let (mut client, task) = spawn_session(
        Arc::new(StaticHandler::default()),
        ConnectionContext::new(ConnectionId::new(1)),
        ServerConfig::default(),
    );

    client.write_all(b"request=smtpd_access_policy\nsender=").await.unwrap();
    client.shutdown().await.unwrap();

    assert!(task.await.unwrap().is_ok());
    let mut rest = Vec::new();
    client.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());
}

#[tokio::test]
async fn server_cancellation_reaches_session() {
    let ctx = ServeContext::new(CancellationToken::new());
    let context = ctx.connection(ConnectionId::new(9), None);
    let (mut client, task) = spawn_session(
        Arc::new(StaticHandler::default()),
        context,
        ServerConfig::default(),
    );

    client.write_all(b"request=smtpd_access_policy\n").await.unwrap();
    ctx.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("session ignored cancellation")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn stalled_peer_hits_write_timeout() {
    // A tiny pipe the client never drains
    let (mut client, server) = duplex(8);
    let session = Session::new(
        server,
        Arc::new(StaticHandler(PolicyResponse::filter("smtp:[192.0.2.25]:10026"))),
        ConnectionContext::new(ConnectionId::new(1)),
        &ServerConfig::default(),
    );
    let task = tokio::spawn(session.run());

    client.write_all(b"request=smtpd_access_policy\n\n").await.unwrap();

    let result = task.await.unwrap();
    assert!(matches!(result, Err(PolicyError::WriteTimeout(_))));
}
