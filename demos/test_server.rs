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

//! Rejecting Test Server Example
//!
//! Answers `REJECT` to every policy request on 0.0.0.0:10005. Useful to check
//! that Postfix actually consults the policy service.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example test_server
//! ```

use polserv_service::{PolicyRecord, PolicyResponse, PolicyServer, ServeContext, ServerConfig};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let handler = |record: PolicyRecord| {
        tracing::debug!(?record, "Rejecting policy request");
        PolicyResponse::reject()
    };

    let server = PolicyServer::new(ServerConfig::default());
    server
        .run(ServeContext::new(CancellationToken::new()), Arc::new(handler))
        .await?;

    Ok(())
}
