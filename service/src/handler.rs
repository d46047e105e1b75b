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

//! Decision handlers for the policy server

use polserv_codec::{PolicyRecord, PolicyResponse};

/// Policy decision handler trait
///
/// Implement this trait to decide what the MTA should do with a request.
/// The handler is called once per actionable request block, on the task
/// serving the connection, and its answer is written back before the next
/// block is read.
///
/// `handle` runs directly on a Tokio worker thread, so a slow handler stalls
/// every session scheduled on that worker, not only its own connection.
/// Blocking work (file or database lookups, DNS) belongs in
/// [`tokio::task::block_in_place`] inside the handler, or in a
/// [`tokio::task::spawn_blocking`] job whose result the handler waits on
/// from within `block_in_place`. `block_in_place` requires the
/// multi-threaded runtime.
///
/// Any `Fn(PolicyRecord) -> PolicyResponse` closure is a handler.
///
/// # Example
///
/// ```
/// use polserv_service::{PolicyHandler, PolicyRecord, PolicyResponse};
///
/// struct BlockListHandler {
///     senders: Vec<String>,
/// }
///
/// impl PolicyHandler for BlockListHandler {
///     fn handle(&self, record: PolicyRecord) -> PolicyResponse {
///         if self.senders.contains(&record.sender) {
///             PolicyResponse::reject()
///         } else {
///             PolicyResponse::dunno()
///         }
///     }
/// }
///
/// let handler = BlockListHandler { senders: vec!["spam@example.com".to_string()] };
/// let mut record = PolicyRecord::new();
/// record.sender = "spam@example.com".to_string();
/// assert_eq!(handler.handle(record), PolicyResponse::reject());
/// ```
pub trait PolicyHandler: Send + Sync + 'static {
    /// Decide on one request
    fn handle(&self, record: PolicyRecord) -> PolicyResponse;
}

impl<F> PolicyHandler for F
where
    F: Fn(PolicyRecord) -> PolicyResponse + Send + Sync + 'static,
{
    fn handle(&self, record: PolicyRecord) -> PolicyResponse {
        self(record)
    }
}

/// Handler that gives the same answer to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHandler(pub PolicyResponse);

impl StaticHandler {
    /// Create a handler answering `response`
    pub fn new(response: impl Into<PolicyResponse>) -> Self {
        Self(response.into())
    }
}

impl Default for StaticHandler {
    fn default() -> Self {
        Self(PolicyResponse::dunno())
    }
}

impl PolicyHandler for StaticHandler {
    fn handle(&self, _record: PolicyRecord) -> PolicyResponse {
        self.0.clone()
    }
}
