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

//! Policy actions and decision values
//!
//! See <http://www.postfix.org/access.5.html> for the meaning of each action.

use std::fmt;
use std::str::FromStr;

/// An action token the policy server may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    /// `OK`: accept the request
    Ok,
    /// `REJECT`: reject the request
    Reject,
    /// `DEFER`: temporarily reject the request
    Defer,
    /// `DEFER_IF_REJECT`: defer if a later restriction would reject
    DeferIfReject,
    /// `DEFER_IF_PERMIT`: defer if a later restriction would permit
    DeferIfPermit,
    /// `DISCARD`: accept and silently discard the message
    Discard,
    /// `DUNNO`: no decision, continue with the next restriction
    Dunno,
    /// `HOLD`: place the message on the hold queue
    Hold,
    /// `INFO`: log an informational record and continue
    Info,
    /// `WARN`: log a warning and continue
    Warn,
    /// `FILTER transport:destination`
    Filter,
    /// `PREPEND headername: headervalue`
    Prepend,
    /// `REDIRECT user@domain`
    Redirect,
}

impl PolicyAction {
    /// The ten actions that are sent without any accompanying text.
    pub const BARE: [PolicyAction; 10] = [
        PolicyAction::Ok,
        PolicyAction::Reject,
        PolicyAction::Defer,
        PolicyAction::DeferIfReject,
        PolicyAction::DeferIfPermit,
        PolicyAction::Discard,
        PolicyAction::Dunno,
        PolicyAction::Hold,
        PolicyAction::Info,
        PolicyAction::Warn,
    ];

    /// The wire token of the action.
    pub fn token(self) -> &'static str {
        match self {
            PolicyAction::Ok => "OK",
            PolicyAction::Reject => "REJECT",
            PolicyAction::Defer => "DEFER",
            PolicyAction::DeferIfReject => "DEFER_IF_REJECT",
            PolicyAction::DeferIfPermit => "DEFER_IF_PERMIT",
            PolicyAction::Discard => "DISCARD",
            PolicyAction::Dunno => "DUNNO",
            PolicyAction::Hold => "HOLD",
            PolicyAction::Info => "INFO",
            PolicyAction::Warn => "WARN",
            PolicyAction::Filter => "FILTER",
            PolicyAction::Prepend => "PREPEND",
            PolicyAction::Redirect => "REDIRECT",
        }
    }

    /// Whether the action is only meaningful with accompanying text.
    pub fn requires_text(self) -> bool {
        matches!(
            self,
            PolicyAction::Filter | PolicyAction::Prepend | PolicyAction::Redirect
        )
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Error returned when an action token is not recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseActionError(pub String);

impl fmt::Display for ParseActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown policy action: {}", self.0)
    }
}

impl std::error::Error for ParseActionError {}

impl FromStr for PolicyAction {
    type Err = ParseActionError;

    /// Parse a token case-insensitively; `-` is accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        let action = match normalized.as_str() {
            "OK" => PolicyAction::Ok,
            "REJECT" => PolicyAction::Reject,
            "DEFER" => PolicyAction::Defer,
            "DEFER_IF_REJECT" => PolicyAction::DeferIfReject,
            "DEFER_IF_PERMIT" => PolicyAction::DeferIfPermit,
            "DISCARD" => PolicyAction::Discard,
            "DUNNO" => PolicyAction::Dunno,
            "HOLD" => PolicyAction::Hold,
            "INFO" => PolicyAction::Info,
            "WARN" => PolicyAction::Warn,
            "FILTER" => PolicyAction::Filter,
            "PREPEND" => PolicyAction::Prepend,
            "REDIRECT" => PolicyAction::Redirect,
            _ => return Err(ParseActionError(s.to_string())),
        };
        Ok(action)
    }
}

/// The decision returned for one policy request.
///
/// Text-bearing actions carry their text in the variant, so a well-typed
/// response can never pair `FILTER` with nothing or `DUNNO` with text.
/// Constructing `Action(PolicyAction::Filter)` is still possible; the encoder
/// then writes the bare token and it is up to the caller not to do that.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyResponse {
    /// A bare action
    Action(PolicyAction),
    /// `FILTER transport:destination`
    Filter(String),
    /// `PREPEND headername: headervalue`
    Prepend(String),
    /// `REDIRECT user@domain`
    Redirect(String),
}

impl PolicyResponse {
    /// `OK`
    pub fn ok() -> Self {
        Self::Action(PolicyAction::Ok)
    }

    /// `REJECT`
    pub fn reject() -> Self {
        Self::Action(PolicyAction::Reject)
    }

    /// `DEFER`
    pub fn defer() -> Self {
        Self::Action(PolicyAction::Defer)
    }

    /// `DEFER_IF_REJECT`
    pub fn defer_if_reject() -> Self {
        Self::Action(PolicyAction::DeferIfReject)
    }

    /// `DEFER_IF_PERMIT`
    pub fn defer_if_permit() -> Self {
        Self::Action(PolicyAction::DeferIfPermit)
    }

    /// `DISCARD`
    pub fn discard() -> Self {
        Self::Action(PolicyAction::Discard)
    }

    /// `DUNNO`
    pub fn dunno() -> Self {
        Self::Action(PolicyAction::Dunno)
    }

    /// `HOLD`
    pub fn hold() -> Self {
        Self::Action(PolicyAction::Hold)
    }

    /// `INFO`
    pub fn info() -> Self {
        Self::Action(PolicyAction::Info)
    }

    /// `WARN`
    pub fn warn() -> Self {
        Self::Action(PolicyAction::Warn)
    }

    /// `FILTER <text>`
    pub fn filter(text: impl Into<String>) -> Self {
        Self::Filter(text.into())
    }

    /// `PREPEND <text>`
    pub fn prepend(text: impl Into<String>) -> Self {
        Self::Prepend(text.into())
    }

    /// `REDIRECT <text>`
    pub fn redirect(text: impl Into<String>) -> Self {
        Self::Redirect(text.into())
    }

    /// The action of this response
    pub fn action(&self) -> PolicyAction {
        match self {
            PolicyResponse::Action(action) => *action,
            PolicyResponse::Filter(_) => PolicyAction::Filter,
            PolicyResponse::Prepend(_) => PolicyAction::Prepend,
            PolicyResponse::Redirect(_) => PolicyAction::Redirect,
        }
    }

    /// The accompanying text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            PolicyResponse::Action(_) => None,
            PolicyResponse::Filter(text)
            | PolicyResponse::Prepend(text)
            | PolicyResponse::Redirect(text) => Some(text),
        }
    }

    /// The `<VALUE>` part of the `action=<VALUE>` response line.
    ///
    /// # Example
    /// ```
    /// use polserv_codec::PolicyResponse;
    ///
    /// assert_eq!(PolicyResponse::dunno().value(), "DUNNO");
    /// assert_eq!(PolicyResponse::filter("smtp:[10.0.0.1]").value(), "FILTER smtp:[10.0.0.1]");
    /// ```
    pub fn value(&self) -> String {
        self.to_string()
    }
}

impl From<PolicyAction> for PolicyResponse {
    fn from(action: PolicyAction) -> Self {
        PolicyResponse::Action(action)
    }
}

impl fmt::Display for PolicyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => write!(f, "{} {}", self.action(), text),
            None => write!(f, "{}", self.action()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens() {
        assert_eq!(PolicyAction::Ok.token(), "OK");
        assert_eq!(PolicyAction::DeferIfReject.token(), "DEFER_IF_REJECT");
        assert_eq!(PolicyAction::Redirect.to_string(), "REDIRECT");
    }

    #[test]
    fn test_bare_actions_need_no_text() {
        assert!(PolicyAction::BARE.iter().all(|a| !a.requires_text()));
        assert!(PolicyAction::Filter.requires_text());
        assert!(PolicyAction::Prepend.requires_text());
        assert!(PolicyAction::Redirect.requires_text());
    }

    #[test]
    fn test_parse_tokens() {
        for action in PolicyAction::BARE {
            assert_eq!(action.token().parse::<PolicyAction>(), Ok(action));
        }
        assert_eq!("defer-if-permit".parse::<PolicyAction>(), Ok(PolicyAction::DeferIfPermit));
        assert_eq!(" dunno ".parse::<PolicyAction>(), Ok(PolicyAction::Dunno));
        assert!("ACCEPT".parse::<PolicyAction>().is_err());
    }

    #[test]
    fn test_response_value() {
        assert_eq!(PolicyResponse::reject().value(), "REJECT");
        assert_eq!(
            PolicyResponse::prepend("X-Policy: checked").value(),
            "PREPEND X-Policy: checked"
        );
        assert_eq!(
            PolicyResponse::redirect("abuse@example.com").value(),
            "REDIRECT abuse@example.com"
        );
        assert_eq!(PolicyResponse::from(PolicyAction::Hold).value(), "HOLD");
    }

    #[test]
    fn test_response_parts() {
        let response = PolicyResponse::filter("smtp:[127.0.0.1]:10025");
        assert_eq!(response.action(), PolicyAction::Filter);
        assert_eq!(response.text(), Some("smtp:[127.0.0.1]:10025"));
        assert_eq!(PolicyResponse::warn().text(), None);
    }
}
