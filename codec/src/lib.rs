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

//! # Polserv Policy Delegation Codec
//!
//! This crate implements the wire side of the Postfix SMTP access policy
//! delegation protocol. The mail transfer agent connects to a policy server,
//! sends a block of `name=value` attribute lines terminated by an empty line,
//! and waits for a single `action=<VALUE>` line followed by an empty line.
//! The connection is persistent: many request/response exchanges may follow
//! one another on the same stream.
//!
//! ## Core Components
//!
//! ### [`PolicyCodec`]
//!
//! Implements [`Decoder`] and [`Encoder`] from `tokio_util::codec`. The decoder
//! assembles request blocks into [`PolicyRecord`] values; the encoder renders a
//! [`PolicyResponse`] into the response framing expected by the peer.
//!
//! ### [`PolicyRecord`]
//!
//! The typed view of one request block. Unknown attributes are ignored and
//! malformed numeric or address values leave their field at the zero value,
//! so a sloppy client never causes a protocol error.
//!
//! ### [`Attribute`]
//!
//! The fixed attribute vocabulary, with the wire name, value kind and the
//! MTA release that introduced each attribute.
//!
//! ### [`PolicyAction`] / [`PolicyResponse`]
//!
//! The closed set of action tokens and the decision value returned to the
//! client. Text-bearing actions (`FILTER`, `PREPEND`, `REDIRECT`) carry their
//! text in the variant itself.
//!
//! ## Usage Example
//!
//! ```rust
//! use bytes::BytesMut;
//! use polserv_codec::{PolicyCodec, PolicyResponse};
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let mut codec = PolicyCodec::new();
//! let mut input = BytesMut::from(&b"request=smtpd_access_policy\nsender=a@example.com\n\n"[..]);
//!
//! let record = codec.decode(&mut input).unwrap().unwrap();
//! assert!(record.is_actionable());
//! assert_eq!(record.sender, "a@example.com");
//!
//! let mut output = BytesMut::new();
//! codec.encode(PolicyResponse::dunno(), &mut output).unwrap();
//! assert_eq!(&output[..], b"action=DUNNO\n\n");
//! ```
//!
//! [`Decoder`]: tokio_util::codec::Decoder
//! [`Encoder`]: tokio_util::codec::Encoder

mod action;
mod attribute;
mod codec;
mod record;
mod result;

pub use action::{ParseActionError, PolicyAction, PolicyResponse};
pub use attribute::{Attribute, AttributeKind, UnknownAttribute};
pub use codec::PolicyCodec;
pub use record::{AttributeValue, ConnectionId, PolicyRecord};
pub use result::{CodecError, CodecResult};
