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

//! Typed policy request records

use crate::Attribute;
use std::fmt;
use std::net::IpAddr;

/// Server-assigned identifier of the connection a record arrived on.
///
/// Used only to correlate records and log lines; it never appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Create a new connection ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Borrowed, typed value of a single record attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// String attribute
    Text(&'a str),
    /// Unsigned numeric attribute
    Unsigned(u64),
    /// Address attribute, `None` when absent or unparseable
    Address(Option<IpAddr>),
    /// Boolean attribute
    Flag(bool),
}

impl fmt::Display for AttributeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Unsigned(n) => write!(f, "{}", n),
            AttributeValue::Address(Some(addr)) => write!(f, "{}", addr),
            AttributeValue::Address(None) => Ok(()),
            AttributeValue::Flag(true) => f.write_str("yes"),
            AttributeValue::Flag(false) => f.write_str("no"),
        }
    }
}

/// One decoded policy request block.
///
/// A record starts out empty, is filled in line by line while its block is
/// read, and is then handed to the decision handler by value. Fields that
/// the client did not send, or sent with a malformed value, keep their zero
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRecord {
    /// Connection the record was received on
    pub connection_id: Option<ConnectionId>,

    // Postfix 2.1 and later
    /// Request type, `smtpd_access_policy`
    pub request: String,
    /// SMTP protocol state
    pub protocol_state: String,
    /// SMTP protocol name
    pub protocol_name: String,
    /// HELO/EHLO argument
    pub helo_name: String,
    /// Queue identifier, empty before the MAIL FROM stage
    pub queue_id: String,
    /// Envelope sender
    pub sender: String,
    /// Envelope recipient
    pub recipient: String,
    /// Number of accepted recipients
    pub recipient_count: u64,
    /// SMTP client address
    pub client_address: Option<IpAddr>,
    /// Verified client hostname or `unknown`
    pub client_name: String,
    /// Reverse client hostname or `unknown`
    pub reverse_client_name: String,
    /// Message instance identifier
    pub instance: String,

    // Postfix 2.2 and later
    /// SASL authentication method
    pub sasl_method: String,
    /// SASL user name
    pub sasl_username: String,
    /// SASL sender
    pub sasl_sender: String,
    /// Message size estimate
    pub size: u64,
    /// Client certificate subject
    pub ccert_subject: String,
    /// Client certificate issuer
    pub ccert_issuer: String,
    /// Client certificate fingerprint
    pub ccert_fingerprint: String,

    // Postfix 2.3 and later
    /// TLS protocol
    pub encryption_protocol: String,
    /// TLS cipher
    pub encryption_cipher: String,
    /// TLS key size
    pub encryption_keysize: u64,
    /// ETRN domain
    pub etrn_domain: String,

    // Postfix 2.5 and later
    /// Whether the MTA runs under stress
    pub stress: bool,

    // Postfix 2.9 and later
    /// Client certificate public key fingerprint
    pub ccert_pubkey_fingerprint: String,

    // Postfix 3.0 and later
    /// SMTP client port
    pub client_port: u64,

    // Postfix 3.1 and later
    /// Optional `policy_context` configured on the MTA side
    pub policy_context: String,

    // Postfix 3.2 and later
    /// Local address the client connected to
    pub server_address: Option<IpAddr>,
    /// Local port the client connected to
    pub server_port: u64,
}

impl PolicyRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this record should be handed to the decision handler.
    ///
    /// Blocks without a `request` attribute (for example a stray empty line)
    /// are skipped without producing a response.
    pub fn is_actionable(&self) -> bool {
        !self.request.is_empty()
    }

    /// Apply a single `key`/`value` attribute to the record.
    ///
    /// Returns `true` when the key is a known attribute. Unknown keys are
    /// ignored. Unsigned values that fail to parse leave the field as it is;
    /// address values that fail to parse clear the field.
    ///
    /// # Example
    /// ```
    /// use polserv_codec::PolicyRecord;
    ///
    /// let mut record = PolicyRecord::new();
    /// assert!(record.apply("size", "12345"));
    /// assert!(record.apply("size", "lots"));
    /// assert!(!record.apply("x_custom", "1"));
    /// assert_eq!(record.size, 12345);
    /// ```
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let Some(attribute) = Attribute::from_name(key) else {
            return false;
        };

        match attribute {
            Attribute::Request => self.request = value.to_string(),
            Attribute::ProtocolState => self.protocol_state = value.to_string(),
            Attribute::ProtocolName => self.protocol_name = value.to_string(),
            Attribute::HeloName => self.helo_name = value.to_string(),
            Attribute::QueueId => self.queue_id = value.to_string(),
            Attribute::Sender => self.sender = value.to_string(),
            Attribute::Recipient => self.recipient = value.to_string(),
            Attribute::RecipientCount => parse_unsigned(value, &mut self.recipient_count),
            Attribute::ClientAddress => self.client_address = value.parse().ok(),
            Attribute::ClientName => self.client_name = value.to_string(),
            Attribute::ReverseClientName => self.reverse_client_name = value.to_string(),
            Attribute::Instance => self.instance = value.to_string(),
            Attribute::SaslMethod => self.sasl_method = value.to_string(),
            Attribute::SaslUsername => self.sasl_username = value.to_string(),
            Attribute::SaslSender => self.sasl_sender = value.to_string(),
            Attribute::Size => parse_unsigned(value, &mut self.size),
            Attribute::CcertSubject => self.ccert_subject = value.to_string(),
            Attribute::CcertIssuer => self.ccert_issuer = value.to_string(),
            Attribute::CcertFingerprint => self.ccert_fingerprint = value.to_string(),
            Attribute::EncryptionProtocol => self.encryption_protocol = value.to_string(),
            Attribute::EncryptionCipher => self.encryption_cipher = value.to_string(),
            Attribute::EncryptionKeysize => parse_unsigned(value, &mut self.encryption_keysize),
            Attribute::EtrnDomain => self.etrn_domain = value.to_string(),
            Attribute::Stress => self.stress = value == "yes",
            Attribute::CcertPubkeyFingerprint => {
                self.ccert_pubkey_fingerprint = value.to_string()
            }
            Attribute::ClientPort => parse_unsigned(value, &mut self.client_port),
            Attribute::PolicyContext => self.policy_context = value.to_string(),
            Attribute::ServerAddress => self.server_address = value.parse().ok(),
            Attribute::ServerPort => parse_unsigned(value, &mut self.server_port),
        }
        true
    }

    /// Apply one raw protocol line (without its newline) to the record.
    ///
    /// The line is split on the first `=`, so values may themselves contain
    /// `=` (certificate subjects do). Lines without any `=` are ignored and
    /// return `false`.
    pub fn apply_line(&mut self, line: &str) -> bool {
        match line.split_once('=') {
            Some((key, value)) => self.apply(key, value),
            None => false,
        }
    }

    /// Read an attribute back as a typed value.
    pub fn get(&self, attribute: Attribute) -> AttributeValue<'_> {
        use AttributeValue::{Address, Flag, Text, Unsigned};

        match attribute {
            Attribute::Request => Text(&self.request),
            Attribute::ProtocolState => Text(&self.protocol_state),
            Attribute::ProtocolName => Text(&self.protocol_name),
            Attribute::HeloName => Text(&self.helo_name),
            Attribute::QueueId => Text(&self.queue_id),
            Attribute::Sender => Text(&self.sender),
            Attribute::Recipient => Text(&self.recipient),
            Attribute::RecipientCount => Unsigned(self.recipient_count),
            Attribute::ClientAddress => Address(self.client_address),
            Attribute::ClientName => Text(&self.client_name),
            Attribute::ReverseClientName => Text(&self.reverse_client_name),
            Attribute::Instance => Text(&self.instance),
            Attribute::SaslMethod => Text(&self.sasl_method),
            Attribute::SaslUsername => Text(&self.sasl_username),
            Attribute::SaslSender => Text(&self.sasl_sender),
            Attribute::Size => Unsigned(self.size),
            Attribute::CcertSubject => Text(&self.ccert_subject),
            Attribute::CcertIssuer => Text(&self.ccert_issuer),
            Attribute::CcertFingerprint => Text(&self.ccert_fingerprint),
            Attribute::EncryptionProtocol => Text(&self.encryption_protocol),
            Attribute::EncryptionCipher => Text(&self.encryption_cipher),
            Attribute::EncryptionKeysize => Unsigned(self.encryption_keysize),
            Attribute::EtrnDomain => Text(&self.etrn_domain),
            Attribute::Stress => Flag(self.stress),
            Attribute::CcertPubkeyFingerprint => Text(&self.ccert_pubkey_fingerprint),
            Attribute::ClientPort => Unsigned(self.client_port),
            Attribute::PolicyContext => Text(&self.policy_context),
            Attribute::ServerAddress => Address(self.server_address),
            Attribute::ServerPort => Unsigned(self.server_port),
        }
    }

    /// Iterate over every known attribute and its current value.
    pub fn attributes(&self) -> impl Iterator<Item = (Attribute, AttributeValue<'_>)> {
        Attribute::ALL.into_iter().map(move |a| (a, self.get(a)))
    }
}

// Digits only: `u64::from_str` would also take a leading `+`.
fn parse_unsigned(value: &str, field: &mut u64) {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return;
    }
    if let Ok(n) = value.parse::<u64>() {
        *field = n;
    }
}
