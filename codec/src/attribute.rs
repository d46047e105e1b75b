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

//! Policy delegation attribute vocabulary
//!
//! See <http://www.postfix.org/SMTPD_POLICY_README.html> for the attributes
//! sent by the MTA and the release that introduced each of them.

use std::str::FromStr;

/// How the value of an attribute is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    /// Copied verbatim, the empty string included
    Text,
    /// Unsigned base-10 integer
    Unsigned,
    /// IPv4 or IPv6 literal
    Address,
    /// `yes` is true, anything else is false
    Flag,
}

/// A request attribute understood by the policy server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// `request` (always `smtpd_access_policy` for current MTAs)
    Request,
    /// `protocol_state` (`CONNECT`, `EHLO`, `HELO`, `MAIL`, `RCPT`, `DATA`, `END-OF-MESSAGE`, `VRFY`, `ETRN`)
    ProtocolState,
    /// `protocol_name` (`SMTP`, `ESMTP`, `QMQP`)
    ProtocolName,
    /// `helo_name`
    HeloName,
    /// `queue_id`
    QueueId,
    /// `sender`
    Sender,
    /// `recipient`
    Recipient,
    /// `recipient_count`
    RecipientCount,
    /// `client_address`
    ClientAddress,
    /// `client_name`
    ClientName,
    /// `reverse_client_name`
    ReverseClientName,
    /// `instance`
    Instance,
    /// `sasl_method`
    SaslMethod,
    /// `sasl_username`
    SaslUsername,
    /// `sasl_sender`
    SaslSender,
    /// `size`
    Size,
    /// `ccert_subject`
    CcertSubject,
    /// `ccert_issuer`
    CcertIssuer,
    /// `ccert_fingerprint`
    CcertFingerprint,
    /// `encryption_protocol`
    EncryptionProtocol,
    /// `encryption_cipher`
    EncryptionCipher,
    /// `encryption_keysize`
    EncryptionKeysize,
    /// `etrn_domain`
    EtrnDomain,
    /// `stress`
    Stress,
    /// `ccert_pubkey_fingerprint`
    CcertPubkeyFingerprint,
    /// `client_port`
    ClientPort,
    /// `policy_context`
    PolicyContext,
    /// `server_address`
    ServerAddress,
    /// `server_port`
    ServerPort,
}

impl Attribute {
    /// Every known attribute, in the order the MTA introduced them.
    pub const ALL: [Attribute; 29] = [
        Attribute::Request,
        Attribute::ProtocolState,
        Attribute::ProtocolName,
        Attribute::HeloName,
        Attribute::QueueId,
        Attribute::Sender,
        Attribute::Recipient,
        Attribute::RecipientCount,
        Attribute::ClientAddress,
        Attribute::ClientName,
        Attribute::ReverseClientName,
        Attribute::Instance,
        Attribute::SaslMethod,
        Attribute::SaslUsername,
        Attribute::SaslSender,
        Attribute::Size,
        Attribute::CcertSubject,
        Attribute::CcertIssuer,
        Attribute::CcertFingerprint,
        Attribute::EncryptionProtocol,
        Attribute::EncryptionCipher,
        Attribute::EncryptionKeysize,
        Attribute::EtrnDomain,
        Attribute::Stress,
        Attribute::CcertPubkeyFingerprint,
        Attribute::ClientPort,
        Attribute::PolicyContext,
        Attribute::ServerAddress,
        Attribute::ServerPort,
    ];

    /// The attribute name as it appears on the wire.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Request => "request",
            Attribute::ProtocolState => "protocol_state",
            Attribute::ProtocolName => "protocol_name",
            Attribute::HeloName => "helo_name",
            Attribute::QueueId => "queue_id",
            Attribute::Sender => "sender",
            Attribute::Recipient => "recipient",
            Attribute::RecipientCount => "recipient_count",
            Attribute::ClientAddress => "client_address",
            Attribute::ClientName => "client_name",
            Attribute::ReverseClientName => "reverse_client_name",
            Attribute::Instance => "instance",
            Attribute::SaslMethod => "sasl_method",
            Attribute::SaslUsername => "sasl_username",
            Attribute::SaslSender => "sasl_sender",
            Attribute::Size => "size",
            Attribute::CcertSubject => "ccert_subject",
            Attribute::CcertIssuer => "ccert_issuer",
            Attribute::CcertFingerprint => "ccert_fingerprint",
            Attribute::EncryptionProtocol => "encryption_protocol",
            Attribute::EncryptionCipher => "encryption_cipher",
            Attribute::EncryptionKeysize => "encryption_keysize",
            Attribute::EtrnDomain => "etrn_domain",
            Attribute::Stress => "stress",
            Attribute::CcertPubkeyFingerprint => "ccert_pubkey_fingerprint",
            Attribute::ClientPort => "client_port",
            Attribute::PolicyContext => "policy_context",
            Attribute::ServerAddress => "server_address",
            Attribute::ServerPort => "server_port",
        }
    }

    /// Look up an attribute by its wire name.
    ///
    /// Names are matched exactly. Unknown names return `None`; newer MTA
    /// releases routinely add attributes and those are simply skipped.
    ///
    /// # Example
    /// ```
    /// use polserv_codec::Attribute;
    ///
    /// assert_eq!(Attribute::from_name("client_port"), Some(Attribute::ClientPort));
    /// assert_eq!(Attribute::from_name("compatibility_level"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Attribute> {
        let attribute = match name {
            "request" => Attribute::Request,
            "protocol_state" => Attribute::ProtocolState,
            "protocol_name" => Attribute::ProtocolName,
            "helo_name" => Attribute::HeloName,
            "queue_id" => Attribute::QueueId,
            "sender" => Attribute::Sender,
            "recipient" => Attribute::Recipient,
            "recipient_count" => Attribute::RecipientCount,
            "client_address" => Attribute::ClientAddress,
            "client_name" => Attribute::ClientName,
            "reverse_client_name" => Attribute::ReverseClientName,
            "instance" => Attribute::Instance,
            "sasl_method" => Attribute::SaslMethod,
            "sasl_username" => Attribute::SaslUsername,
            "sasl_sender" => Attribute::SaslSender,
            "size" => Attribute::Size,
            "ccert_subject" => Attribute::CcertSubject,
            "ccert_issuer" => Attribute::CcertIssuer,
            "ccert_fingerprint" => Attribute::CcertFingerprint,
            "encryption_protocol" => Attribute::EncryptionProtocol,
            "encryption_cipher" => Attribute::EncryptionCipher,
            "encryption_keysize" => Attribute::EncryptionKeysize,
            "etrn_domain" => Attribute::EtrnDomain,
            "stress" => Attribute::Stress,
            "ccert_pubkey_fingerprint" => Attribute::CcertPubkeyFingerprint,
            "client_port" => Attribute::ClientPort,
            "policy_context" => Attribute::PolicyContext,
            "server_address" => Attribute::ServerAddress,
            "server_port" => Attribute::ServerPort,
            _ => return None,
        };
        Some(attribute)
    }

    /// How values of this attribute are decoded.
    pub fn kind(self) -> AttributeKind {
        match self {
            Attribute::RecipientCount
            | Attribute::Size
            | Attribute::EncryptionKeysize
            | Attribute::ClientPort
            | Attribute::ServerPort => AttributeKind::Unsigned,
            Attribute::ClientAddress | Attribute::ServerAddress => AttributeKind::Address,
            Attribute::Stress => AttributeKind::Flag,
            _ => AttributeKind::Text,
        }
    }

    /// The MTA release (major, minor) that first sends this attribute.
    pub fn since(self) -> (u8, u8) {
        match self {
            Attribute::Request
            | Attribute::ProtocolState
            | Attribute::ProtocolName
            | Attribute::HeloName
            | Attribute::QueueId
            | Attribute::Sender
            | Attribute::Recipient
            | Attribute::RecipientCount
            | Attribute::ClientAddress
            | Attribute::ClientName
            | Attribute::ReverseClientName
            | Attribute::Instance => (2, 1),
            Attribute::SaslMethod
            | Attribute::SaslUsername
            | Attribute::SaslSender
            | Attribute::Size
            | Attribute::CcertSubject
            | Attribute::CcertIssuer
            | Attribute::CcertFingerprint => (2, 2),
            Attribute::EncryptionProtocol
            | Attribute::EncryptionCipher
            | Attribute::EncryptionKeysize
            | Attribute::EtrnDomain => (2, 3),
            Attribute::Stress => (2, 5),
            Attribute::CcertPubkeyFingerprint => (2, 9),
            Attribute::ClientPort => (3, 0),
            Attribute::PolicyContext => (3, 1),
            Attribute::ServerAddress | Attribute::ServerPort => (3, 2),
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown attribute name with [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAttribute(pub String);

impl std::fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown policy attribute: {}", self.0)
    }
}

impl std::error::Error for UnknownAttribute {}

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::from_name(s).ok_or_else(|| UnknownAttribute(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup_is_inverse() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_name(attribute.name()), Some(attribute));
        }
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(Attribute::from_name(""), None);
        assert_eq!(Attribute::from_name("REQUEST"), None);
        assert_eq!(Attribute::from_name("mail_version"), None);
        assert!("no_such_thing".parse::<Attribute>().is_err());
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Attribute::Request.kind(), AttributeKind::Text);
        assert_eq!(Attribute::Size.kind(), AttributeKind::Unsigned);
        assert_eq!(Attribute::ServerPort.kind(), AttributeKind::Unsigned);
        assert_eq!(Attribute::ClientAddress.kind(), AttributeKind::Address);
        assert_eq!(Attribute::Stress.kind(), AttributeKind::Flag);

        let unsigned = Attribute::ALL
            .iter()
            .filter(|a| a.kind() == AttributeKind::Unsigned)
            .count();
        assert_eq!(unsigned, 5);
    }

    #[test]
    fn test_since_is_monotonic() {
        let versions: Vec<_> = Attribute::ALL.iter().map(|a| a.since()).collect();
        assert!(versions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Attribute::CcertPubkeyFingerprint.to_string(), "ccert_pubkey_fingerprint");
    }
}
