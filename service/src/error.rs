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

//! Error types for the policy server

use polserv_codec::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Result type for operations
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Policy server error types
#[derive(Debug, Error)]
pub enum PolicyError {
    /// I/O error from the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing error from the codec layer
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The listening socket could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// The address that was requested
        address: String,
        /// The underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The configured listen address is unusable
    #[error("Invalid listen address: {0:?}")]
    InvalidAddress(String),

    /// The configured listen port is not a valid TCP port
    #[error("Invalid listen port: {0:?}")]
    InvalidPort(String),

    /// Any other configuration problem
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A response could not be written within the write deadline
    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// No request data arrived within the read deadline
    #[error("Read timed out after {0:?}")]
    ReadTimeout(Duration),
}

impl PolicyError {
    /// Check if the error prevents the server from starting
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            PolicyError::Bind { .. }
                | PolicyError::InvalidAddress(_)
                | PolicyError::InvalidPort(_)
                | PolicyError::InvalidConfig(_)
        )
    }

    /// Check if the error came from a connection's transport
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            PolicyError::Io(_)
                | PolicyError::Codec(_)
                | PolicyError::WriteTimeout(_)
                | PolicyError::ReadTimeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_is_startup_error() {
        let bind = PolicyError::Bind {
            address: "0.0.0.0:10005".to_string(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(bind.is_startup_error());
        assert!(PolicyError::InvalidPort("70000".to_string()).is_startup_error());
        assert!(!PolicyError::WriteTimeout(Duration::from_secs(1)).is_startup_error());
    }

    #[test]
    fn test_error_is_transport_error() {
        assert!(PolicyError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_transport_error());
        assert!(PolicyError::Codec(CodecError::LineTooLong { limit: 10 }).is_transport_error());
        assert!(PolicyError::ReadTimeout(Duration::from_secs(5)).is_transport_error());
        assert!(!PolicyError::InvalidAddress(String::new()).is_transport_error());
    }

    #[test]
    fn test_error_display() {
        let err = PolicyError::InvalidPort("abc".to_string());
        assert_eq!(err.to_string(), "Invalid listen port: \"abc\"");

        let err = PolicyError::WriteTimeout(Duration::from_secs(1));
        assert_eq!(err.to_string(), "Write timed out after 1s");
    }
}
