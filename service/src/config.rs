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

//! Server configuration
//!
//! # Example
//!
//! ```
//! use polserv_service::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::new()
//!     .with_address("127.0.0.1")
//!     .with_port("10040")
//!     .with_read_timeout(Some(Duration::from_secs(300)));
//!
//! assert_eq!(config.bind_address(), "127.0.0.1:10040");
//! assert!(config.validate().is_ok());
//! ```

use crate::{PolicyError, Result};
use std::time::Duration;

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: &str = "10005";

/// Policy server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address (or host name) to listen on
    pub listen_address: String,

    /// TCP port to listen on
    ///
    /// Kept as text so that a bad value is reported by [`ServerConfig::validate`]
    /// instead of being rejected while the configuration is built.
    pub listen_port: String,

    /// Deadline for writing one response
    pub write_timeout: Duration,

    /// Deadline for the arrival of the next request line
    ///
    /// `None` (the default) waits forever, so a client that stops sending in
    /// the middle of a block keeps its session alive until it disconnects or
    /// the server shuts down.
    pub read_timeout: Option<Duration>,

    /// Maximum length of a single request line, unbounded when `None`
    pub max_line_length: Option<usize>,

    /// Timeout for graceful shutdown
    ///
    /// After cancellation the server waits this long for live sessions to
    /// finish before returning.
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_ADDRESS.to_string(),
            listen_port: DEFAULT_PORT.to_string(),
            write_timeout: Duration::from_secs(1),
            read_timeout: None,
            max_line_length: None,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

impl ServerConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listen address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.listen_address = address.into();
        self
    }

    /// Set the listen port
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.listen_port = port.into();
        self
    }

    /// Set the write timeout duration
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the read timeout duration
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the maximum request line length
    pub fn with_max_line_length(mut self, limit: Option<usize>) -> Self {
        self.max_line_length = limit;
        self
    }

    /// Set the shutdown timeout duration
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Change the listen address in place
    pub fn set_address(&mut self, address: impl Into<String>) {
        self.listen_address = address.into();
    }

    /// Change the listen port in place
    pub fn set_port(&mut self, port: impl Into<String>) {
        self.listen_port = port.into();
    }

    /// The `host:port` string handed to the socket layer.
    ///
    /// IPv6 literals are wrapped in brackets.
    pub fn bind_address(&self) -> String {
        let address = self.listen_address.as_str();
        if address.contains(':') && !address.starts_with('[') {
            format!("[{}]:{}", address, self.listen_port)
        } else {
            format!("{}:{}", address, self.listen_port)
        }
    }

    /// Validate the configuration
    ///
    /// Returns an error if the listen address, port or any session setting
    /// is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.trim().is_empty() {
            return Err(PolicyError::InvalidAddress(self.listen_address.clone()));
        }

        if self.listen_port.parse::<u16>().is_err() {
            return Err(PolicyError::InvalidPort(self.listen_port.clone()));
        }

        self.validate_session()
    }

    /// Validate only the per-session settings (timeouts and limits).
    ///
    /// The listen address and port are not consulted, so this is what
    /// [`serve`](crate::serve) checks for a caller-supplied listener.
    pub fn validate_session(&self) -> Result<()> {
        if self.write_timeout.is_zero() {
            return Err(PolicyError::InvalidConfig(
                "write_timeout must be greater than 0".to_string(),
            ));
        }

        if self.read_timeout.is_some_and(|t| t.is_zero()) {
            return Err(PolicyError::InvalidConfig(
                "read_timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_line_length == Some(0) {
            return Err(PolicyError::InvalidConfig(
                "max_line_length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_address, DEFAULT_ADDRESS);
        assert_eq!(config.listen_port, DEFAULT_PORT);
        assert_eq!(config.write_timeout, Duration::from_secs(1));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.bind_address(), "0.0.0.0:10005");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = ServerConfig::new()
            .with_address("1.2.3.4")
            .with_port("1234")
            .with_max_line_length(Some(4096))
            .with_shutdown_timeout(Duration::from_millis(250));

        assert_eq!(config.listen_address, "1.2.3.4");
        assert_eq!(config.listen_port, "1234");
        assert_eq!(config.max_line_length, Some(4096));
        assert_eq!(config.shutdown_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_setters() {
        let mut config = ServerConfig::new();
        config.set_address("1.2.3.4");
        config.set_port("1234");
        assert_eq!(config.bind_address(), "1.2.3.4:1234");
    }

    #[test]
    fn test_ipv6_bind_address() {
        let config = ServerConfig::new().with_address("::1").with_port("0");
        assert_eq!(config.bind_address(), "[::1]:0");
    }

    #[test]
    fn test_validation() {
        let config = ServerConfig::new().with_port("65536");
        assert!(matches!(config.validate(), Err(PolicyError::InvalidPort(_))));

        let config = ServerConfig::new().with_port("port");
        assert!(matches!(config.validate(), Err(PolicyError::InvalidPort(_))));

        let config = ServerConfig::new().with_address("");
        assert!(matches!(config.validate(), Err(PolicyError::InvalidAddress(_))));

        let config = ServerConfig::new().with_write_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(PolicyError::InvalidConfig(_))));

        let config = ServerConfig::new().with_read_timeout(Some(Duration::ZERO));
        assert!(matches!(config.validate(), Err(PolicyError::InvalidConfig(_))));
    }

    #[test]
    fn test_session_validation_skips_listen_address() {
        let config = ServerConfig::new().with_address("").with_port("port");
        assert!(config.validate().is_err());
        assert!(config.validate_session().is_ok());

        let config = config.with_max_line_length(Some(0));
        assert!(matches!(
            config.validate_session(),
            Err(PolicyError::InvalidConfig(_))
        ));
    }
}
