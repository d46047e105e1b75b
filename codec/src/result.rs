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

/// Result Type for Codec Operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Represents possible errors that can occur while framing the policy protocol.
///
/// Attribute-level problems (unknown names, malformed values, lines without
/// `=`) are never errors; only transport failures and an exceeded line limit
/// surface here.
#[derive(Debug)]
pub enum CodecError {
    /// An I/O error occurred while reading from or writing to the underlying stream.
    Io(std::io::Error),

    /// A request line exceeded the configured maximum length.
    LineTooLong {
        /// The configured limit in bytes
        limit: usize,
    },
}

impl CodecError {
    /// The I/O error kind, if this is an I/O error
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            CodecError::Io(err) => Some(err.kind()),
            CodecError::LineTooLong { .. } => None,
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Io(err) => Some(err),
            CodecError::LineTooLong { .. } => None,
        }
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Io(err) => write!(f, "I/O error: {}", err),
            CodecError::LineTooLong { limit } => {
                write!(f, "request line exceeds maximum length of {} bytes", limit)
            }
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io(err)
    }
}
