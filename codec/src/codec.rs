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

use crate::{CodecError, PolicyRecord, PolicyResponse};
use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// A codec for the Postfix policy delegation protocol.
///
/// `PolicyCodec` splits the incoming byte stream into `\n` terminated lines and
/// accumulates them into a [`PolicyRecord`] until an empty line ends the block.
/// Every empty line yields a record, including one that saw no attributes at
/// all; deciding whether a record deserves a response is left to the caller
/// (see [`PolicyRecord::is_actionable`]).
///
/// Only the trailing `\n` is removed from a line. A `\r` before it is kept and
/// becomes part of the value. Lines are decoded as UTF-8 with invalid sequences
/// replaced.
#[derive(Debug, Default)]
pub struct PolicyCodec {
    record: PolicyRecord,
    next_index: usize,
    max_line_length: Option<usize>,
}

impl PolicyCodec {
    /// Creates a new `PolicyCodec` without a line length limit.
    ///
    /// # Example
    /// ```
    /// use polserv_codec::PolicyCodec;
    ///
    /// let codec = PolicyCodec::new();
    /// assert_eq!(codec.max_line_length(), None);
    /// ```
    pub fn new() -> PolicyCodec {
        PolicyCodec::default()
    }

    /// Creates a `PolicyCodec` that fails with [`CodecError::LineTooLong`] once a
    /// single request line grows beyond `limit` bytes (excluding the newline).
    pub fn with_max_line_length(limit: usize) -> PolicyCodec {
        PolicyCodec {
            max_line_length: Some(limit),
            ..PolicyCodec::default()
        }
    }

    /// The configured line length limit, if any
    pub fn max_line_length(&self) -> Option<usize> {
        self.max_line_length
    }

    /// The record assembled from the lines of the current, unfinished block.
    pub fn pending(&self) -> &PolicyRecord {
        &self.record
    }

    fn check_length(&self, length: usize) -> Result<(), CodecError> {
        match self.max_line_length {
            Some(limit) if length > limit => Err(CodecError::LineTooLong { limit }),
            _ => Ok(()),
        }
    }
}

impl Decoder for PolicyCodec {
    type Item = PolicyRecord;
    type Error = CodecError;

    /// Consumes complete lines from `src` until a block is finished.
    ///
    /// Returns `Ok(Some(record))` when an empty line is read and `Ok(None)` when
    /// more data is needed. Bytes of an incomplete trailing line stay in `src`.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<PolicyRecord>, Self::Error> {
        loop {
            let newline = src[self.next_index..].iter().position(|b| *b == b'\n');
            let Some(offset) = newline else {
                self.next_index = src.len();
                self.check_length(src.len())?;
                return Ok(None);
            };

            let line_end = self.next_index + offset;
            self.next_index = 0;
            self.check_length(line_end)?;

            let line = src.split_to(line_end + 1);
            let line = &line[..line_end];
            if line.is_empty() {
                return Ok(Some(std::mem::take(&mut self.record)));
            }

            let line = String::from_utf8_lossy(line);
            if !self.record.apply_line(&line) {
                trace!(line = %line, "Ignoring unrecognised policy attribute");
            }
        }
    }

    /// At end of stream an unfinished block is discarded; nothing is returned
    /// for it.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<PolicyRecord>, Self::Error> {
        match self.decode(src)? {
            Some(record) => Ok(Some(record)),
            None => {
                if !src.is_empty() || self.record != PolicyRecord::default() {
                    trace!(
                        remaining = src.len(),
                        "Discarding incomplete policy request at end of stream"
                    );
                }
                src.clear();
                self.next_index = 0;
                self.record = PolicyRecord::default();
                Ok(None)
            }
        }
    }
}

impl Encoder<PolicyResponse> for PolicyCodec {
    type Error = CodecError;

    /// Writes `action=<VALUE>\n\n` for the response.
    fn encode(&mut self, item: PolicyResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let value = item.value();
        dst.reserve(value.len() + 9);
        dst.put_slice(b"action=");
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\n\n");
        Ok(())
    }
}

impl Encoder<&PolicyResponse> for PolicyCodec {
    type Error = CodecError;

    fn encode(&mut self, item: &PolicyResponse, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(item.clone(), dst)
    }
}
