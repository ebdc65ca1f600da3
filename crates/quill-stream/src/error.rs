// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for recording, configuring, and replaying command streams.
//!
//! Capacity exhaustion is deliberately absent: a full stream drops commands
//! silently and never reports an error.

use crate::format::RecordKind;
use thiserror::Error;

/// A violation of the stream protocol detected while replaying.
///
/// Apart from [`StreamError::NothingFinalized`], every variant means the bytes
/// of a finalized stream can no longer be trusted. Replay stops at the first
/// violation; records before it have already reached the driver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Replay was requested before any stream was finalized.
    #[error("no command stream has been finalized yet")]
    NothingFinalized,
    /// A record header does not fit in the remaining bytes.
    #[error("record header at offset {offset} is truncated")]
    Truncated {
        /// Byte offset of the truncated header.
        offset: usize,
    },
    /// The stream ended without an end marker.
    #[error("stream ends at offset {offset} without an end marker")]
    MissingEndMarker {
        /// Byte offset where the stream ran out.
        offset: usize,
    },
    /// A record declares a size smaller than its own header, which would stall
    /// or rewind the scan.
    #[error("record at offset {offset} declares invalid size {byte_size}")]
    InvalidRecordSize {
        /// Byte offset of the record.
        offset: usize,
        /// The declared size.
        byte_size: u16,
    },
    /// A record declares more bytes than the stream holds.
    #[error("record at offset {offset} declares {byte_size} bytes but only {remaining} remain")]
    Overrun {
        /// Byte offset of the record.
        offset: usize,
        /// The declared size.
        byte_size: u16,
        /// Bytes left in the stream from `offset`.
        remaining: usize,
    },
    /// A built-in record's declared size differs from the size of its kind.
    #[error("{kind:?} record at offset {offset} is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Byte offset of the record.
        offset: usize,
        /// The record kind.
        kind: RecordKind,
        /// The fixed size of `kind`.
        expected: usize,
        /// The declared size.
        actual: usize,
    },
    /// A record kind that is neither built in nor registered.
    #[error("unknown record kind {kind:#06x} at offset {offset}")]
    UnknownKind {
        /// Byte offset of the record.
        offset: usize,
        /// The raw kind discriminant.
        kind: u16,
    },
}

/// An invalid [`StreamConfig`](crate::StreamConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Fewer than two buffers leave no room for a producer and a consumer.
    #[error("a command stream needs at least 2 buffers, got {count}")]
    TooFewBuffers {
        /// The requested buffer count.
        count: usize,
    },
    /// The buffer cannot even hold its end marker.
    #[error("buffer capacity {capacity} is below the minimum of {minimum} bytes")]
    CapacityTooSmall {
        /// The requested capacity.
        capacity: usize,
        /// The smallest usable capacity.
        minimum: usize,
    },
    /// The configuration document could not be parsed.
    #[error("invalid stream configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A finalize that could not hand the recorded stream over.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SwapError {
    /// Every other buffer is still waiting to be replayed. The recording is
    /// kept intact, so the finalize can be retried.
    #[error("the consumer has not released a buffer yet")]
    ConsumerBehind,
    /// The replaying side has been dropped.
    #[error("the replaying side of the stream has been dropped")]
    Disconnected,
}

/// A frame that could not be replayed by a [`FrameReplayer`](crate::pipeline::FrameReplayer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The frame's stream violated the protocol. Its buffer has been recycled.
    #[error("frame {frame} could not be replayed: {source}")]
    Stream {
        /// The number of the failed frame.
        frame: u64,
        /// The violation that stopped the replay.
        #[source]
        source: StreamError,
    },
    /// The recording side has been dropped and every submitted frame replayed.
    #[error("the recording side of the stream has been dropped")]
    Disconnected,
}

/// A custom command handler that could not be registered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The kind lies below [`CUSTOM_KIND_BASE`](crate::format::CUSTOM_KIND_BASE).
    #[error("record kind {kind:#06x} is reserved for built-in commands")]
    ReservedKind {
        /// The rejected kind.
        kind: u16,
    },
    /// A handler is already registered for the kind.
    #[error("a handler is already registered for record kind {kind:#06x}")]
    AlreadyRegistered {
        /// The rejected kind.
        kind: u16,
    },
}
