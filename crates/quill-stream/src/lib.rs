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

//! # Quill Stream
//!
//! A deferred command buffer. Rendering commands are encoded into compact binary
//! records by one part of the program and replayed later, in order, against a
//! [`RenderDriver`](quill_core::RenderDriver).
//!
//! The crate is organized in layers:
//! - [`format`]: the record layout and its decoder.
//! - [`allocator`]: the bounded per-buffer allocator that drops commands once
//!   a buffer is full.
//! - [`encoder`]: the [`RecordCommands`] trait, with one method per command.
//! - [`dispatch`]: the replay loop.
//! - [`command_buffer`]: the single-object double-buffered command buffer.
//! - [`pipeline`]: a channel-based hand-off between a recording thread and a
//!   replaying thread.

#![warn(missing_docs)]

pub mod allocator;
pub mod command_buffer;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod registry;
pub mod stats;

pub use allocator::StreamBuffer;
pub use command_buffer::CommandBuffer;
pub use config::{StreamConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_BUFFER_COUNT};
pub use dispatch::replay_stream;
pub use encoder::RecordCommands;
pub use error::{ConfigError, RegistryError, ReplayError, StreamError, SwapError};
pub use format::{DrawCall, Record, RecordKind, RecordReader, CUSTOM_KIND_BASE, END_MARKER_SIZE};
pub use pipeline::{FrameRecorder, FrameReplayer, FrameReport, ReplayReport};
pub use registry::{CommandRegistry, CustomCommandHandler};
pub use stats::{ReplayStats, StreamStats};
