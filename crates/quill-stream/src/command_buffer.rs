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

//! The double-buffered command buffer.
//!
//! [`CommandBuffer`] owns a fixed pool of [`StreamBuffer`]s and cycles through
//! them: commands are recorded into the write buffer, [`finalize`] seals it and
//! makes it the read buffer, and [`replay`] walks the read buffer into the
//! driver.
//!
//! ```text
//! finalize #1:   [Slot 1: sealed, read]   [Slot 0: recording]
//! finalize #2:   [Slot 0: sealed, read]   [Slot 1: recording]
//! finalize #3:   [Slot 1: sealed, read]   [Slot 0: recording]
//! ```
//!
//! The command buffer has no internal synchronization. When recording and
//! replay happen on different threads, the caller must make sure a slot has
//! been fully replayed before the finalize that turns it back into the write
//! buffer; with two buffers that leaves exactly one finalize of slack. The
//! [`pipeline`](crate::pipeline) module provides a channel-based hand-off that
//! enforces this.
//!
//! [`finalize`]: CommandBuffer::finalize
//! [`replay`]: CommandBuffer::replay

use crate::allocator::StreamBuffer;
use crate::config::StreamConfig;
use crate::dispatch::replay_stream;
use crate::encoder::RecordCommands;
use crate::error::{ConfigError, StreamError};
use crate::registry::CommandRegistry;
use crate::stats::{ReplayStats, StreamStats};
use quill_core::RenderDriver;

/// A pool of command stream buffers bound to the driver that replays them.
///
/// # Example
///
/// ```
/// use quill_core::renderer::{BlendMode, DriverCall, TextureFilter, TextureHandle};
/// use quill_core::RecordingDriver;
/// use quill_stream::{CommandBuffer, RecordCommands, StreamConfig};
///
/// let mut commands = CommandBuffer::new(RecordingDriver::new(), &StreamConfig::default())?;
/// commands.set_blend_mode(BlendMode(3));
/// commands.set_texture(0, TextureHandle(42), TextureFilter(1), true);
/// commands.execute()?;
///
/// assert_eq!(commands.driver().calls().len(), 2);
/// assert_eq!(commands.driver().calls()[0], DriverCall::SetBlendMode(BlendMode(3)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct CommandBuffer<D: RenderDriver> {
    /// The buffer pool. Every buffer has the same capacity.
    buffers: Vec<StreamBuffer>,
    /// The buffer currently being recorded into.
    write_index: usize,
    /// The buffer holding the most recently finalized stream.
    read_index: usize,
    /// Whether `read_index` points at a sealed stream yet.
    read_ready: bool,
    driver: D,
    registry: CommandRegistry,
}

impl<D: RenderDriver> CommandBuffer<D> {
    /// Allocates the buffer pool and binds it to `driver`.
    ///
    /// Recording starts in slot 1; slot 0 becomes the first read buffer once
    /// the pool has wrapped around.
    ///
    /// ## Errors
    /// * [`ConfigError`] if `config` is invalid.
    pub fn new(driver: D, config: &StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let buffers: Vec<_> = (0..config.buffer_count)
            .map(|slot| StreamBuffer::new(slot, config.buffer_capacity))
            .collect();

        log::debug!(
            "CommandBuffer initialized: {} buffers of {} bytes",
            config.buffer_count,
            config.buffer_capacity
        );

        Ok(Self {
            buffers,
            write_index: 1,
            read_index: 0,
            read_ready: false,
            driver,
            registry: CommandRegistry::new(),
        })
    }

    /// Seals the write buffer and rotates the pool.
    ///
    /// Appends the end marker, makes the sealed buffer the read buffer, moves
    /// recording to the next slot, and resets the write cursor. Returns the
    /// statistics of the pass that was just sealed.
    pub fn finalize(&mut self) -> StreamStats {
        let stats = self.buffers[self.write_index].seal();

        self.read_index = self.write_index;
        self.write_index = (self.write_index + 1) % self.buffers.len();
        self.buffers[self.write_index].reset();
        self.read_ready = true;

        if stats.commands_dropped > 0 {
            log::debug!(
                "Command buffer slot {} finalized with {} dropped commands",
                self.read_index,
                stats.commands_dropped
            );
        }
        log::trace!(
            "Finalized slot {} ({} commands, {} bytes); recording into slot {}",
            self.read_index,
            stats.commands_recorded,
            stats.bytes_used,
            self.write_index
        );
        stats
    }

    /// Replays the read buffer into the driver.
    ///
    /// The read buffer stays valid, and can be replayed again, until the pool
    /// wraps around to it.
    ///
    /// ## Errors
    /// * [`StreamError::NothingFinalized`] if no stream was finalized yet.
    /// * Any protocol violation found in the stream.
    pub fn replay(&mut self) -> Result<ReplayStats, StreamError> {
        if !self.read_ready {
            return Err(StreamError::NothingFinalized);
        }
        let stream = self.buffers[self.read_index].as_bytes();
        replay_stream(stream, &mut self.driver, &self.registry)
    }

    /// Finalizes the write buffer and immediately replays it.
    pub fn execute(&mut self) -> Result<ReplayStats, StreamError> {
        self.finalize();
        self.replay()
    }

    /// Releases the buffer pool and hands the driver back.
    pub fn destroy(self) -> D {
        let Self {
            buffers, driver, ..
        } = self;
        log::debug!("CommandBuffer destroyed: released {} buffers", buffers.len());
        drop(buffers);
        driver
    }

    /// Returns the slot currently being recorded into.
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    /// Returns the slot holding the most recently finalized stream.
    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Returns the write cursor of the current write buffer.
    pub fn write_cursor(&self) -> usize {
        self.buffers[self.write_index].cursor()
    }

    /// Returns the capacity of each buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.buffers[self.write_index].capacity()
    }

    /// Returns the number of buffers in the pool.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Returns the statistics of the pass being recorded.
    pub fn pending_stats(&self) -> StreamStats {
        self.buffers[self.write_index].stats()
    }

    /// Returns the bytes of the most recently finalized stream, if any.
    pub fn finalized_stream(&self) -> Option<&[u8]> {
        self.read_ready
            .then(|| self.buffers[self.read_index].as_bytes())
    }

    /// Returns the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the driver mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Returns the registry of custom command handlers used by replay.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }
}

impl<D: RenderDriver> RecordCommands for CommandBuffer<D> {
    fn allocate_record(&mut self, kind: u16, payload_len: usize) -> Option<&mut [u8]> {
        self.buffers[self.write_index].allocate_record(kind, payload_len)
    }
}
