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

//! The bounded allocator that carves records out of a fixed-size buffer.
//!
//! A [`StreamBuffer`] owns one block of bytes allocated at construction and never
//! grown. Records are appended at the write cursor. Every allocation keeps
//! [`END_MARKER_SIZE`] bytes of headroom free, so sealing the buffer can always
//! append its end marker without another capacity check.
//!
//! ```text
//! 0                  cursor                       capacity
//! | records ...      | free          | headroom   |
//! ```

use crate::format::{RecordHeader, RecordKind, END_MARKER_SIZE, HEADER_SIZE, MAX_RECORD_SIZE};
use crate::stats::StreamStats;

/// One fixed-capacity buffer of the command stream pool.
#[derive(Debug)]
pub struct StreamBuffer {
    /// The backing storage, allocated once.
    bytes: Box<[u8]>,
    /// Offset of the next free byte.
    cursor: usize,
    /// The position of this buffer in its pool.
    slot: usize,
    /// Set once the end marker has been written.
    sealed: bool,
    recorded: u32,
    dropped: u32,
}

impl StreamBuffer {
    /// Allocates a zeroed buffer of `capacity` bytes.
    ///
    /// `capacity` must be at least [`END_MARKER_SIZE`]; stream constructors
    /// validate this through [`StreamConfig`](crate::StreamConfig).
    pub fn new(slot: usize, capacity: usize) -> Self {
        debug_assert!(capacity >= END_MARKER_SIZE);
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
            slot,
            sealed: false,
            recorded: 0,
            dropped: 0,
        }
    }

    /// Returns the capacity of the buffer in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the write cursor.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the position of this buffer in its pool.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Returns `true` once the end marker has been written.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns how many bytes can still be allocated, headroom excluded.
    pub fn remaining(&self) -> usize {
        if self.sealed {
            return 0;
        }
        self.capacity() - self.cursor - END_MARKER_SIZE
    }

    /// Reserves `size` bytes at the write cursor.
    ///
    /// Returns `None` and leaves the buffer untouched when the request does not
    /// fit alongside the end marker headroom, or when the buffer is sealed.
    pub fn allocate(&mut self, size: usize) -> Option<&mut [u8]> {
        if self.sealed || size > self.remaining() {
            return None;
        }
        let start = self.cursor;
        self.cursor += size;
        Some(&mut self.bytes[start..self.cursor])
    }

    /// Reserves a record of `kind` with `payload_len` payload bytes and writes its
    /// header.
    ///
    /// Returns the payload region, which still holds stale bytes. A refused
    /// request is counted as a dropped command.
    pub fn allocate_record(&mut self, kind: u16, payload_len: usize) -> Option<&mut [u8]> {
        let size = HEADER_SIZE.saturating_add(payload_len);
        if size > MAX_RECORD_SIZE || size > self.remaining() {
            self.dropped += 1;
            log::trace!(
                "Slot {} full: dropped record kind {kind:#06x} ({size} bytes, {} free)",
                self.slot,
                self.remaining()
            );
            return None;
        }
        self.recorded += 1;

        let header = RecordHeader {
            kind,
            byte_size: size as u16,
        };
        let region = self.allocate(size)?;
        region[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
        Some(&mut region[HEADER_SIZE..])
    }

    /// Appends the end marker into the reserved headroom and seals the buffer.
    ///
    /// Returns the statistics of the pass. Sealing twice is a no-op.
    pub fn seal(&mut self) -> StreamStats {
        if !self.sealed {
            debug_assert!(self.cursor + END_MARKER_SIZE <= self.capacity());
            let marker = RecordHeader {
                kind: RecordKind::EndMarker.raw(),
                byte_size: END_MARKER_SIZE as u16,
            };
            let end = self.cursor + END_MARKER_SIZE;
            self.bytes[self.cursor..end].copy_from_slice(bytemuck::bytes_of(&marker));
            self.cursor = end;
            self.sealed = true;
        }
        self.stats()
    }

    /// Makes the buffer logically empty again. The bytes themselves are left
    /// stale until overwritten.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.sealed = false;
        self.recorded = 0;
        self.dropped = 0;
    }

    /// Returns the bytes written so far, from offset 0 to the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.cursor]
    }

    /// Returns the statistics of the current pass.
    pub fn stats(&self) -> StreamStats {
        StreamStats {
            commands_recorded: self.recorded,
            commands_dropped: self.dropped,
            bytes_used: self.cursor,
            capacity: self.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocations_are_sequential() {
        let mut buffer = StreamBuffer::new(0, 64);

        buffer.allocate(8).unwrap().fill(1);
        buffer.allocate(8).unwrap().fill(2);

        assert_eq!(buffer.cursor(), 16);
        assert_eq!(&buffer.as_bytes()[..8], &[1; 8]);
        assert_eq!(&buffer.as_bytes()[8..16], &[2; 8]);
    }

    #[test]
    fn refuses_allocation_into_headroom() {
        let mut buffer = StreamBuffer::new(0, 16);

        assert_eq!(buffer.remaining(), 12);
        assert!(buffer.allocate(13).is_none());
        assert_eq!(buffer.cursor(), 0);
        assert!(buffer.allocate(12).is_some());
        assert_eq!(buffer.remaining(), 0);
        assert!(buffer.allocate(1).is_none());
    }

    #[test]
    fn allocate_record_writes_header_and_counts() {
        let mut buffer = StreamBuffer::new(3, 20);

        let payload = buffer.allocate_record(RecordKind::SetBlendMode.raw(), 4).unwrap();
        assert_eq!(payload.len(), 4);
        payload.copy_from_slice(&9u32.to_ne_bytes());

        let header: RecordHeader = bytemuck::pod_read_unaligned(&buffer.as_bytes()[..4]);
        assert_eq!(header.kind, RecordKind::SetBlendMode.raw());
        assert_eq!(header.byte_size, 8);

        assert!(buffer.allocate_record(RecordKind::SetBlendMode.raw(), 4).is_some());
        assert!(buffer.allocate_record(RecordKind::SetBlendMode.raw(), 4).is_none());

        let stats = buffer.stats();
        assert_eq!(stats.commands_recorded, 2);
        assert_eq!(stats.commands_dropped, 1);
        assert_eq!(stats.bytes_used, 16);
    }

    #[test]
    fn oversized_record_is_dropped() {
        let mut buffer = StreamBuffer::new(0, MAX_RECORD_SIZE * 2);
        assert!(buffer.allocate_record(0x8000, MAX_RECORD_SIZE).is_none());
        assert_eq!(buffer.stats().commands_dropped, 1);
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn seal_fits_even_when_full() {
        let mut buffer = StreamBuffer::new(0, 12);
        assert!(buffer.allocate_record(RecordKind::SetBlendMode.raw(), 4).is_some());
        assert_eq!(buffer.remaining(), 0);

        let stats = buffer.seal();
        assert!(buffer.is_sealed());
        assert_eq!(stats.bytes_used, 12);
        assert_eq!(buffer.as_bytes().len(), buffer.capacity());

        // Sealed buffers accept nothing, and sealing again changes nothing.
        assert!(buffer.allocate(1).is_none());
        assert_eq!(buffer.seal().bytes_used, 12);
    }

    #[test]
    fn reset_starts_a_new_pass() {
        let mut buffer = StreamBuffer::new(1, 32);
        buffer.allocate_record(RecordKind::SetVertexBuffer.raw(), 4);
        buffer.seal();

        buffer.reset();
        assert!(!buffer.is_sealed());
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.stats(), StreamStats {
            capacity: 32,
            ..Default::default()
        });
    }
}
