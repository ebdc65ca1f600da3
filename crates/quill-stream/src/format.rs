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

//! The binary record format of a command stream.
//!
//! A stream is a sequence of self-describing records laid out back to back from
//! offset 0 and terminated by exactly one end marker:
//!
//! ```text
//! +-----------+-----------+----------------------+
//! | kind: u16 | size: u16 | payload (size - 4)   |   <- one record
//! +-----------+-----------+----------------------+
//! | ...                                          |
//! +-----------+-----------+
//! | 0 (end)   | 4         |                          <- end marker
//! +-----------+-----------+
//! ```
//!
//! `size` is the total size of the record, header included, so a reader can step
//! over any record without knowing its kind. Built-in kinds have a fixed size;
//! custom kinds (at or above [`CUSTOM_KIND_BASE`]) carry whatever payload their
//! producer allocated. All fields are native-endian: the format never leaves the
//! process.
//!
//! Records are read with `bytemuck::pod_read_unaligned`, so no alignment is
//! required of the underlying buffer.

use crate::error::StreamError;
use bytemuck::{Pod, Zeroable};
use quill_core::math::Mat4;
use quill_core::renderer::{
    BlendMode, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId,
};
use std::mem::size_of;

/// The header that starts every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct RecordHeader {
    /// The raw [`RecordKind`] discriminant, or a custom kind.
    pub kind: u16,
    /// The total size of the record in bytes, header included.
    pub byte_size: u16,
}

/// The size of a [`RecordHeader`] in bytes.
pub const HEADER_SIZE: usize = size_of::<RecordHeader>();

/// The size of the end marker record. It is a bare header.
pub const END_MARKER_SIZE: usize = HEADER_SIZE;

/// The first record kind available to custom commands.
pub const CUSTOM_KIND_BASE: u16 = 0x8000;

/// The largest record the header can describe.
pub const MAX_RECORD_SIZE: usize = u16::MAX as usize;

/// The built-in record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RecordKind {
    /// Terminates a finalized stream.
    EndMarker = 0,
    /// Sets the active blend mode.
    SetBlendMode = 1,
    /// Binds a texture to a slot.
    SetTexture = 2,
    /// Binds a vertex buffer.
    SetVertexBuffer = 3,
    /// Draws from the currently bound buffers.
    DrawIndexed = 4,
    /// Binds state and draws in one record.
    DrawCall = 5,
}

impl RecordKind {
    /// Converts a raw discriminant into a built-in kind.
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            0 => Some(Self::EndMarker),
            1 => Some(Self::SetBlendMode),
            2 => Some(Self::SetTexture),
            3 => Some(Self::SetVertexBuffer),
            4 => Some(Self::DrawIndexed),
            5 => Some(Self::DrawCall),
            _ => None,
        }
    }

    /// Returns the raw discriminant written into headers.
    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Returns the payload size of this kind in bytes.
    pub const fn payload_size(self) -> usize {
        match self {
            Self::EndMarker => 0,
            Self::SetBlendMode => size_of::<BlendModePayload>(),
            Self::SetTexture => size_of::<SetTexturePayload>(),
            Self::SetVertexBuffer => size_of::<SetVertexBufferPayload>(),
            Self::DrawIndexed => size_of::<DrawIndexedPayload>(),
            Self::DrawCall => size_of::<DrawCallPayload>(),
        }
    }

    /// Returns the total record size of this kind, header included.
    #[inline]
    pub const fn record_size(self) -> usize {
        HEADER_SIZE + self.payload_size()
    }
}

// --- Payload layouts ---

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct BlendModePayload {
    pub mode: u32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SetTexturePayload {
    pub slot: u32,
    pub texture: u32,
    pub filter: u32,
    pub wrap: u32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SetVertexBufferPayload {
    pub vertex_buffer: u32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DrawIndexedPayload {
    pub index_buffer: u32,
    pub start_index: u32,
    pub primitive_count: u32,
}

#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DrawCallPayload {
    pub world: Mat4,
    pub texture: u32,
    pub vertex_buffer: u32,
    pub index_buffer: u32,
    pub start_index: u32,
    pub primitive_count: u32,
}

/// A bundled draw: texture, geometry, and transform bound together with one
/// indexed draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// The world transform.
    pub world: Mat4,
    /// The texture bound to slot 0.
    pub texture: TextureHandle,
    /// The vertex buffer bound as geometry source.
    pub vertex_buffer: VertexBufferId,
    /// The index buffer drawn from.
    pub index_buffer: IndexBufferId,
    /// The first index read.
    pub start_index: u32,
    /// The number of triangles drawn.
    pub primitive_count: u32,
}

impl From<&DrawCall> for DrawCallPayload {
    fn from(call: &DrawCall) -> Self {
        Self {
            world: call.world,
            texture: call.texture.0,
            vertex_buffer: call.vertex_buffer.0,
            index_buffer: call.index_buffer.0,
            start_index: call.start_index,
            primitive_count: call.primitive_count,
        }
    }
}

impl From<DrawCallPayload> for DrawCall {
    fn from(p: DrawCallPayload) -> Self {
        Self {
            world: p.world,
            texture: TextureHandle(p.texture),
            vertex_buffer: VertexBufferId(p.vertex_buffer),
            index_buffer: IndexBufferId(p.index_buffer),
            start_index: p.start_index,
            primitive_count: p.primitive_count,
        }
    }
}

/// A decoded record.
///
/// Decoding turns raw bytes into one of these values before anything is
/// dispatched, so the replay loop never reinterprets memory in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Record<'a> {
    /// See [`RecordKind::SetBlendMode`].
    SetBlendMode(BlendMode),
    /// See [`RecordKind::SetTexture`].
    SetTexture {
        /// The sampler slot.
        slot: u32,
        /// The texture to bind.
        texture: TextureHandle,
        /// The filtering mode.
        filter: TextureFilter,
        /// Whether texture coordinates wrap.
        wrap: bool,
    },
    /// See [`RecordKind::SetVertexBuffer`].
    SetVertexBuffer(VertexBufferId),
    /// See [`RecordKind::DrawIndexed`].
    DrawIndexed {
        /// The index buffer to draw from.
        index_buffer: IndexBufferId,
        /// The first index read.
        start_index: u32,
        /// The number of triangles drawn.
        primitive_count: u32,
    },
    /// See [`RecordKind::DrawCall`].
    DrawCall(DrawCall),
    /// A record of a custom kind, with its raw payload.
    Custom {
        /// The custom kind.
        kind: u16,
        /// The payload bytes following the header.
        payload: &'a [u8],
    },
    /// See [`RecordKind::EndMarker`].
    EndMarker,
}

/// Decodes the record starting at `offset`.
///
/// Returns the record and its total size. Every structural check happens here:
/// a record that decodes successfully is safe to skip by its declared size.
pub fn decode_record(bytes: &[u8], offset: usize) -> Result<(Record<'_>, usize), StreamError> {
    let remaining = bytes.len().saturating_sub(offset);
    if remaining == 0 {
        return Err(StreamError::MissingEndMarker { offset });
    }
    if remaining < HEADER_SIZE {
        return Err(StreamError::Truncated { offset });
    }

    let header: RecordHeader = bytemuck::pod_read_unaligned(&bytes[offset..offset + HEADER_SIZE]);
    let size = header.byte_size as usize;
    if size < HEADER_SIZE {
        return Err(StreamError::InvalidRecordSize {
            offset,
            byte_size: header.byte_size,
        });
    }
    if size > remaining {
        return Err(StreamError::Overrun {
            offset,
            byte_size: header.byte_size,
            remaining,
        });
    }

    let payload = &bytes[offset + HEADER_SIZE..offset + size];
    let Some(kind) = RecordKind::from_raw(header.kind) else {
        if header.kind >= CUSTOM_KIND_BASE {
            return Ok((
                Record::Custom {
                    kind: header.kind,
                    payload,
                },
                size,
            ));
        }
        return Err(StreamError::UnknownKind {
            offset,
            kind: header.kind,
        });
    };

    if size != kind.record_size() {
        return Err(StreamError::SizeMismatch {
            offset,
            kind,
            expected: kind.record_size(),
            actual: size,
        });
    }

    let record = match kind {
        RecordKind::EndMarker => Record::EndMarker,
        RecordKind::SetBlendMode => {
            let p: BlendModePayload = bytemuck::pod_read_unaligned(payload);
            Record::SetBlendMode(BlendMode(p.mode))
        }
        RecordKind::SetTexture => {
            let p: SetTexturePayload = bytemuck::pod_read_unaligned(payload);
            Record::SetTexture {
                slot: p.slot,
                texture: TextureHandle(p.texture),
                filter: TextureFilter(p.filter),
                wrap: p.wrap != 0,
            }
        }
        RecordKind::SetVertexBuffer => {
            let p: SetVertexBufferPayload = bytemuck::pod_read_unaligned(payload);
            Record::SetVertexBuffer(VertexBufferId(p.vertex_buffer))
        }
        RecordKind::DrawIndexed => {
            let p: DrawIndexedPayload = bytemuck::pod_read_unaligned(payload);
            Record::DrawIndexed {
                index_buffer: IndexBufferId(p.index_buffer),
                start_index: p.start_index,
                primitive_count: p.primitive_count,
            }
        }
        RecordKind::DrawCall => {
            let p: DrawCallPayload = bytemuck::pod_read_unaligned(payload);
            Record::DrawCall(p.into())
        }
    };
    Ok((record, size))
}

/// An iterator over the records of a finalized stream.
///
/// Yields every record before the end marker, then stops. A structural error is
/// yielded once, after which the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> RecordReader<'a> {
    /// Creates a reader positioned at offset 0 of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            done: false,
        }
    }

    /// Returns the offset of the next record to be read.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for RecordReader<'a> {
    type Item = Result<(usize, Record<'a>), StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match decode_record(self.bytes, self.offset) {
            Ok((Record::EndMarker, size)) => {
                self.offset += size;
                self.done = true;
                None
            }
            Ok((record, size)) => {
                let at = self.offset;
                self.offset += size;
                Some(Ok((at, record)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(kind: u16, byte_size: u16) -> Vec<u8> {
        bytemuck::bytes_of(&RecordHeader { kind, byte_size }).to_vec()
    }

    #[test]
    fn record_sizes_match_layout() {
        assert_eq!(HEADER_SIZE, 4);
        assert_eq!(RecordKind::EndMarker.record_size(), END_MARKER_SIZE);
        assert_eq!(RecordKind::SetBlendMode.record_size(), 8);
        assert_eq!(RecordKind::SetTexture.record_size(), 20);
        assert_eq!(RecordKind::SetVertexBuffer.record_size(), 8);
        assert_eq!(RecordKind::DrawIndexed.record_size(), 16);
        assert_eq!(RecordKind::DrawCall.record_size(), 4 + Mat4::BYTE_SIZE + 20);
    }

    #[test]
    fn raw_kinds_round_trip() {
        for raw in 0..=5u16 {
            let kind = RecordKind::from_raw(raw).expect("built-in kind");
            assert_eq!(kind.raw(), raw);
        }
        assert_eq!(RecordKind::from_raw(6), None);
        assert_eq!(RecordKind::from_raw(CUSTOM_KIND_BASE), None);
    }

    #[test]
    fn decodes_end_marker() {
        let bytes = header_bytes(0, END_MARKER_SIZE as u16);
        assert_eq!(
            decode_record(&bytes, 0),
            Ok((Record::EndMarker, END_MARKER_SIZE))
        );
    }

    #[test]
    fn decodes_at_unaligned_offset() {
        let mut bytes = vec![0xAA];
        bytes.extend(header_bytes(RecordKind::SetBlendMode.raw(), 8));
        bytes.extend(7u32.to_ne_bytes());

        let (record, size) = decode_record(&bytes, 1).unwrap();
        assert_eq!(record, Record::SetBlendMode(BlendMode(7)));
        assert_eq!(size, 8);
    }

    #[test]
    fn zero_size_is_rejected_instead_of_stalling() {
        let bytes = header_bytes(RecordKind::SetBlendMode.raw(), 0);
        assert_eq!(
            decode_record(&bytes, 0),
            Err(StreamError::InvalidRecordSize {
                offset: 0,
                byte_size: 0
            })
        );
    }

    #[test]
    fn zeroed_memory_is_not_a_valid_end_marker() {
        let bytes = [0u8; 16];
        assert!(matches!(
            decode_record(&bytes, 0),
            Err(StreamError::InvalidRecordSize { .. })
        ));
    }

    #[test]
    fn overrun_and_truncation_are_detected() {
        let bytes = header_bytes(RecordKind::DrawIndexed.raw(), 16);
        assert_eq!(
            decode_record(&bytes, 0),
            Err(StreamError::Overrun {
                offset: 0,
                byte_size: 16,
                remaining: 4
            })
        );

        assert_eq!(
            decode_record(&bytes[..2], 0),
            Err(StreamError::Truncated { offset: 0 })
        );
        assert_eq!(
            decode_record(&bytes, 4),
            Err(StreamError::MissingEndMarker { offset: 4 })
        );
    }

    #[test]
    fn size_mismatch_on_built_in_kind() {
        let mut bytes = header_bytes(RecordKind::SetBlendMode.raw(), 12);
        bytes.extend([0u8; 8]);
        assert!(matches!(
            decode_record(&bytes, 0),
            Err(StreamError::SizeMismatch {
                kind: RecordKind::SetBlendMode,
                expected: 8,
                actual: 12,
                ..
            })
        ));
    }

    #[test]
    fn unknown_and_custom_kinds() {
        let bytes = header_bytes(0x0042, 4);
        assert_eq!(
            decode_record(&bytes, 0),
            Err(StreamError::UnknownKind {
                offset: 0,
                kind: 0x0042
            })
        );

        let mut bytes = header_bytes(CUSTOM_KIND_BASE + 1, 7);
        bytes.extend([1, 2, 3]);
        assert_eq!(
            decode_record(&bytes, 0),
            Ok((
                Record::Custom {
                    kind: CUSTOM_KIND_BASE + 1,
                    payload: &[1, 2, 3]
                },
                7
            ))
        );
    }

    #[test]
    fn reader_stops_at_end_marker() {
        let mut bytes = header_bytes(RecordKind::SetVertexBuffer.raw(), 8);
        bytes.extend(3u32.to_ne_bytes());
        bytes.extend(header_bytes(RecordKind::EndMarker.raw(), 4));
        // Stale bytes after the marker must never be read.
        bytes.extend([0xFF; 8]);

        let mut reader = RecordReader::new(&bytes);
        assert_eq!(
            reader.next(),
            Some(Ok((0, Record::SetVertexBuffer(VertexBufferId(3)))))
        );
        assert_eq!(reader.next(), None);
        assert_eq!(reader.offset(), 12);
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn reader_yields_error_once() {
        let bytes = header_bytes(0x0042, 4);
        let results: Vec<_> = RecordReader::new(&bytes).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }
}
