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

//! Command encoders shared by every recording front-end.
//!
//! Both the single-object [`CommandBuffer`](crate::CommandBuffer) and the
//! threaded [`FrameRecorder`](crate::pipeline::FrameRecorder) record through
//! [`RecordCommands`]. They only provide the allocation step; the encoders
//! themselves are the provided methods of the trait.

use crate::format::{
    BlendModePayload, DrawCallPayload, DrawIndexedPayload, RecordKind, SetTexturePayload,
    SetVertexBufferPayload, CUSTOM_KIND_BASE,
};
use bytemuck::Pod;
use quill_core::math::Mat4;
use quill_core::renderer::{
    BlendMode, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId,
};

/// Records commands into the current write buffer of a stream.
///
/// Every encoder requests a region sized exactly for its record. When the
/// buffer is full the command is dropped: nothing is written, nothing blocks,
/// and the encoder returns `false`. The return value exists for observability
/// only; callers are free to ignore it.
///
/// Arguments are not validated. Slots, filters, and handles are transported as
/// given and interpreted by the [`RenderDriver`](quill_core::RenderDriver) at
/// replay time.
pub trait RecordCommands {
    /// Reserves a record of `kind` with `payload_len` payload bytes in the write
    /// buffer, writes its header, and returns the payload region.
    ///
    /// Returns `None` when the record does not fit.
    fn allocate_record(&mut self, kind: u16, payload_len: usize) -> Option<&mut [u8]>;

    /// Records a blend mode change.
    fn set_blend_mode(&mut self, mode: BlendMode) -> bool {
        write_record(
            self,
            RecordKind::SetBlendMode,
            &BlendModePayload { mode: mode.0 },
        )
    }

    /// Records a texture bind to `slot`.
    fn set_texture(
        &mut self,
        slot: u32,
        texture: TextureHandle,
        filter: TextureFilter,
        wrap: bool,
    ) -> bool {
        write_record(
            self,
            RecordKind::SetTexture,
            &SetTexturePayload {
                slot,
                texture: texture.0,
                filter: filter.0,
                wrap: wrap as u32,
            },
        )
    }

    /// Records a vertex buffer bind.
    fn set_vertex_buffer(&mut self, vertex_buffer: VertexBufferId) -> bool {
        write_record(
            self,
            RecordKind::SetVertexBuffer,
            &SetVertexBufferPayload {
                vertex_buffer: vertex_buffer.0,
            },
        )
    }

    /// Records an indexed draw from the currently bound vertex buffer.
    fn draw_indexed(
        &mut self,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    ) -> bool {
        write_record(
            self,
            RecordKind::DrawIndexed,
            &DrawIndexedPayload {
                index_buffer: index_buffer.0,
                start_index,
                primitive_count,
            },
        )
    }

    /// Records a bundled draw: texture on slot 0, vertex buffer, world transform,
    /// then an indexed draw, all in one record.
    fn draw_call(
        &mut self,
        world: &Mat4,
        texture: TextureHandle,
        vertex_buffer: VertexBufferId,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    ) -> bool {
        write_record(
            self,
            RecordKind::DrawCall,
            &DrawCallPayload {
                world: *world,
                texture: texture.0,
                vertex_buffer: vertex_buffer.0,
                index_buffer: index_buffer.0,
                start_index,
                primitive_count,
            },
        )
    }

    /// Reserves a custom record and returns its zeroed payload for the caller to
    /// fill.
    ///
    /// `kind` must be at or above [`CUSTOM_KIND_BASE`]; replaying it requires a
    /// handler registered in the replaying side's
    /// [`CommandRegistry`](crate::CommandRegistry).
    fn custom_command(&mut self, kind: u16, payload_len: usize) -> Option<&mut [u8]> {
        if kind < CUSTOM_KIND_BASE {
            log::warn!("Refusing custom command with reserved kind {kind:#06x}");
            return None;
        }
        let payload = self.allocate_record(kind, payload_len)?;
        payload.fill(0);
        Some(payload)
    }

    /// Records a custom command whose payload is a plain-old-data value.
    fn custom_record<P: Pod>(&mut self, kind: u16, payload: &P) -> bool
    where
        Self: Sized,
    {
        match self.custom_command(kind, std::mem::size_of::<P>()) {
            Some(region) => {
                region.copy_from_slice(bytemuck::bytes_of(payload));
                true
            }
            None => false,
        }
    }
}

fn write_record<R, P>(recorder: &mut R, kind: RecordKind, payload: &P) -> bool
where
    R: RecordCommands + ?Sized,
    P: Pod,
{
    match recorder.allocate_record(kind.raw(), kind.payload_size()) {
        Some(region) => {
            region.copy_from_slice(bytemuck::bytes_of(payload));
            true
        }
        None => false,
    }
}
