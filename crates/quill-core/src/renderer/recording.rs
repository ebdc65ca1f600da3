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

//! A headless [`RenderDriver`] that records every call it receives.
//!
//! Useful wherever a replayed stream must be inspected rather than executed:
//! unit tests, integration tests, and tooling that dumps a frame's commands.

use crate::math::Mat4;
use crate::renderer::api::{BlendMode, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId};
use crate::renderer::traits::RenderDriver;

/// One call received by a [`RecordingDriver`], with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverCall {
    /// [`RenderDriver::set_blend_mode`] was called.
    SetBlendMode(BlendMode),
    /// [`RenderDriver::set_texture`] was called.
    SetTexture {
        /// The sampler slot.
        slot: u32,
        /// The bound texture.
        texture: TextureHandle,
        /// The filtering mode.
        filter: TextureFilter,
        /// Whether texture coordinates wrap.
        wrap: bool,
    },
    /// [`RenderDriver::bind_vertex_buffer`] was called.
    BindVertexBuffer(VertexBufferId),
    /// [`RenderDriver::set_world_matrix`] was called.
    SetWorldMatrix(Mat4),
    /// [`RenderDriver::render_indexed_triangles`] was called.
    RenderIndexedTriangles {
        /// The index buffer drawn from.
        index_buffer: IndexBufferId,
        /// The first index read.
        start_index: u32,
        /// The number of triangles drawn.
        primitive_count: u32,
    },
}

/// A [`RenderDriver`] that stores each call in order instead of executing it.
#[derive(Debug, Default, Clone)]
pub struct RecordingDriver {
    calls: Vec<DriverCall>,
}

impl RecordingDriver {
    /// Creates an empty recording driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every call received so far, in the order it was received.
    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    /// Removes and returns every call received so far.
    pub fn take_calls(&mut self) -> Vec<DriverCall> {
        std::mem::take(&mut self.calls)
    }

    /// Returns the number of draw calls received so far.
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::RenderIndexedTriangles { .. }))
            .count()
    }

    fn push(&mut self, call: DriverCall) {
        log::trace!("RecordingDriver received {call:?}");
        self.calls.push(call);
    }
}

impl RenderDriver for RecordingDriver {
    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.push(DriverCall::SetBlendMode(mode));
    }

    fn set_texture(
        &mut self,
        slot: u32,
        texture: TextureHandle,
        filter: TextureFilter,
        wrap: bool,
    ) {
        self.push(DriverCall::SetTexture {
            slot,
            texture,
            filter,
            wrap,
        });
    }

    fn bind_vertex_buffer(&mut self, vertex_buffer: VertexBufferId) {
        self.push(DriverCall::BindVertexBuffer(vertex_buffer));
    }

    fn set_world_matrix(&mut self, world: &Mat4) {
        self.push(DriverCall::SetWorldMatrix(*world));
    }

    fn render_indexed_triangles(
        &mut self,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    ) {
        self.push(DriverCall::RenderIndexedTriangles {
            index_buffer,
            start_index,
            primitive_count,
        });
    }
}
