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

use crate::math::Mat4;
use crate::renderer::api::{BlendMode, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId};

/// The device abstraction that executes replayed commands.
///
/// A `RenderDriver` is the consuming end of the command stream. The stream never
/// calls it while commands are being recorded; every call happens during replay,
/// on whichever thread owns the replaying side. Implementations perform the
/// actual state changes and draw submission against a graphics API, or, like
/// [`RecordingDriver`](crate::RecordingDriver), capture the calls for inspection.
///
/// No method reports failure: a replayed stream cannot be partially rolled back,
/// so backends handle their own errors (typically by logging them).
pub trait RenderDriver {
    /// Sets the active blend mode.
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Binds a texture to a sampler slot with the given filtering and wrap settings.
    fn set_texture(&mut self, slot: u32, texture: TextureHandle, filter: TextureFilter, wrap: bool);

    /// Binds a vertex buffer as the active geometry source.
    fn bind_vertex_buffer(&mut self, vertex_buffer: VertexBufferId);

    /// Sets the world transform used by subsequent draws.
    fn set_world_matrix(&mut self, world: &Mat4);

    /// Issues an indexed triangle draw using the currently bound vertex buffer.
    ///
    /// ## Arguments
    /// * `index_buffer` - The index buffer to draw from.
    /// * `start_index` - The first index to read.
    /// * `primitive_count` - The number of triangles to draw.
    fn render_indexed_triangles(
        &mut self,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    );
}

impl<T: RenderDriver + ?Sized> RenderDriver for &mut T {
    fn set_blend_mode(&mut self, mode: BlendMode) {
        (**self).set_blend_mode(mode);
    }

    fn set_texture(
        &mut self,
        slot: u32,
        texture: TextureHandle,
        filter: TextureFilter,
        wrap: bool,
    ) {
        (**self).set_texture(slot, texture, filter, wrap);
    }

    fn bind_vertex_buffer(&mut self, vertex_buffer: VertexBufferId) {
        (**self).bind_vertex_buffer(vertex_buffer);
    }

    fn set_world_matrix(&mut self, world: &Mat4) {
        (**self).set_world_matrix(world);
    }

    fn render_indexed_triangles(
        &mut self,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    ) {
        (**self).render_indexed_triangles(index_buffer, start_index, primitive_count);
    }
}

impl<T: RenderDriver + ?Sized> RenderDriver for Box<T> {
    fn set_blend_mode(&mut self, mode: BlendMode) {
        (**self).set_blend_mode(mode);
    }

    fn set_texture(
        &mut self,
        slot: u32,
        texture: TextureHandle,
        filter: TextureFilter,
        wrap: bool,
    ) {
        (**self).set_texture(slot, texture, filter, wrap);
    }

    fn bind_vertex_buffer(&mut self, vertex_buffer: VertexBufferId) {
        (**self).bind_vertex_buffer(vertex_buffer);
    }

    fn set_world_matrix(&mut self, world: &Mat4) {
        (**self).set_world_matrix(world);
    }

    fn render_indexed_triangles(
        &mut self,
        index_buffer: IndexBufferId,
        start_index: u32,
        primitive_count: u32,
    ) {
        (**self).render_indexed_triangles(index_buffer, start_index, primitive_count);
    }
}
