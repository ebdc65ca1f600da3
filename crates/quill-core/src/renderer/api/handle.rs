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

//! Opaque, non-owning handles to resources referenced by recorded commands.
//!
//! The command stream never creates or destroys the resources behind these
//! handles. Whoever records a command guarantees that the resource stays alive
//! until that command has been replayed.

/// An opaque handle to a texture owned by the graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u32);

/// An opaque handle to a vertex buffer owned by the graphics backend.
///
/// Binding it through [`RenderDriver::bind_vertex_buffer`](crate::RenderDriver::bind_vertex_buffer)
/// makes it the active geometry source for subsequent indexed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexBufferId(pub u32);

/// An opaque handle to an index buffer owned by the graphics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexBufferId(pub u32);
