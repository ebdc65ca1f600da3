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

//! Render state identifiers carried by state-change commands.
//!
//! These are plain integer identifiers rather than closed enums: the command
//! stream does not validate them, it only transports them. Interpreting an
//! unknown value is the backend's job at replay time.

/// Identifies a blend mode understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlendMode(pub u32);

impl BlendMode {
    /// Blending disabled; the source overwrites the destination.
    pub const OPAQUE: Self = Self(0);
    /// Standard alpha blending.
    pub const ALPHA: Self = Self(1);
    /// Additive blending.
    pub const ADDITIVE: Self = Self(2);
    /// Alpha-tested cut-out geometry.
    pub const ALPHA_TEST: Self = Self(3);
}

/// Identifies a texture filtering mode understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFilter(pub u32);

impl TextureFilter {
    /// Point sampling. Returns the value of the nearest texel.
    pub const POINT: Self = Self(0);
    /// Bilinear interpolation.
    pub const BILINEAR: Self = Self(1);
    /// Trilinear interpolation across mip levels.
    pub const TRILINEAR: Self = Self(2);

    /// The filter used when a command does not carry its own filtering mode.
    pub const DEFAULT: Self = Self::POINT;
}

/// The texture slot bound by bundled draw calls.
pub const DRAW_CALL_TEXTURE_SLOT: u32 = 0;

/// The wrap flag used when a command does not carry its own wrap setting.
pub const DEFAULT_TEXTURE_WRAP: bool = true;
