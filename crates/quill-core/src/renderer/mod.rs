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

//! Provides the backend-agnostic contracts the command stream replays into.
//!
//! This module defines the "common language" between the producer that records
//! commands and the graphics backend that finally executes them. It contains the
//! [`RenderDriver`] trait, the opaque handles stored inside recorded commands, and
//! a headless [`RecordingDriver`] that captures calls instead of issuing them.
//!
//! The 'how' of rendering is left to a concrete backend implementing
//! [`RenderDriver`]; the command stream only decides 'when'.

pub mod api;
pub mod recording;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::api::*;
pub use self::recording::{DriverCall, RecordingDriver};
pub use self::traits::RenderDriver;
