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

//! Construction-time settings for a command stream.

use crate::error::ConfigError;
use crate::format::END_MARKER_SIZE;
use serde::{Deserialize, Serialize};

/// The default capacity of each stream buffer, in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// The default number of buffers in the pool (one recording, one replaying).
pub const DEFAULT_BUFFER_COUNT: usize = 2;

/// Settings fixed when a command stream is created.
///
/// Neither value can change afterwards: the buffers are allocated once and never
/// grown. The end marker size is not configurable; it is a property of the
/// record format ([`END_MARKER_SIZE`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// The capacity of each buffer in bytes, including the end marker headroom.
    pub buffer_capacity: usize,
    /// The number of buffers in the pool. Must be at least 2.
    pub buffer_count: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            buffer_count: DEFAULT_BUFFER_COUNT,
        }
    }
}

impl StreamConfig {
    /// Creates a configuration with the given capacity and buffer count.
    pub fn new(buffer_capacity: usize, buffer_count: usize) -> Self {
        Self {
            buffer_capacity,
            buffer_count,
        }
    }

    /// Parses a configuration from JSON and validates it.
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that a stream can be built from this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_count < 2 {
            return Err(ConfigError::TooFewBuffers {
                count: self.buffer_count,
            });
        }
        if self.buffer_capacity < END_MARKER_SIZE {
            return Err(ConfigError::CapacityTooSmall {
                capacity: self.buffer_capacity,
                minimum: END_MARKER_SIZE,
            });
        }
        Ok(())
    }
}
