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

//! Counters describing one recording pass and one replay.

/// Statistics of one recording pass, from the last reset to its finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    /// Commands written into the buffer.
    pub commands_recorded: u32,
    /// Commands dropped because the buffer was full.
    pub commands_dropped: u32,
    /// Bytes written, including the end marker once finalized.
    pub bytes_used: usize,
    /// The capacity of the buffer.
    pub capacity: usize,
}

impl StreamStats {
    /// Returns the fraction of the buffer in use, in `[0.0, 1.0]`.
    pub fn utilization(&self) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.bytes_used as f32 / self.capacity as f32
    }
}

/// Statistics of one replay pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplayStats {
    /// Records dispatched to the driver, not counting the end marker.
    pub records_dispatched: usize,
    /// Bytes scanned, end marker included.
    pub bytes_consumed: usize,
}
