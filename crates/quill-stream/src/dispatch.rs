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

//! The replay loop that walks a finalized stream and drives the backend.
//!
//! The loop has two states. While `Scanning`, it decodes the record at the
//! current offset, dispatches it, and advances by the record's declared size.
//! The end marker moves it to `Terminated`, which ends the pass. Any structural
//! violation ends the pass immediately with an error: once one record is
//! untrusted, the offset of every following record is too.

use crate::error::StreamError;
use crate::format::{decode_record, Record};
use crate::registry::CommandRegistry;
use crate::stats::ReplayStats;
use quill_core::renderer::{TextureFilter, DEFAULT_TEXTURE_WRAP, DRAW_CALL_TEXTURE_SLOT};
use quill_core::RenderDriver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Terminated,
}

/// Replays the finalized stream in `bytes` into `driver`.
///
/// Records are dispatched in the order they were recorded. Custom kinds are
/// looked up in `registry`.
///
/// ## Errors
/// Returns the first [`StreamError`] found. Records before it have already been
/// dispatched; nothing after it is.
pub fn replay_stream(
    bytes: &[u8],
    driver: &mut dyn RenderDriver,
    registry: &CommandRegistry,
) -> Result<ReplayStats, StreamError> {
    let mut state = ScanState::Scanning;
    let mut offset = 0;
    let mut stats = ReplayStats::default();

    while state == ScanState::Scanning {
        let (record, size) = decode_record(bytes, offset).map_err(|e| {
            log::error!("Command stream corrupted, aborting replay: {e}");
            e
        })?;

        match record {
            Record::EndMarker => state = ScanState::Terminated,
            record => {
                dispatch_record(offset, record, driver, registry)?;
                stats.records_dispatched += 1;
            }
        }
        offset += size;
    }

    stats.bytes_consumed = offset;
    log::trace!(
        "Replayed {} records ({} bytes)",
        stats.records_dispatched,
        stats.bytes_consumed
    );
    Ok(stats)
}

/// Forwards one decoded record to the driver.
fn dispatch_record(
    offset: usize,
    record: Record<'_>,
    driver: &mut dyn RenderDriver,
    registry: &CommandRegistry,
) -> Result<(), StreamError> {
    match record {
        Record::SetBlendMode(mode) => driver.set_blend_mode(mode),
        Record::SetTexture {
            slot,
            texture,
            filter,
            wrap,
        } => driver.set_texture(slot, texture, filter, wrap),
        Record::SetVertexBuffer(vertex_buffer) => driver.bind_vertex_buffer(vertex_buffer),
        Record::DrawIndexed {
            index_buffer,
            start_index,
            primitive_count,
        } => driver.render_indexed_triangles(index_buffer, start_index, primitive_count),
        Record::DrawCall(call) => {
            driver.set_texture(
                DRAW_CALL_TEXTURE_SLOT,
                call.texture,
                TextureFilter::DEFAULT,
                DEFAULT_TEXTURE_WRAP,
            );
            driver.bind_vertex_buffer(call.vertex_buffer);
            driver.set_world_matrix(&call.world);
            driver.render_indexed_triangles(
                call.index_buffer,
                call.start_index,
                call.primitive_count,
            );
        }
        Record::Custom { kind, payload } => match registry.get(kind) {
            Some(handler) => handler.execute(payload, driver),
            None => {
                let err = StreamError::UnknownKind { offset, kind };
                log::error!("Command stream corrupted, aborting replay: {err}");
                return Err(err);
            }
        },
        // Handled by the scan loop.
        Record::EndMarker => {}
    }
    Ok(())
}
