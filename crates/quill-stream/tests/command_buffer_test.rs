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

use quill_core::renderer::{
    BlendMode, DriverCall, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId,
};
use quill_core::{Mat4, RecordingDriver, RenderDriver};
use quill_stream::format::RecordHeader;
use quill_stream::{
    CommandBuffer, Record, RecordCommands, RecordKind, RecordReader, StreamConfig, StreamError,
    CUSTOM_KIND_BASE, END_MARKER_SIZE,
};

fn command_buffer(capacity: usize, count: usize) -> CommandBuffer<RecordingDriver> {
    CommandBuffer::new(RecordingDriver::new(), &StreamConfig::new(capacity, count))
        .expect("test configuration should be valid")
}

#[test]
fn test_blend_then_texture_scenario() {
    // --- 1. ARRANGE ---
    let mut commands = command_buffer(1024, 2);

    // --- 2. ACT ---
    commands.set_blend_mode(BlendMode(3));
    commands.set_texture(0, TextureHandle(42), TextureFilter(1), true);
    commands.finalize();
    let stats = commands.replay().expect("stream should replay");

    // --- 3. ASSERT ---
    assert_eq!(stats.records_dispatched, 2);
    assert_eq!(
        commands.driver().calls(),
        &[
            DriverCall::SetBlendMode(BlendMode(3)),
            DriverCall::SetTexture {
                slot: 0,
                texture: TextureHandle(42),
                filter: TextureFilter(1),
                wrap: true,
            },
        ],
        "Driver should receive exactly the two recorded calls, in order"
    );
}

#[test]
fn test_draw_call_scenario() {
    // --- 1. ARRANGE ---
    let mut commands = command_buffer(1024, 2);
    let world = Mat4::from_translation([1.0, 2.0, 3.0]);

    // --- 2. ACT ---
    commands.draw_call(
        &world,
        TextureHandle(7),
        VertexBufferId(0xA),
        IndexBufferId(0xB),
        0,
        100,
    );
    commands.execute().expect("stream should replay");

    // --- 3. ASSERT ---
    assert_eq!(
        commands.driver().calls(),
        &[
            DriverCall::SetTexture {
                slot: 0,
                texture: TextureHandle(7),
                filter: TextureFilter::DEFAULT,
                wrap: true,
            },
            DriverCall::BindVertexBuffer(VertexBufferId(0xA)),
            DriverCall::SetWorldMatrix(world),
            DriverCall::RenderIndexedTriangles {
                index_buffer: IndexBufferId(0xB),
                start_index: 0,
                primitive_count: 100,
            },
        ]
    );
}

#[test]
fn test_every_kind_replays_in_recorded_order() {
    let mut commands = command_buffer(4096, 2);
    let world = Mat4::from_scale([2.0, 2.0, 2.0]);

    commands.set_vertex_buffer(VertexBufferId(5));
    commands.draw_indexed(IndexBufferId(6), 12, 30);
    commands.set_blend_mode(BlendMode::ADDITIVE);
    commands.draw_call(
        &world,
        TextureHandle(1),
        VertexBufferId(2),
        IndexBufferId(3),
        4,
        5,
    );
    commands.set_texture(3, TextureHandle(9), TextureFilter::TRILINEAR, false);
    commands.execute().unwrap();

    let expected = vec![
        DriverCall::BindVertexBuffer(VertexBufferId(5)),
        DriverCall::RenderIndexedTriangles {
            index_buffer: IndexBufferId(6),
            start_index: 12,
            primitive_count: 30,
        },
        DriverCall::SetBlendMode(BlendMode::ADDITIVE),
        DriverCall::SetTexture {
            slot: 0,
            texture: TextureHandle(1),
            filter: TextureFilter::DEFAULT,
            wrap: true,
        },
        DriverCall::BindVertexBuffer(VertexBufferId(2)),
        DriverCall::SetWorldMatrix(world),
        DriverCall::RenderIndexedTriangles {
            index_buffer: IndexBufferId(3),
            start_index: 4,
            primitive_count: 5,
        },
        DriverCall::SetTexture {
            slot: 3,
            texture: TextureHandle(9),
            filter: TextureFilter::TRILINEAR,
            wrap: false,
        },
    ];
    assert_eq!(commands.driver().calls(), expected.as_slice());
}

#[test]
fn test_long_sequence_has_no_omissions_or_duplicates() {
    let mut commands = command_buffer(64 * 1024, 2);

    for i in 0..500 {
        assert!(commands.set_blend_mode(BlendMode(i)));
    }
    let stats = commands.execute().unwrap();

    assert_eq!(stats.records_dispatched, 500);
    let modes: Vec<u32> = commands
        .driver()
        .calls()
        .iter()
        .map(|call| match call {
            DriverCall::SetBlendMode(mode) => mode.0,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(modes, (0..500).collect::<Vec<_>>());
}

#[test]
fn test_capacity_boundary_drops_and_stays_well_formed() {
    // --- 1. ARRANGE ---
    // Room for exactly three blend records plus the end marker.
    let record = RecordKind::SetBlendMode.record_size();
    let mut commands = command_buffer(3 * record + END_MARKER_SIZE, 2);

    // --- 2. ACT ---
    let accepted: Vec<bool> = (0..5)
        .map(|i| commands.set_blend_mode(BlendMode(i)))
        .collect();
    let cursor_when_full = commands.write_cursor();
    let stats = commands.finalize();

    // --- 3. ASSERT ---
    assert_eq!(accepted, vec![true, true, true, false, false]);
    assert_eq!(cursor_when_full, 3 * record, "Dropped commands must not move the cursor");
    assert_eq!(stats.commands_recorded, 3);
    assert_eq!(stats.commands_dropped, 2);
    assert_eq!(stats.bytes_used, stats.capacity, "End marker should fill the headroom exactly");

    let replay = commands.replay().expect("a buffer with drops is still well-formed");
    assert_eq!(replay.records_dispatched, 3);
    assert_eq!(replay.bytes_consumed, stats.bytes_used);
}

#[test]
fn test_record_larger_than_buffer_is_dropped() {
    let mut commands = command_buffer(RecordKind::DrawCall.record_size(), 2);

    let accepted = commands.draw_call(
        &Mat4::IDENTITY,
        TextureHandle(1),
        VertexBufferId(1),
        IndexBufferId(1),
        0,
        1,
    );
    assert!(!accepted, "DrawCall plus end marker does not fit");

    commands.execute().unwrap();
    assert!(commands.driver().calls().is_empty());
}

#[test]
fn test_empty_buffer_terminates_immediately() {
    let mut commands = command_buffer(64, 2);

    let stats = commands.finalize();
    assert_eq!(stats.bytes_used, END_MARKER_SIZE);

    let replay = commands.replay().unwrap();
    assert_eq!(replay.records_dispatched, 0);
    assert_eq!(replay.bytes_consumed, END_MARKER_SIZE);
    assert!(commands.driver().calls().is_empty());
}

#[test]
fn test_end_marker_is_last_and_unique() {
    let mut commands = command_buffer(256, 2);
    commands.set_blend_mode(BlendMode::ALPHA);
    commands.set_vertex_buffer(VertexBufferId(3));
    commands.finalize();

    let stream = commands.finalized_stream().unwrap();
    let mut reader = RecordReader::new(stream);
    let records: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();

    assert_eq!(records.len(), 2, "Both commands precede the end marker");
    assert_eq!(records[1].1, Record::SetVertexBuffer(VertexBufferId(3)));
    // The reader stopped on the end marker, which is the last thing in the stream.
    assert_eq!(reader.offset(), stream.len());
    let tail = &stream[stream.len() - END_MARKER_SIZE..];
    let marker: RecordHeader = bytemuck::pod_read_unaligned(tail);
    assert_eq!(
        marker,
        RecordHeader {
            kind: RecordKind::EndMarker.raw(),
            byte_size: END_MARKER_SIZE as u16,
        }
    );
}

#[test]
fn test_write_index_cycles_through_the_pool() {
    for count in [2, 3, 5] {
        let mut commands = command_buffer(64, count);
        let start = commands.write_index();

        let mut visited = Vec::new();
        for _ in 0..count {
            let before = commands.write_index();
            commands.finalize();
            assert_eq!(commands.read_index(), before);
            visited.push(before);
        }

        assert_eq!(commands.write_index(), start, "pool of {count} should wrap around");
        visited.sort_unstable();
        assert_eq!(visited, (0..count).collect::<Vec<_>>(), "every slot is used once");
    }
}

#[test]
fn test_each_pass_replays_only_its_own_commands() {
    let mut commands = command_buffer(256, 2);

    for frame in 0..4 {
        commands.set_blend_mode(BlendMode(frame));
        commands.execute().unwrap();
        let calls = commands.driver_mut().take_calls();
        assert_eq!(calls, vec![DriverCall::SetBlendMode(BlendMode(frame))]);
    }
}

#[test]
fn test_registered_custom_command_round_trip() {
    // --- 1. ARRANGE ---
    let kind = CUSTOM_KIND_BASE + 1;
    let mut commands = command_buffer(256, 2);
    commands
        .registry_mut()
        .register(kind, |payload: &[u8], driver: &mut dyn RenderDriver| {
            let mode: u32 = bytemuck::pod_read_unaligned(&payload[..4]);
            driver.set_blend_mode(BlendMode(mode));
        })
        .expect("custom kind should register");

    // --- 2. ACT ---
    assert!(commands.custom_record(kind, &77u32));
    commands.set_blend_mode(BlendMode(1));
    commands.execute().unwrap();

    // --- 3. ASSERT ---
    assert_eq!(
        commands.driver().calls(),
        &[
            DriverCall::SetBlendMode(BlendMode(77)),
            DriverCall::SetBlendMode(BlendMode(1)),
        ]
    );
}

#[test]
fn test_unregistered_custom_command_stops_replay() {
    let mut commands = command_buffer(256, 2);
    commands.set_blend_mode(BlendMode(1));
    commands.custom_command(CUSTOM_KIND_BASE + 9, 8).unwrap();
    commands.set_blend_mode(BlendMode(2));
    commands.finalize();

    let err = commands.replay().unwrap_err();

    assert_eq!(
        err,
        StreamError::UnknownKind {
            offset: RecordKind::SetBlendMode.record_size(),
            kind: CUSTOM_KIND_BASE + 9,
        }
    );
    assert_eq!(
        commands.driver().calls(),
        &[DriverCall::SetBlendMode(BlendMode(1))],
        "Records before the violation are dispatched, nothing after it"
    );
}
