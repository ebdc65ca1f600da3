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

// Quill Sandbox
// Records a few spinning quads per frame on the main thread and replays them
// on a render thread through the frame pipeline.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use quill_core::renderer::{
    BlendMode, IndexBufferId, TextureFilter, TextureHandle, VertexBufferId,
};
use quill_core::{Mat4, RenderDriver};
use quill_stream::pipeline::{self, FrameRecorder};
use quill_stream::{RecordCommands, ReplayError, StreamConfig, SwapError};

const QUAD_VERTICES: VertexBufferId = VertexBufferId(1);
const QUAD_INDICES: IndexBufferId = IndexBufferId(2);
const QUAD_TRIANGLES: u32 = 2;

#[derive(Debug, Parser)]
#[command(about = "Drive a deferred command stream across two threads")]
struct Args {
    /// Number of frames to record.
    #[arg(long, default_value_t = 120)]
    frames: u32,
    /// Quads drawn per frame.
    #[arg(long, default_value_t = 16)]
    quads: u32,
    /// Stream configuration as JSON. Overrides `--capacity` and `--buffers`.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Capacity of each buffer in bytes.
    #[arg(long, default_value_t = quill_stream::DEFAULT_BUFFER_CAPACITY)]
    capacity: usize,
    /// Number of buffers in the pool.
    #[arg(long, default_value_t = quill_stream::DEFAULT_BUFFER_COUNT)]
    buffers: usize,
}

/// A driver that only counts what it is asked to do.
#[derive(Debug, Default)]
struct CountingDriver {
    state_changes: u64,
    draws: u64,
    triangles: u64,
}

impl RenderDriver for CountingDriver {
    fn set_blend_mode(&mut self, mode: BlendMode) {
        log::trace!("blend mode {mode:?}");
        self.state_changes += 1;
    }

    fn set_texture(&mut self, slot: u32, texture: TextureHandle, _: TextureFilter, _: bool) {
        log::trace!("texture {texture:?} -> slot {slot}");
        self.state_changes += 1;
    }

    fn bind_vertex_buffer(&mut self, _: VertexBufferId) {
        self.state_changes += 1;
    }

    fn set_world_matrix(&mut self, _: &Mat4) {
        self.state_changes += 1;
    }

    fn render_indexed_triangles(&mut self, _: IndexBufferId, _: u32, primitive_count: u32) {
        self.draws += 1;
        self.triangles += u64::from(primitive_count);
    }
}

fn load_config(args: &Args) -> Result<StreamConfig> {
    let config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            StreamConfig::from_json_str(&json)?
        }
        None => StreamConfig::new(args.capacity, args.buffers),
    };
    config.validate()?;
    Ok(config)
}

fn record_frame(recorder: &mut FrameRecorder, frame: u32, quads: u32) {
    recorder.set_blend_mode(if frame % 2 == 0 {
        BlendMode::OPAQUE
    } else {
        BlendMode::ALPHA
    });

    for quad in 0..quads {
        let angle = (frame as f32 * 0.05) + quad as f32;
        let world =
            Mat4::from_translation([quad as f32, 0.0, 0.0]) * Mat4::from_rotation_z(angle);
        recorder.draw_call(
            &world,
            TextureHandle(quad % 4),
            QUAD_VERTICES,
            QUAD_INDICES,
            0,
            QUAD_TRIANGLES,
        );
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;
    log::info!(
        "Streaming {} frames through {} buffers of {} bytes",
        args.frames,
        config.buffer_count,
        config.buffer_capacity
    );

    let (mut recorder, mut replayer) = pipeline::channel(&config, CountingDriver::default())?;

    let render_thread = thread::spawn(move || -> Result<CountingDriver> {
        loop {
            match replayer.replay_timeout(Duration::from_millis(100)) {
                Ok(Some(report)) => log::debug!(
                    "Replayed frame {} from slot {}: {} records",
                    report.frame,
                    report.slot,
                    report.stats.records_dispatched
                ),
                Ok(None) => continue,
                Err(ReplayError::Disconnected) => break,
                Err(e) => return Err(e.into()),
            }
        }
        log::info!("Render thread done after {} frames", replayer.frames_replayed());
        Ok(replayer.into_driver())
    });

    let mut dropped = 0;
    let mut stalls = 0u64;
    for frame in 0..args.frames {
        record_frame(&mut recorder, frame, args.quads);
        let report = loop {
            match recorder.finalize() {
                Ok(report) => break report,
                Err(SwapError::ConsumerBehind) => {
                    stalls += 1;
                    thread::yield_now();
                }
                Err(e @ SwapError::Disconnected) => return Err(e.into()),
            }
        };
        dropped += report.stats.commands_dropped;
        if frame % 30 == 0 {
            log::info!(
                "Frame {}: {} commands, {:.1}% of slot {} used",
                report.frame,
                report.stats.commands_recorded,
                report.stats.utilization() * 100.0,
                report.slot
            );
        }
    }
    drop(recorder);

    let driver = render_thread
        .join()
        .map_err(|_| anyhow::anyhow!("render thread panicked"))??;

    if dropped > 0 {
        log::warn!("{dropped} commands were dropped; consider a larger --capacity");
    }
    println!(
        "{} frames: {} draws, {} triangles, {} state changes, {} producer stalls",
        args.frames, driver.draws, driver.triangles, driver.state_changes, stalls
    );
    Ok(())
}
