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

//! Hands finalized command streams from a recording thread to a replaying one.
//!
//! [`channel`] splits a buffer pool into a [`FrameRecorder`] and a
//! [`FrameReplayer`]. The buffers themselves travel between the two halves, so
//! a buffer is only ever visible to one thread at a time:
//!
//! ```text
//!              submit (sealed frames, FIFO)
//! FrameRecorder ---------------------------> FrameReplayer
//!              <---------------------------
//!              recycle (replayed buffers)
//! ```
//!
//! The recorder never waits. When every spare buffer is still queued for
//! replay, [`FrameRecorder::finalize`] reports [`SwapError::ConsumerBehind`]
//! and keeps recording into the current buffer.

use crate::allocator::StreamBuffer;
use crate::config::StreamConfig;
use crate::dispatch::replay_stream;
use crate::encoder::RecordCommands;
use crate::error::{ConfigError, ReplayError, StreamError, SwapError};
use crate::registry::CommandRegistry;
use crate::stats::{ReplayStats, StreamStats};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use quill_core::RenderDriver;
use std::time::Duration;

/// A sealed buffer on its way to the replayer.
#[derive(Debug)]
struct SealedFrame {
    frame: u64,
    buffer: StreamBuffer,
}

/// What the recorder handed over on a successful finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// The frame number, starting at 1.
    pub frame: u64,
    /// The pool slot holding the frame.
    pub slot: usize,
    /// Statistics of the recording pass.
    pub stats: StreamStats,
}

/// What the replayer did with one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// The frame number, as reported by the recorder.
    pub frame: u64,
    /// The pool slot the frame was read from.
    pub slot: usize,
    /// Statistics of the replay pass.
    pub stats: ReplayStats,
}

/// Splits a new buffer pool into its recording and replaying halves.
///
/// ## Errors
/// * [`ConfigError`] if `config` is invalid.
///
/// # Example
///
/// ```
/// use quill_core::renderer::BlendMode;
/// use quill_core::RecordingDriver;
/// use quill_stream::pipeline;
/// use quill_stream::{RecordCommands, StreamConfig};
///
/// let (mut recorder, mut replayer) =
///     pipeline::channel(&StreamConfig::default(), RecordingDriver::new())?;
///
/// recorder.set_blend_mode(BlendMode::ALPHA);
/// let sent = recorder.finalize()?;
///
/// let replayed = replayer.try_replay()?.expect("a frame is queued");
/// assert_eq!(replayed.frame, sent.frame);
/// assert_eq!(replayer.driver().calls().len(), 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn channel<D: RenderDriver>(
    config: &StreamConfig,
    driver: D,
) -> Result<(FrameRecorder, FrameReplayer<D>), ConfigError> {
    config.validate()?;

    let count = config.buffer_count;
    let capacity = config.buffer_capacity;
    let (submit_tx, submit_rx) = crossbeam_channel::bounded(count);
    let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(count);

    // Slot 1 records first; `spare` is popped from the back.
    let spare = std::iter::once(0)
        .chain((2..count).rev())
        .map(|slot| StreamBuffer::new(slot, capacity))
        .collect();

    log::debug!("Frame pipeline created: {count} buffers of {capacity} bytes");

    let recorder = FrameRecorder {
        current: StreamBuffer::new(1, capacity),
        spare,
        submit: submit_tx,
        recycled: recycle_rx,
        frames_finalized: 0,
    };
    let replayer = FrameReplayer {
        submitted: submit_rx,
        recycle: recycle_tx,
        driver,
        registry: CommandRegistry::new(),
        frames_replayed: 0,
    };
    Ok((recorder, replayer))
}

/// The recording half of a frame pipeline.
#[derive(Debug)]
pub struct FrameRecorder {
    current: StreamBuffer,
    /// Buffers that have never been submitted.
    spare: Vec<StreamBuffer>,
    submit: Sender<SealedFrame>,
    recycled: Receiver<StreamBuffer>,
    frames_finalized: u64,
}

impl FrameRecorder {
    /// Seals the current buffer and submits it for replay.
    ///
    /// ## Errors
    /// * [`SwapError::ConsumerBehind`] if no buffer is free to record the next
    ///   frame into. Nothing is sealed and recording may continue.
    /// * [`SwapError::Disconnected`] if the replayer has been dropped.
    pub fn finalize(&mut self) -> Result<FrameReport, SwapError> {
        let mut next = match self.spare.pop() {
            Some(buffer) => buffer,
            None => match self.recycled.try_recv() {
                Ok(buffer) => buffer,
                Err(TryRecvError::Empty) => {
                    log::trace!(
                        "Finalize of slot {} deferred: consumer behind",
                        self.current.slot()
                    );
                    return Err(SwapError::ConsumerBehind);
                }
                Err(TryRecvError::Disconnected) => return Err(SwapError::Disconnected),
            },
        };
        next.reset();

        let mut sealed = std::mem::replace(&mut self.current, next);
        let stats = sealed.seal();
        let frame = self.frames_finalized + 1;
        let slot = sealed.slot();

        if stats.commands_dropped > 0 {
            log::debug!(
                "Frame {frame} finalized with {} dropped commands",
                stats.commands_dropped
            );
        }

        self.submit
            .send(SealedFrame {
                frame,
                buffer: sealed,
            })
            .map_err(|_| SwapError::Disconnected)?;
        self.frames_finalized = frame;

        log::trace!(
            "Submitted frame {frame} from slot {slot}; recording into slot {}",
            self.current.slot()
        );
        Ok(FrameReport { frame, slot, stats })
    }

    /// Returns the slot currently being recorded into.
    pub fn write_slot(&self) -> usize {
        self.current.slot()
    }

    /// Returns the statistics of the frame being recorded.
    pub fn pending_stats(&self) -> StreamStats {
        self.current.stats()
    }

    /// Returns the number of frames submitted so far.
    pub fn frames_finalized(&self) -> u64 {
        self.frames_finalized
    }

    /// Returns the capacity of each buffer in bytes.
    pub fn capacity(&self) -> usize {
        self.current.capacity()
    }
}

impl RecordCommands for FrameRecorder {
    fn allocate_record(&mut self, kind: u16, payload_len: usize) -> Option<&mut [u8]> {
        self.current.allocate_record(kind, payload_len)
    }
}

/// The replaying half of a frame pipeline. Owns the driver.
#[derive(Debug)]
pub struct FrameReplayer<D: RenderDriver> {
    submitted: Receiver<SealedFrame>,
    recycle: Sender<StreamBuffer>,
    driver: D,
    registry: CommandRegistry,
    frames_replayed: u64,
}

impl<D: RenderDriver> FrameReplayer<D> {
    /// Replays the next submitted frame, if one is queued.
    ///
    /// Returns `Ok(None)` when no frame is ready.
    ///
    /// ## Errors
    /// * [`ReplayError::Stream`] if the frame violates the stream protocol.
    /// * [`ReplayError::Disconnected`] once the recorder is gone and the queue
    ///   is drained.
    pub fn try_replay(&mut self) -> Result<Option<ReplayReport>, ReplayError> {
        match self.submitted.try_recv() {
            Ok(sealed) => self.replay_frame(sealed).map(Some),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ReplayError::Disconnected),
        }
    }

    /// Waits up to `timeout` for the next frame and replays it.
    ///
    /// Returns `Ok(None)` if no frame arrived in time. Errors as
    /// [`try_replay`](Self::try_replay).
    pub fn replay_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<ReplayReport>, ReplayError> {
        match self.submitted.recv_timeout(timeout) {
            Ok(sealed) => self.replay_frame(sealed).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ReplayError::Disconnected),
        }
    }

    fn replay_frame(&mut self, sealed: SealedFrame) -> Result<ReplayReport, ReplayError> {
        let SealedFrame { frame, buffer } = sealed;
        let slot = buffer.slot();
        let result: Result<ReplayStats, StreamError> =
            replay_stream(buffer.as_bytes(), &mut self.driver, &self.registry);

        if self.recycle.send(buffer).is_err() {
            log::trace!("Recorder gone; releasing slot {slot}");
        }

        let stats = result.map_err(|source| ReplayError::Stream { frame, source })?;
        self.frames_replayed += 1;
        Ok(ReplayReport { frame, slot, stats })
    }

    /// Returns the number of frames replayed successfully.
    pub fn frames_replayed(&self) -> u64 {
        self.frames_replayed
    }

    /// Returns the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the driver mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Returns the registry of custom command handlers.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Drops the replaying half and hands the driver back.
    pub fn into_driver(self) -> D {
        self.driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CUSTOM_KIND_BASE;
    use quill_core::renderer::{BlendMode, DriverCall};
    use quill_core::RecordingDriver;

    fn pipeline(count: usize) -> (FrameRecorder, FrameReplayer<RecordingDriver>) {
        channel(&StreamConfig::new(256, count), RecordingDriver::new()).unwrap()
    }

    #[test]
    fn test_frames_are_numbered_and_slots_cycle() {
        let (mut recorder, mut replayer) = pipeline(2);
        assert_eq!(recorder.write_slot(), 1);

        let first = recorder.finalize().unwrap();
        assert_eq!((first.frame, first.slot), (1, 1));
        assert_eq!(recorder.write_slot(), 0);

        replayer.try_replay().unwrap().unwrap();
        let second = recorder.finalize().unwrap();
        assert_eq!((second.frame, second.slot), (2, 0));
        assert_eq!(recorder.write_slot(), 1);
    }

    #[test]
    fn test_consumer_behind_keeps_recording() {
        let (mut recorder, mut replayer) = pipeline(2);
        recorder.set_blend_mode(BlendMode(1));
        recorder.finalize().unwrap();

        recorder.set_blend_mode(BlendMode(2));
        assert_eq!(recorder.finalize(), Err(SwapError::ConsumerBehind));
        assert_eq!(recorder.pending_stats().commands_recorded, 1);

        replayer.try_replay().unwrap().unwrap();
        recorder.finalize().unwrap();
        replayer.try_replay().unwrap().unwrap();

        assert_eq!(
            replayer.driver().calls(),
            &[
                DriverCall::SetBlendMode(BlendMode(1)),
                DriverCall::SetBlendMode(BlendMode(2)),
            ]
        );
    }

    #[test]
    fn test_try_replay_when_idle() {
        let (_recorder, mut replayer) = pipeline(2);
        assert_eq!(replayer.try_replay(), Ok(None));
        assert_eq!(replayer.replay_timeout(Duration::from_millis(1)), Ok(None));
    }

    #[test]
    fn test_disconnection_is_reported_on_both_sides() {
        let (mut recorder, replayer) = pipeline(3);
        drop(replayer);
        assert_eq!(recorder.finalize(), Err(SwapError::Disconnected));

        let (mut recorder, mut replayer) = pipeline(3);
        recorder.finalize().unwrap();
        drop(recorder);
        assert!(replayer.try_replay().unwrap().is_some());
        assert_eq!(replayer.try_replay(), Err(ReplayError::Disconnected));
    }

    #[test]
    fn test_corrupt_frame_still_recycles_its_buffer() {
        let (mut recorder, mut replayer) = pipeline(2);
        recorder.custom_command(CUSTOM_KIND_BASE, 4).unwrap();
        recorder.finalize().unwrap();

        let err = replayer.try_replay().unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Stream {
                frame: 1,
                source: StreamError::UnknownKind { offset: 0, .. }
            }
        ));
        assert_eq!(replayer.frames_replayed(), 0);

        // The failed frame's buffer came back, so the next finalize succeeds.
        recorder.finalize().unwrap();
    }
}
