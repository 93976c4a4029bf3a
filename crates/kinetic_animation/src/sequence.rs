//! Sequence orchestration for multiple motions
//!
//! A sequence places already-scheduled duration motions on a shared
//! timeline. Children are marked in-sequence and preserved: the batch driver
//! no longer steps them, and the sequence seeks each of them to
//! `sequence_time - position` every frame instead. When the sequence ends
//! (or is canceled) its children are released and collected.

use crate::manager::MotionManager;
use crate::motion::{DelayType, LoopType, MotionConfig, MotionCore, Sample};
use crate::storage::AnyStorage;
use kinetic_core::{
    secs_to_nanos, ErrorSink, FrameTime, MotionError, MotionHandle, MotionStatus,
    MotionTimeKind, Result, SequenceHandle,
};
use smallvec::SmallVec;

/// A child motion and where it starts on the sequence timeline
#[derive(Clone, Copy, Debug, PartialEq)]
struct SequenceEntry {
    handle: MotionHandle,
    /// Offset in nanoseconds from sequence start
    position: i64,
}

/// A running sequence
pub struct Sequence {
    core: MotionCore,
    entries: SmallVec<[SequenceEntry; 8]>,
}

impl Sequence {
    pub fn core(&self) -> &MotionCore {
        &self.core
    }

    /// Length of one loop of the sequence, in nanoseconds
    pub fn span(&self) -> i64 {
        self.core.config.duration().unwrap_or(0)
    }

    pub fn children(&self) -> impl Iterator<Item = MotionHandle> + '_ {
        self.entries.iter().map(|entry| entry.handle)
    }

    /// Advance by one frame and drive the children. Returns the number of
    /// failed callbacks.
    pub(crate) fn drive(
        &mut self,
        storages: &mut [Box<dyn AnyStorage>],
        frame: &FrameTime,
        sink: &dyn ErrorSink,
    ) -> usize {
        let sample = self.core.advance(frame.delta_for(self.core.config.time_kind));
        let mut failures = self.apply(sample, storages, sink);
        if self.core.state.status == MotionStatus::Completed {
            failures += self.release(storages, sink, Release::Finish);
        }
        failures
    }

    /// Jump to the end and release the children
    pub(crate) fn complete(
        &mut self,
        storages: &mut [Box<dyn AnyStorage>],
        sink: &dyn ErrorSink,
    ) -> usize {
        let sample = self.core.complete();
        self.apply(sample, storages, sink) + self.release(storages, sink, Release::Finish)
    }

    pub(crate) fn cancel(
        &mut self,
        storages: &mut [Box<dyn AnyStorage>],
        sink: &dyn ErrorSink,
    ) -> usize {
        self.core.cancel();
        self.release(storages, sink, Release::Cancel)
    }

    /// Seek every child to the sequence-local time `sample` stands for
    fn apply(
        &self,
        sample: Sample,
        storages: &mut [Box<dyn AnyStorage>],
        sink: &dyn ErrorSink,
    ) -> usize {
        let Sample::Progress(progress) = sample else {
            return 0;
        };
        let local = (f64::from(progress) * self.span() as f64).round() as i64;

        let mut failures = 0;
        for entry in &self.entries {
            let Some(storage) = storages.get_mut(entry.handle.storage().0 as usize) else {
                continue;
            };
            let key = entry.handle.key();
            let Some(core) = storage.core_mut(key) else {
                continue;
            };
            let sample = core.seek((local - entry.position).max(0));
            failures += storage.settle(key, sample, sink);
        }
        failures
    }

    /// Hand the children back to their storages, finished
    fn release(
        &self,
        storages: &mut [Box<dyn AnyStorage>],
        sink: &dyn ErrorSink,
        how: Release,
    ) -> usize {
        let mut failures = 0;
        for entry in &self.entries {
            let Some(storage) = storages.get_mut(entry.handle.storage().0 as usize) else {
                continue;
            };
            let key = entry.handle.key();
            let Some(core) = storage.core_mut(key) else {
                continue;
            };
            core.state.is_in_sequence = false;
            core.state.is_preserved = false;

            match how {
                Release::Cancel if core.state.status != MotionStatus::Canceled => {
                    core.cancel();
                    failures += storage.settle(key, Sample::Hold, sink);
                }
                Release::Finish if core.state.status.is_running() => {
                    core.finish();
                    failures += storage.settle(key, Sample::Hold, sink);
                }
                _ => storage.collect(key),
            }
        }
        failures
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Release {
    Finish,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Placement {
    /// After everything placed so far
    Append,
    /// At the same position as the previous child
    Join,
    /// At an absolute offset in nanoseconds
    Insert(i64),
    /// Empty time at the end
    Interval(i64),
}

/// Builder for a [`Sequence`]
///
/// # Example
///
/// ```ignore
/// let fade = MotionBuilder::tween(0.0f32, 1.0, 0.3).schedule(&mut manager);
/// let slide = MotionBuilder::tween(Vec2::ZERO, Vec2::new(100.0, 0.0), 0.5).schedule(&mut manager);
///
/// let sequence = SequenceBuilder::new()
///     .append(fade)
///     .join(slide)
///     .with_loops(2)
///     .schedule(&mut manager)?;
/// ```
#[derive(Clone, Debug)]
pub struct SequenceBuilder {
    placements: SmallVec<[(Option<MotionHandle>, Placement); 8]>,
    loops: i32,
    loop_type: LoopType,
    delay: i64,
    delay_type: DelayType,
    time_kind: Option<MotionTimeKind>,
    playback_speed: f32,
}

impl Default for SequenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceBuilder {
    pub fn new() -> Self {
        Self {
            placements: SmallVec::new(),
            loops: 1,
            loop_type: LoopType::Restart,
            delay: 0,
            delay_type: DelayType::FirstLoop,
            time_kind: None,
            playback_speed: 1.0,
        }
    }

    /// Start `handle` after everything placed so far
    pub fn append(mut self, handle: MotionHandle) -> Self {
        self.placements.push((Some(handle), Placement::Append));
        self
    }

    /// Start `handle` together with the previously placed motion
    pub fn join(mut self, handle: MotionHandle) -> Self {
        self.placements.push((Some(handle), Placement::Join));
        self
    }

    /// Start `handle` at `at` seconds from the sequence start
    pub fn insert(mut self, at: f64, handle: MotionHandle) -> Self {
        self.placements
            .push((Some(handle), Placement::Insert(secs_to_nanos(at).max(0))));
        self
    }

    /// Add `secs` of empty time at the end
    pub fn append_interval(mut self, secs: f64) -> Self {
        self.placements
            .push((None, Placement::Interval(secs_to_nanos(secs).max(0))));
        self
    }

    pub fn with_loops(mut self, loops: i32) -> Self {
        self.loops = loops;
        self
    }

    /// Incremental loops have no meaning for a timeline and play as restart
    pub fn with_loop_type(mut self, loop_type: LoopType) -> Self {
        self.loop_type = match loop_type {
            LoopType::Incremental => LoopType::Restart,
            other => other,
        };
        self
    }

    pub fn with_delay(mut self, secs: f64, delay_type: DelayType) -> Self {
        self.delay = secs_to_nanos(secs).max(0);
        self.delay_type = delay_type;
        self
    }

    pub fn with_time_kind(mut self, time_kind: MotionTimeKind) -> Self {
        self.time_kind = Some(time_kind);
        self
    }

    pub fn with_playback_speed(mut self, speed: f32) -> Self {
        self.playback_speed = if speed.is_nan() { 0.0 } else { speed.max(0.0) };
        self
    }

    /// Validate the children, lay them out, and hand the sequence to the manager
    ///
    /// Children must be live, independent, finite duration motions.
    pub fn schedule(self, manager: &mut MotionManager) -> Result<SequenceHandle> {
        let mut entries: SmallVec<[SequenceEntry; 8]> = SmallVec::new();
        let mut span = 0i64;
        let mut previous = 0i64;

        for (handle, placement) in &self.placements {
            let Some(handle) = *handle else {
                if let Placement::Interval(interval) = placement {
                    span = span.saturating_add(*interval);
                }
                continue;
            };

            let core = manager.control_core(handle)?;
            if core.config.is_spring() {
                return Err(MotionError::SpringSeek(handle));
            }
            let total = core
                .config
                .total_duration()
                .ok_or(MotionError::InfiniteLoopComplete(handle))?;
            if entries.iter().any(|entry| entry.handle == handle) {
                return Err(MotionError::InSequence(handle));
            }

            let position = match placement {
                Placement::Append | Placement::Interval(_) => span,
                Placement::Join => previous,
                Placement::Insert(at) => *at,
            };
            span = span.max(position.saturating_add(total));
            previous = position;
            entries.push(SequenceEntry { handle, position });
        }

        let mut config = MotionConfig::tween_nanos(span);
        config.loops = self.loops;
        config.loop_type = self.loop_type;
        config.delay = self.delay;
        config.delay_type = self.delay_type;
        config.time_kind = self
            .time_kind
            .unwrap_or(manager.settings().default_time_kind);

        let mut core = MotionCore::new(config);
        core.state.playback_speed = self.playback_speed;

        for entry in &entries {
            manager.adopt(entry.handle);
        }
        tracing::debug!(
            children = entries.len(),
            span_ns = span,
            "scheduled motion sequence"
        );
        Ok(manager.insert_sequence(Sequence { core, entries }))
    }
}
