//! Motion manager
//!
//! Owns one [`MotionStorage`] per value type plus the running sequences, and
//! exposes the single-record control operations. The host calls
//! [`MotionManager::update`] once per frame with that frame's
//! [`FrameTime`]; everything else happens between frames.
//!
//! Callback failures are never returned from `update`. They go to the
//! [`ErrorSink`] injected at construction (a [`TracingErrorSink`] unless
//! replaced), so one failing observer cannot abort a frame.

use crate::motion::{MotionCore, Sample};
use crate::sequence::Sequence;
use crate::settings::MotionSettings;
use crate::storage::{AnyStorage, MotionRecord, MotionStorage, StepOutput, StepReport};
use kinetic_core::{
    nanos_to_secs, secs_to_nanos, FrameTime, Interpolate, Lanes, MotionError, MotionHandle,
    MotionStatus, Result, SequenceHandle, SequenceKey, SharedErrorSink, StorageId,
    TracingErrorSink,
};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use std::any::TypeId;
use std::sync::Arc;

/// Outcome of one [`MotionManager::update`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Combined result of every storage update and sequence drive
    pub motions: StepReport,
    /// Sequences that finished this frame
    pub sequences_completed: Vec<SequenceHandle>,
}

/// Schedules, steps and controls motions of any value type
pub struct MotionManager {
    storages: Vec<Box<dyn AnyStorage>>,
    by_type: FxHashMap<TypeId, StorageId>,
    sequences: SlotMap<SequenceKey, Sequence>,
    sink: SharedErrorSink,
    settings: MotionSettings,
}

impl MotionManager {
    pub fn new() -> Self {
        Self::with_settings(MotionSettings::default())
    }

    pub fn with_settings(settings: MotionSettings) -> Self {
        Self {
            storages: Vec::new(),
            by_type: FxHashMap::default(),
            sequences: SlotMap::with_key(),
            sink: Arc::new(TracingErrorSink),
            settings,
        }
    }

    /// Replace the error sink at construction
    pub fn with_error_sink(mut self, sink: SharedErrorSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn set_error_sink(&mut self, sink: SharedErrorSink) {
        self.sink = sink;
    }

    /// Go back to logging callback failures through `tracing`
    pub fn reset_error_sink(&mut self) {
        self.sink = Arc::new(TracingErrorSink);
    }

    pub fn error_sink(&self) -> &SharedErrorSink {
        &self.sink
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    // =========================================================================
    // Frame Update
    // =========================================================================

    /// Step every storage, then drive every sequence
    pub fn update(&mut self, frame: FrameTime) -> FrameReport {
        let mut report = FrameReport::default();

        for storage in self.storages.iter_mut() {
            report
                .motions
                .merge(storage.update(&frame, &self.settings, self.sink.as_ref()));
        }

        let mut finished = Vec::new();
        for (key, sequence) in self.sequences.iter_mut() {
            report.motions.failures += sequence.drive(&mut self.storages, &frame, self.sink.as_ref());
            if sequence.core().state.status.is_finished() {
                finished.push(key);
            }
        }
        for key in finished {
            self.sequences.remove(key);
            report.sequences_completed.push(SequenceHandle::new(key));
        }

        tracing::trace!(
            stepped = report.motions.stepped,
            completed = report.motions.completed.len(),
            canceled = report.motions.canceled.len(),
            failures = report.motions.failures,
            sequences = self.sequences.len(),
            "motion frame"
        );
        report
    }

    /// Step only the storage holding `T` values, returning the written values
    ///
    /// Sequences are not driven.
    pub fn step_storage<T: Interpolate>(&mut self, frame: FrameTime) -> StepOutput<T> {
        let id = self.storage_id::<T>();
        let sink = Arc::clone(&self.sink);
        let settings = self.settings.clone();
        match self.typed_storage_mut::<T>(id) {
            Some(storage) => storage.step(&frame, &settings, sink.as_ref()),
            None => StepOutput {
                report: StepReport::default(),
                values: Vec::new(),
            },
        }
    }

    // =========================================================================
    // Storage Registry
    // =========================================================================

    fn storage_id<T: Interpolate>(&mut self) -> StorageId {
        let type_id = TypeId::of::<T>();
        if let Some(id) = self.by_type.get(&type_id) {
            return *id;
        }

        let id = StorageId(self.storages.len() as u32);
        self.storages.push(Box::new(MotionStorage::<T>::new(
            id,
            self.settings.initial_capacity,
        )));
        self.by_type.insert(type_id, id);
        id
    }

    fn typed_storage_mut<T: Interpolate>(&mut self, id: StorageId) -> Option<&mut MotionStorage<T>> {
        self.storages
            .get_mut(id.0 as usize)?
            .as_any_mut()
            .downcast_mut::<MotionStorage<T>>()
    }

    /// The storage for `T`, if any motion of that type was ever scheduled
    pub fn storage<T: Interpolate>(&self) -> Option<&MotionStorage<T>> {
        let id = self.by_type.get(&TypeId::of::<T>())?;
        self.storages
            .get(id.0 as usize)?
            .as_any()
            .downcast_ref::<MotionStorage<T>>()
    }

    /// Allocate a record in the storage for `T`
    pub(crate) fn insert<T: Interpolate>(&mut self, record: MotionRecord<T>) -> MotionHandle {
        let id = self.storage_id::<T>();
        match self.typed_storage_mut::<T>(id) {
            Some(storage) => storage.insert(record),
            None => {
                tracing::error!(
                    storage = id.0,
                    value_type = std::any::type_name::<T>(),
                    "storage registered under the wrong value type"
                );
                MotionHandle::default()
            }
        }
    }

    pub(crate) fn insert_sequence(&mut self, sequence: Sequence) -> SequenceHandle {
        SequenceHandle::new(self.sequences.insert(sequence))
    }

    /// Hand a motion over to a sequence
    pub(crate) fn adopt(&mut self, handle: MotionHandle) {
        if let Ok(core) = self.core_mut(handle) {
            core.state.is_in_sequence = true;
            core.state.is_preserved = true;
        }
    }

    pub fn storage_count(&self) -> usize {
        self.storages.len()
    }

    /// Live records across all storages
    pub fn motion_count(&self) -> usize {
        self.storages.iter().map(|storage| storage.len()).sum()
    }

    pub fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    /// Check if any motion or sequence still needs frames
    pub fn has_active_motions(&self) -> bool {
        !self.sequences.is_empty() || self.motion_count() > 0
    }

    // =========================================================================
    // Handle Validation
    // =========================================================================

    fn core(&self, handle: MotionHandle) -> Result<&MotionCore> {
        self.storages
            .get(handle.storage().0 as usize)
            .and_then(|storage| storage.core(handle.key()))
            .ok_or(MotionError::NotFound(handle))
    }

    fn core_mut(&mut self, handle: MotionHandle) -> Result<&mut MotionCore> {
        self.storages
            .get_mut(handle.storage().0 as usize)
            .and_then(|storage| storage.core_mut(handle.key()))
            .ok_or(MotionError::NotFound(handle))
    }

    /// The core of a motion that may be controlled on its own
    pub(crate) fn control_core(&self, handle: MotionHandle) -> Result<&MotionCore> {
        let core = self.core(handle)?;
        let state = &core.state;
        if state.is_in_sequence {
            return Err(MotionError::InSequence(handle));
        }
        let finished = state.status == MotionStatus::Canceled
            || (state.status == MotionStatus::Completed && !state.is_preserved);
        if finished {
            return Err(MotionError::AlreadyFinished(handle));
        }
        Ok(core)
    }

    /// Validate, mutate the core, then write the resulting sample and fire
    /// callbacks. The record is collected right away if it finished.
    fn control<F>(&mut self, handle: MotionHandle, op: F) -> Result<()>
    where
        F: FnOnce(&mut MotionCore) -> Result<Sample>,
    {
        self.control_core(handle)?;
        let storage = self
            .storages
            .get_mut(handle.storage().0 as usize)
            .ok_or(MotionError::NotFound(handle))?;
        let core = storage
            .core_mut(handle.key())
            .ok_or(MotionError::NotFound(handle))?;
        let sample = op(core)?;
        storage.settle(handle.key(), sample, self.sink.as_ref());
        Ok(())
    }

    /// Validate, then mutate the core without dispatching anything
    fn modify<F>(&mut self, handle: MotionHandle, op: F) -> Result<()>
    where
        F: FnOnce(&mut MotionCore) -> Result<()>,
    {
        self.control_core(handle)?;
        op(self.core_mut(handle)?)
    }

    /// Reject handles whose storage does not hold `T`
    fn check_type<T: Interpolate>(&self, handle: MotionHandle) -> Result<()> {
        match self.by_type.get(&TypeId::of::<T>()) {
            Some(id) if *id == handle.storage() => Ok(()),
            _ => Err(MotionError::NotFound(handle)),
        }
    }

    // =========================================================================
    // Control Operations
    // =========================================================================

    /// Stop a motion before its natural end
    ///
    /// `on_cancel` fires right away. Unless preserved, the record is freed
    /// and the handle reports [`MotionError::NotFound`] from now on.
    pub fn cancel(&mut self, handle: MotionHandle) -> Result<()> {
        self.control(handle, |core| {
            core.cancel();
            Ok(Sample::Hold)
        })
    }

    /// Jump a motion to its natural end
    ///
    /// Writes the final value and fires `on_update` then `on_complete`.
    /// Infinitely looping motions are rejected; cancel them instead.
    pub fn complete(&mut self, handle: MotionHandle) -> Result<()> {
        self.control(handle, |core| {
            if core.config.is_infinite() {
                return Err(MotionError::InfiniteLoopComplete(handle));
            }
            if core.state.status == MotionStatus::Completed {
                return Err(MotionError::AlreadyFinished(handle));
            }
            Ok(core.complete())
        })
    }

    /// Seek a duration-based motion to `secs` after scheduling
    pub fn set_time(&mut self, handle: MotionHandle, secs: f64) -> Result<()> {
        self.control(handle, |core| {
            if core.config.is_spring() {
                return Err(MotionError::SpringSeek(handle));
            }
            Ok(core.seek(secs_to_nanos(secs)))
        })
    }

    pub fn try_cancel(&mut self, handle: MotionHandle) -> bool {
        self.cancel(handle).map_err(log_rejection).is_ok()
    }

    pub fn try_complete(&mut self, handle: MotionHandle) -> bool {
        self.complete(handle).map_err(log_rejection).is_ok()
    }

    pub fn try_set_time(&mut self, handle: MotionHandle, secs: f64) -> bool {
        self.set_time(handle, secs).map_err(log_rejection).is_ok()
    }

    pub fn set_playback_speed(&mut self, handle: MotionHandle, speed: f32) -> Result<()> {
        self.modify(handle, |core| {
            core.state.playback_speed = if speed.is_nan() { 0.0 } else { speed.max(0.0) };
            Ok(())
        })
    }

    /// Keep the record alive after it finishes
    pub fn preserve(&mut self, handle: MotionHandle) -> Result<()> {
        self.modify(handle, |core| {
            core.state.is_preserved = true;
            Ok(())
        })
    }

    /// Drop preservation; a finished record is collected on the next update
    pub fn release(&mut self, handle: MotionHandle) -> Result<()> {
        let core = self.core_mut(handle)?;
        if core.state.is_in_sequence {
            return Err(MotionError::InSequence(handle));
        }
        core.state.is_preserved = false;
        Ok(())
    }

    /// Point a spring motion at a new target; velocity carries over
    pub fn set_spring_target<T: Lanes>(&mut self, handle: MotionHandle, target: T) -> Result<()> {
        self.check_type::<T>(handle)?;
        self.modify(handle, |core| {
            if !core.config.is_spring() {
                return Err(MotionError::NotSpring(handle));
            }
            core.retarget(target.to_lanes());
            Ok(())
        })
    }

    /// Overwrite a spring motion's current value and velocity
    pub fn set_spring_state<T: Lanes>(
        &mut self,
        handle: MotionHandle,
        value: T,
        velocity: T,
    ) -> Result<()> {
        self.check_type::<T>(handle)?;
        self.modify(handle, |core| {
            if !core.config.is_spring() {
                return Err(MotionError::NotSpring(handle));
            }
            core.set_spring_state(value.to_lanes(), velocity.to_lanes());
            Ok(())
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Live and not finished; preserved completed motions count as active
    pub fn is_active(&self, handle: MotionHandle) -> bool {
        self.core(handle).is_ok_and(|core| {
            let status = core.state.status;
            status.is_running() || (status == MotionStatus::Completed && core.state.is_preserved)
        })
    }

    /// Scheduled, delayed or playing
    pub fn is_playing(&self, handle: MotionHandle) -> bool {
        self.core(handle)
            .is_ok_and(|core| core.state.status.is_running())
    }

    pub fn status(&self, handle: MotionHandle) -> Result<MotionStatus> {
        Ok(self.core(handle)?.state.status)
    }

    /// Elapsed time since scheduling, in seconds, after playback speed
    pub fn time(&self, handle: MotionHandle) -> Result<f64> {
        Ok(nanos_to_secs(self.core(handle)?.state.time))
    }

    pub fn completed_loops(&self, handle: MotionHandle) -> Result<i32> {
        Ok(self.core(handle)?.state.completed_loops)
    }

    pub fn playback_speed(&self, handle: MotionHandle) -> Result<f32> {
        Ok(self.core(handle)?.state.playback_speed)
    }

    /// Last value written by the motion
    pub fn value<T: Interpolate>(&self, handle: MotionHandle) -> Result<T> {
        self.check_type::<T>(handle)?;
        self.storage::<T>()
            .and_then(|storage| storage.value(handle.key()))
            .cloned()
            .ok_or(MotionError::NotFound(handle))
    }

    // =========================================================================
    // Sequences
    // =========================================================================

    pub fn sequence(&self, handle: SequenceHandle) -> Option<&Sequence> {
        self.sequences.get(handle.key())
    }

    pub fn is_sequence_active(&self, handle: SequenceHandle) -> bool {
        self.sequences.contains_key(handle.key())
    }

    /// Cancel a sequence and every child it still owns
    pub fn cancel_sequence(&mut self, handle: SequenceHandle) -> Result<()> {
        let mut sequence = self
            .sequences
            .remove(handle.key())
            .ok_or(MotionError::SequenceNotFound(handle))?;
        sequence.cancel(&mut self.storages, self.sink.as_ref());
        Ok(())
    }

    /// Jump a sequence and its children to the end
    pub fn complete_sequence(&mut self, handle: SequenceHandle) -> Result<()> {
        let sequence = self
            .sequences
            .get(handle.key())
            .ok_or(MotionError::SequenceNotFound(handle))?;
        if sequence.core().config.is_infinite() {
            return Err(MotionError::InfiniteSequenceComplete(handle));
        }

        if let Some(mut sequence) = self.sequences.remove(handle.key()) {
            sequence.complete(&mut self.storages, self.sink.as_ref());
        }
        Ok(())
    }
}

impl Default for MotionManager {
    fn default() -> Self {
        Self::new()
    }
}

fn log_rejection(error: MotionError) -> MotionError {
    tracing::debug!("motion control rejected: {}", error);
    error
}
