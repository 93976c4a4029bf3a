//! Typed motion record storage and the per-frame batch update
//!
//! Each value type gets its own [`MotionStorage`], a dense slot arena of
//! [`MotionRecord`]s. A frame update runs in three phases:
//!
//! 1. **Step**: every record advances its [`MotionCore`] and computes its new
//!    value. Pure math, no callbacks, so large storages step in parallel
//!    chunks on the rayon pool.
//! 2. **Dispatch**: single-threaded, in dense (insertion) order, callbacks
//!    fire for every record that produced a value or changed status. A
//!    failing callback is reported to the error sink and never stops the
//!    batch.
//! 3. **Compact**: finished records that are not preserved are removed.
//!    Removal swaps the last record into the freed slot and bumps the slot
//!    version, so old handles are rejected.

use crate::motion::{MotionCore, Sample};
use crate::settings::MotionSettings;
use kinetic_core::{
    ErrorSink, FrameTime, Interpolate, MotionError, MotionHandle, MotionKey, MotionStatus,
    StorageId,
};
use rayon::prelude::*;
use slotmap::DenseSlotMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Receives the new value after each step that wrote one
pub type UpdateCallback<T> = Box<dyn FnMut(&T) -> anyhow::Result<()> + Send>;
/// Receives the number of completed loops
pub type LoopCallback = Box<dyn FnMut(i32) -> anyhow::Result<()> + Send>;
/// Lifecycle notification
pub type EventCallback = Box<dyn FnMut() -> anyhow::Result<()> + Send>;

/// Observer callbacks of one motion
pub struct Callbacks<T> {
    pub on_update: Option<UpdateCallback<T>>,
    pub on_loop_complete: Option<LoopCallback>,
    pub on_complete: Option<EventCallback>,
    pub on_cancel: Option<EventCallback>,
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self {
            on_update: None,
            on_loop_complete: None,
            on_complete: None,
            on_cancel: None,
        }
    }
}

/// A scheduled motion: timing core, endpoints, current value, callbacks
pub struct MotionRecord<T: Interpolate> {
    pub(crate) core: MotionCore,
    start: T,
    end: T,
    value: T,
    /// Value produced by the last step, not yet dispatched
    pending: Option<T>,
    /// Converts spring lanes back into `T`; set for spring motions only
    from_lanes: Option<fn([f32; 4]) -> T>,
    callbacks: Callbacks<T>,
}

impl<T: Interpolate> MotionRecord<T> {
    pub fn new(core: MotionCore, start: T, end: T, callbacks: Callbacks<T>) -> Self {
        Self {
            core,
            value: start.clone(),
            start,
            end,
            pending: None,
            from_lanes: None,
            callbacks,
        }
    }

    pub fn with_lanes(mut self, from_lanes: fn([f32; 4]) -> T) -> Self {
        self.from_lanes = Some(from_lanes);
        self
    }

    pub fn core(&self) -> &MotionCore {
        &self.core
    }

    /// Last dispatched value
    pub fn value(&self) -> &T {
        &self.value
    }

    fn resolve(&self, sample: Sample) -> Option<T> {
        match sample {
            Sample::Hold => None,
            Sample::Progress(t) => Some(self.start.lerp(&self.end, t)),
            Sample::Spring(lanes) => self.from_lanes.map(|from_lanes| from_lanes(lanes)),
        }
    }

    /// Phase 1: advance and compute the new value
    fn step(&mut self, frame: &FrameTime) {
        if self.core.state.is_in_sequence {
            return;
        }
        let delta = frame.delta_for(self.core.config.time_kind);
        let sample = self.core.advance(delta);
        self.pending = self.resolve(sample);
    }

    /// Phase 2: fire callbacks for whatever the last step or control
    /// operation produced. Returns the number of failed callbacks.
    fn dispatch(&mut self, handle: MotionHandle, sink: &dyn ErrorSink) -> usize {
        let mut failures = 0;

        if let Some(value) = self.pending.take() {
            self.value = value;
            if let Some(on_update) = self.callbacks.on_update.as_mut() {
                let value = &self.value;
                failures += invoke(handle, sink, || on_update(value));
            }
        }

        let state = self.core.state;
        if state.was_loop_completed {
            if let Some(on_loop_complete) = self.callbacks.on_loop_complete.as_mut() {
                failures += invoke(handle, sink, || on_loop_complete(state.completed_loops));
            }
        }
        if state.was_status_changed && state.status == MotionStatus::Completed {
            if let Some(on_complete) = self.callbacks.on_complete.as_mut() {
                failures += invoke(handle, sink, on_complete);
            }
        }

        if failures > 0 && self.core.config.cancel_on_error && self.core.state.status.is_running()
        {
            tracing::debug!(
                index = handle.index(),
                "canceling motion after callback failure"
            );
            self.core.cancel();
        }

        let state = self.core.state;
        if state.was_status_changed && state.status == MotionStatus::Canceled {
            if let Some(on_cancel) = self.callbacks.on_cancel.as_mut() {
                failures += invoke(handle, sink, on_cancel);
            }
        }

        failures
    }

    fn is_collectable(&self) -> bool {
        self.core.state.status.is_finished() && !self.core.state.is_preserved
    }
}

/// Run a callback, turning an `Err` or a panic into a reported
/// [`MotionError::CallbackFailure`]. Returns 1 on failure, 0 otherwise.
fn invoke<F>(handle: MotionHandle, sink: &dyn ErrorSink, callback: F) -> usize
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let message = match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => return 0,
        Ok(Err(error)) => format!("{error:#}"),
        Err(payload) => panic_message(payload.as_ref()),
    };
    sink.report(&MotionError::CallbackFailure { handle, message });
    1
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("callback panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("callback panicked: {message}")
    } else {
        "callback panicked".to_string()
    }
}

/// Outcome of one storage update
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Records that were live when the update started
    pub stepped: usize,
    /// Records that completed this frame and left the storage
    ///
    /// Preserved records stay addressable after completing and are not
    /// listed; poll their status instead.
    pub completed: Vec<MotionHandle>,
    /// Records that were canceled this frame (by a failing callback)
    pub canceled: Vec<MotionHandle>,
    /// Callbacks that returned an error or panicked
    pub failures: usize,
}

impl StepReport {
    pub(crate) fn merge(&mut self, other: StepReport) {
        self.stepped += other.stepped;
        self.completed.extend(other.completed);
        self.canceled.extend(other.canceled);
        self.failures += other.failures;
    }
}

/// Outcome of a typed storage update, including the values written
#[derive(Clone, Debug, Default)]
pub struct StepOutput<T> {
    pub report: StepReport,
    /// Every value written this frame, in dispatch order
    pub values: Vec<(MotionHandle, T)>,
}

/// Dense arena of records for one value type
pub struct MotionStorage<T: Interpolate> {
    id: StorageId,
    records: DenseSlotMap<MotionKey, MotionRecord<T>>,
}

impl<T: Interpolate> MotionStorage<T> {
    pub fn new(id: StorageId, capacity: usize) -> Self {
        tracing::debug!(
            storage = id.0,
            value_type = std::any::type_name::<T>(),
            capacity,
            "created motion storage"
        );
        Self {
            id,
            records: DenseSlotMap::with_capacity_and_key(capacity),
        }
    }

    pub fn id(&self) -> StorageId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Allocate a record; the arena grows as needed
    pub fn insert(&mut self, record: MotionRecord<T>) -> MotionHandle {
        if self.records.len() == self.records.capacity() {
            tracing::debug!(
                storage = self.id.0,
                capacity = self.records.capacity(),
                "growing motion storage"
            );
        }
        MotionHandle::new(self.id, self.records.insert(record))
    }

    pub fn get(&self, key: MotionKey) -> Option<&MotionRecord<T>> {
        self.records.get(key)
    }

    pub fn value(&self, key: MotionKey) -> Option<&T> {
        self.records.get(key).map(MotionRecord::value)
    }

    /// Step every record, dispatch callbacks, compact
    pub fn step(
        &mut self,
        frame: &FrameTime,
        settings: &MotionSettings,
        sink: &dyn ErrorSink,
    ) -> StepOutput<T> {
        let mut values = Vec::new();
        let report = self.run_frame(frame, settings, sink, Some(&mut values));
        StepOutput { report, values }
    }

    fn run_frame(
        &mut self,
        frame: &FrameTime,
        settings: &MotionSettings,
        sink: &dyn ErrorSink,
        mut values: Option<&mut Vec<(MotionHandle, T)>>,
    ) -> StepReport {
        let mut report = StepReport {
            stepped: self.records.len(),
            ..StepReport::default()
        };

        // Phase 1: math only
        if self.records.len() >= settings.parallel_threshold {
            let batch_size = settings.parallel_batch_size.max(1);
            let mut batch: Vec<&mut MotionRecord<T>> = self.records.values_mut().collect();
            batch.par_chunks_mut(batch_size).for_each(|chunk| {
                for record in chunk.iter_mut() {
                    record.step(frame);
                }
            });
        } else {
            for record in self.records.values_mut() {
                record.step(frame);
            }
        }

        // Phase 2: callbacks in dense order
        for (key, record) in self.records.iter_mut() {
            if record.core.state.is_in_sequence {
                continue;
            }
            let handle = MotionHandle::new(self.id, key);
            let wrote = record.pending.is_some();
            report.failures += record.dispatch(handle, sink);

            if let Some(values) = values.as_deref_mut() {
                if wrote {
                    values.push((handle, record.value.clone()));
                }
            }

            let state = record.core.state;
            if state.was_status_changed && !state.is_preserved {
                match state.status {
                    MotionStatus::Completed => report.completed.push(handle),
                    MotionStatus::Canceled => report.canceled.push(handle),
                    _ => {}
                }
            }
        }

        // Phase 3: swap-remove finished records
        self.records.retain(|_, record| !record.is_collectable());

        tracing::trace!(
            storage = self.id.0,
            stepped = report.stepped,
            completed = report.completed.len(),
            canceled = report.canceled.len(),
            failures = report.failures,
            "motion storage updated"
        );
        report
    }
}

/// Type-erased view of a [`MotionStorage`] used by the manager
pub trait AnyStorage: Send {
    fn id(&self) -> StorageId;

    fn len(&self) -> usize;

    fn update(
        &mut self,
        frame: &FrameTime,
        settings: &MotionSettings,
        sink: &dyn ErrorSink,
    ) -> StepReport;

    fn core(&self, key: MotionKey) -> Option<&MotionCore>;

    fn core_mut(&mut self, key: MotionKey) -> Option<&mut MotionCore>;

    /// Write `sample`, fire callbacks and collect the record if it finished.
    /// Used after control operations outside the frame update. Returns the
    /// number of failed callbacks.
    fn settle(&mut self, key: MotionKey, sample: Sample, sink: &dyn ErrorSink) -> usize;

    /// Remove finished, unpreserved records right away
    fn collect(&mut self, key: MotionKey);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Interpolate> AnyStorage for MotionStorage<T> {
    fn id(&self) -> StorageId {
        self.id
    }

    fn len(&self) -> usize {
        self.records.len()
    }

    fn update(
        &mut self,
        frame: &FrameTime,
        settings: &MotionSettings,
        sink: &dyn ErrorSink,
    ) -> StepReport {
        self.run_frame(frame, settings, sink, None)
    }

    fn core(&self, key: MotionKey) -> Option<&MotionCore> {
        self.records.get(key).map(|record| &record.core)
    }

    fn core_mut(&mut self, key: MotionKey) -> Option<&mut MotionCore> {
        self.records.get_mut(key).map(|record| &mut record.core)
    }

    fn settle(&mut self, key: MotionKey, sample: Sample, sink: &dyn ErrorSink) -> usize {
        let handle = MotionHandle::new(self.id, key);
        let Some(record) = self.records.get_mut(key) else {
            return 0;
        };
        record.pending = record.resolve(sample);
        let failures = record.dispatch(handle, sink);
        self.collect(key);
        failures
    }

    fn collect(&mut self, key: MotionKey) {
        if self.records.get(key).is_some_and(MotionRecord::is_collectable) {
            self.records.remove(key);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::MotionConfig;
    use kinetic_core::{secs_to_nanos, NANOS_PER_SECOND};
    use std::sync::{Arc, Mutex};

    fn record(duration: f64, callbacks: Callbacks<f32>) -> MotionRecord<f32> {
        MotionRecord::new(
            MotionCore::new(MotionConfig::tween(duration)),
            0.0,
            10.0,
            callbacks,
        )
    }

    fn collecting_sink() -> (Arc<Mutex<Vec<MotionError>>>, impl ErrorSink) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&errors);
        (errors, move |error: &MotionError| {
            seen.lock().unwrap().push(error.clone())
        })
    }

    #[test]
    fn test_step_writes_values_and_collects_completed() {
        let mut storage = MotionStorage::new(StorageId(0), 4);
        let short = storage.insert(record(0.5, Callbacks::default()));
        let long = storage.insert(record(2.0, Callbacks::default()));
        let (_, sink) = collecting_sink();

        let output = storage.step(
            &FrameTime::uniform(1.0),
            &MotionSettings::default(),
            &sink,
        );

        assert_eq!(output.report.stepped, 2);
        assert_eq!(output.report.completed, vec![short]);
        assert_eq!(output.values, vec![(short, 10.0), (long, 5.0)]);
        assert!(storage.get(short.key()).is_none());
        assert_eq!(storage.value(long.key()), Some(&5.0));
    }

    #[test]
    fn test_preserved_records_are_not_reported_completed() {
        let mut storage = MotionStorage::new(StorageId(0), 4);
        let mut kept = record(0.5, Callbacks::default());
        kept.core.state.is_preserved = true;
        let kept = storage.insert(kept);
        let plain = storage.insert(record(0.5, Callbacks::default()));
        let (_, sink) = collecting_sink();

        let output = storage.step(
            &FrameTime::uniform(1.0),
            &MotionSettings::default(),
            &sink,
        );

        assert_eq!(output.report.completed, vec![plain]);
        assert!(storage.get(plain.key()).is_none());
        assert_eq!(
            storage.get(kept.key()).map(|record| record.core.state.status),
            Some(MotionStatus::Completed)
        );
        assert_eq!(storage.value(kept.key()), Some(&10.0));
    }

    #[test]
    fn test_parallel_step_matches_serial() {
        let settings = MotionSettings {
            parallel_threshold: 1,
            parallel_batch_size: 3,
            ..MotionSettings::default()
        };
        let mut storage = MotionStorage::new(StorageId(0), 0);
        let handles: Vec<_> = (1..=40)
            .map(|i| storage.insert(record(f64::from(i), Callbacks::default())))
            .collect();
        let (_, sink) = collecting_sink();

        let output = storage.step(&FrameTime::uniform(1.0), &settings, &sink);

        assert_eq!(output.report.completed, vec![handles[0]]);
        for (i, handle) in handles.iter().enumerate().skip(1) {
            let expected = 10.0 / (i + 1) as f32;
            let value = *storage.value(handle.key()).unwrap();
            assert!((value - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn test_failing_callback_does_not_stop_batch() {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let mut storage = MotionStorage::new(StorageId(0), 4);

        for i in 0..3 {
            let fired = Arc::clone(&fired);
            let callbacks = Callbacks {
                on_update: Some(Box::new(move |_: &f32| -> anyhow::Result<()> {
                    if i == 1 {
                        anyhow::bail!("callback {i} failed");
                    }
                    fired.lock().unwrap().push(i);
                    Ok(())
                }) as UpdateCallback<f32>),
                ..Callbacks::default()
            };
            storage.insert(record(1.0, callbacks));
        }

        let (errors, sink) = collecting_sink();
        let output = storage.step(
            &FrameTime::uniform(0.25),
            &MotionSettings::default(),
            &sink,
        );

        assert_eq!(output.report.failures, 1);
        assert_eq!(fired.lock().unwrap().as_slice(), &[0, 2]);
        let errors = errors.lock().unwrap();
        assert!(matches!(
            &errors[0],
            MotionError::CallbackFailure { message, .. } if message == "callback 1 failed"
        ));
    }

    #[test]
    fn test_panicking_callback_cancels_when_requested() {
        let canceled = Arc::new(Mutex::new(false));
        let canceled_flag = Arc::clone(&canceled);
        let mut core = MotionCore::new(MotionConfig::tween(1.0));
        core.config.cancel_on_error = true;
        let callbacks = Callbacks {
            on_update: Some(Box::new(|_: &f32| -> anyhow::Result<()> { panic!("boom") })
                as UpdateCallback<f32>),
            on_cancel: Some(Box::new(move || -> anyhow::Result<()> {
                *canceled_flag.lock().unwrap() = true;
                Ok(())
            }) as EventCallback),
            ..Callbacks::default()
        };

        let mut storage = MotionStorage::new(StorageId(2), 1);
        let handle = storage.insert(MotionRecord::new(core, 0.0, 1.0, callbacks));
        let (errors, sink) = collecting_sink();

        let output = storage.step(
            &FrameTime::new(secs_to_nanos(0.1), 0, 0),
            &MotionSettings::default(),
            &sink,
        );

        assert_eq!(output.report.canceled, vec![handle]);
        assert!(*canceled.lock().unwrap());
        assert!(storage.is_empty());
        assert!(matches!(
            &errors.lock().unwrap()[0],
            MotionError::CallbackFailure { message, .. } if message.contains("boom")
        ));
    }

    #[test]
    fn test_sequence_children_are_not_stepped() {
        let mut storage = MotionStorage::new(StorageId(0), 1);
        let handle = storage.insert(record(1.0, Callbacks::default()));
        if let Some(core) = storage.core_mut(handle.key()) {
            core.state.is_in_sequence = true;
        }
        let (_, sink) = collecting_sink();

        storage.step(
            &FrameTime::new(NANOS_PER_SECOND, NANOS_PER_SECOND, NANOS_PER_SECOND),
            &MotionSettings::default(),
            &sink,
        );

        let core = storage.core(handle.key()).unwrap();
        assert_eq!(core.state.status, MotionStatus::Scheduled);
        assert_eq!(core.state.time, 0);
    }
}
