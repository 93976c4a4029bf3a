//! Motion evaluation core
//!
//! A [`MotionCore`] is the value-agnostic part of a motion record: its timing
//! configuration, lifecycle state, and (for springs) the damper state. Each
//! step turns elapsed time into a [`Sample`] that the owning storage maps to a
//! concrete value. Nothing here touches callbacks, so stepping is safe to run
//! in parallel across records.
//!
//! Duration-based motions are stateless given their elapsed time: the whole
//! lifecycle is recomputed from `time` by [`sample_tween`], which is what makes
//! seeking trivial. Spring motions carry value and velocity between steps and
//! therefore only move forward.

use crate::easing::{evaluate_with, Ease, EaseCurve};
use crate::spring::{SpringOptions, SpringSolver, SpringState};
use kinetic_core::{nanos_to_secs, secs_to_nanos, MotionStatus, MotionTimeKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Loop count meaning "never stop"
pub const INFINITE_LOOPS: i32 = -1;

/// How consecutive loops relate to each other
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopType {
    /// Every loop plays start to end
    #[default]
    Restart,
    /// Odd loops play the eased curve backwards in value: `1 - ease(t)`
    Flip,
    /// Odd loops play mirrored in time: `ease(1 - t)`
    Yoyo,
    /// Each loop continues from where the previous one ended
    Incremental,
}

/// When the start delay applies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayType {
    /// Once, before the first loop
    #[default]
    FirstLoop,
    /// Before every loop
    EveryLoop,
}

/// Duration-based or spring-based
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionKind {
    /// Fixed duration in nanoseconds per loop
    Tween { duration: i64 },
    /// Runs until the spring settles on its target
    Spring(SpringOptions),
}

/// Timing description of one motion
#[derive(Clone, Debug, PartialEq)]
pub struct MotionConfig {
    pub kind: MotionKind,
    /// Number of loops, or [`INFINITE_LOOPS`]
    pub loops: i32,
    /// Start delay in nanoseconds
    pub delay: i64,
    pub delay_type: DelayType,
    pub loop_type: LoopType,
    pub ease: Ease,
    /// Sampled when `ease` is [`Ease::Custom`]
    pub curve: Option<Arc<EaseCurve>>,
    pub time_kind: MotionTimeKind,
    /// Leave the output untouched while delayed instead of writing the start value
    pub skip_values_during_delay: bool,
    /// Cancel the motion when one of its callbacks fails
    pub cancel_on_error: bool,
}

impl MotionConfig {
    /// Duration-based motion lasting `duration` seconds per loop
    pub fn tween(duration: f64) -> Self {
        Self::tween_nanos(secs_to_nanos(duration))
    }

    pub fn tween_nanos(duration: i64) -> Self {
        Self::with_kind(MotionKind::Tween {
            duration: duration.max(0),
        })
    }

    pub fn spring(options: SpringOptions) -> Self {
        Self::with_kind(MotionKind::Spring(options))
    }

    fn with_kind(kind: MotionKind) -> Self {
        Self {
            kind,
            loops: 1,
            delay: 0,
            delay_type: DelayType::default(),
            loop_type: LoopType::default(),
            ease: Ease::default(),
            curve: None,
            time_kind: MotionTimeKind::default(),
            skip_values_during_delay: false,
            cancel_on_error: false,
        }
    }

    /// Clamp out-of-range fields: zero loops means one, any negative count
    /// means infinite, negative delays and durations become zero
    pub fn normalized(mut self) -> Self {
        self.loops = match self.loops {
            0 => 1,
            n if n < 0 => INFINITE_LOOPS,
            n => n,
        };
        self.delay = self.delay.max(0);
        if let MotionKind::Tween { duration } = &mut self.kind {
            *duration = (*duration).max(0);
        }
        self
    }

    pub fn is_spring(&self) -> bool {
        matches!(self.kind, MotionKind::Spring(_))
    }

    pub fn is_infinite(&self) -> bool {
        !self.is_spring() && self.loops == INFINITE_LOOPS
    }

    /// Duration of one loop; `None` for springs
    pub fn duration(&self) -> Option<i64> {
        match self.kind {
            MotionKind::Tween { duration } => Some(duration),
            MotionKind::Spring(_) => None,
        }
    }

    /// Time from schedule to natural completion; `None` for springs and
    /// infinite loops
    pub fn total_duration(&self) -> Option<i64> {
        let duration = self.duration()?;
        if self.is_infinite() {
            return None;
        }
        let loops = i64::from(self.loops.max(1));
        Some(match self.delay_type {
            DelayType::FirstLoop => self
                .delay
                .saturating_add(duration.saturating_mul(loops)),
            DelayType::EveryLoop => self
                .delay
                .saturating_add(duration)
                .saturating_mul(loops),
        })
    }
}

/// Mutable runtime state of a motion record
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    pub status: MotionStatus,
    /// Elapsed time since scheduling, in nanoseconds, after playback speed
    pub time: i64,
    pub completed_loops: i32,
    /// Position inside the current loop before easing
    pub progress: f32,
    pub playback_speed: f32,
    /// Set by the step that changed `status`, cleared by the next one
    pub was_status_changed: bool,
    /// Set by the step that finished a loop, cleared by the next one
    pub was_loop_completed: bool,
    /// Kept alive after finishing
    pub is_preserved: bool,
    /// Driven by a sequence rather than stepped on its own
    pub is_in_sequence: bool,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            status: MotionStatus::Scheduled,
            time: 0,
            completed_loops: 0,
            progress: 0.0,
            playback_speed: 1.0,
            was_status_changed: false,
            was_loop_completed: false,
            is_preserved: false,
            is_in_sequence: false,
        }
    }
}

/// What a step asks the storage to write
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    /// Leave the output as is
    Hold,
    /// Interpolate start to end by this (eased, loop-shaped) factor
    Progress(f32),
    /// Spring lanes to convert back into the value type
    Spring([f32; 4]),
}

/// A duration-based motion evaluated at one point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweenSample {
    pub status: MotionStatus,
    pub completed_loops: i32,
    /// Position inside the current loop, before easing
    pub progress: f32,
    /// Interpolation factor after easing and loop shaping
    pub eased: f32,
}

/// Evaluate a duration-based motion `time` nanoseconds after scheduling
///
/// Pure: the result depends only on the configuration and `time`.
pub fn sample_tween(config: &MotionConfig, time: i64) -> TweenSample {
    let duration = config.duration().unwrap_or(0).max(0);
    let delay = config.delay.max(0);
    let time = time.max(0);
    let finite = config.loops != INFINITE_LOOPS;
    let loops = i64::from(config.loops.max(1));

    let (period, lead) = match config.delay_type {
        DelayType::FirstLoop => (duration, delay),
        DelayType::EveryLoop => (delay.saturating_add(duration), 0),
    };

    if time < lead {
        return at(config, MotionStatus::Delayed, 0, 0.0);
    }
    let local = time - lead;

    if period == 0 {
        return if finite {
            completed(config, loops)
        } else {
            at(config, MotionStatus::Playing, 0, 1.0)
        };
    }

    let loop_index = local / period;
    if finite && loop_index >= loops {
        return completed(config, loops);
    }
    let within = local % period;

    match config.delay_type {
        DelayType::EveryLoop if within < delay => {
            at(config, MotionStatus::Delayed, loop_index, 0.0)
        }
        DelayType::EveryLoop => at(
            config,
            MotionStatus::Playing,
            loop_index,
            ratio(within - delay, duration),
        ),
        DelayType::FirstLoop => at(
            config,
            MotionStatus::Playing,
            loop_index,
            ratio(within, duration),
        ),
    }
}

fn ratio(part: i64, whole: i64) -> f32 {
    if whole <= 0 {
        1.0
    } else {
        (part as f64 / whole as f64) as f32
    }
}

fn at(config: &MotionConfig, status: MotionStatus, loop_index: i64, progress: f32) -> TweenSample {
    TweenSample {
        status,
        completed_loops: loop_index.min(i64::from(i32::MAX)) as i32,
        progress,
        eased: shape(config, progress, loop_index),
    }
}

fn completed(config: &MotionConfig, loops: i64) -> TweenSample {
    TweenSample {
        status: MotionStatus::Completed,
        completed_loops: loops.min(i64::from(i32::MAX)) as i32,
        progress: 1.0,
        eased: shape(config, 1.0, loops - 1),
    }
}

/// Apply easing and the loop policy to in-loop progress
fn shape(config: &MotionConfig, progress: f32, loop_index: i64) -> f32 {
    let ease = |t: f32| evaluate_with(t, config.ease, config.curve.as_deref());
    let odd = loop_index % 2 == 1;
    match config.loop_type {
        LoopType::Restart => ease(progress),
        LoopType::Flip if odd => 1.0 - ease(progress),
        LoopType::Yoyo if odd => ease(1.0 - progress),
        LoopType::Flip | LoopType::Yoyo => ease(progress),
        LoopType::Incremental => ease(progress) + loop_index as f32,
    }
}

/// Scale a frame delta by a playback speed
pub fn scale_delta(delta: i64, speed: f32) -> i64 {
    if speed == 1.0 {
        delta
    } else {
        (delta as f64 * f64::from(speed)).round() as i64
    }
}

/// Value-agnostic state of one motion record
#[derive(Clone, Debug, PartialEq)]
pub struct MotionCore {
    pub config: MotionConfig,
    pub state: MotionState,
    /// Only meaningful for spring motions
    pub spring: SpringState,
}

impl MotionCore {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config: config.normalized(),
            state: MotionState::default(),
            spring: SpringState::default(),
        }
    }

    pub fn with_spring(config: MotionConfig, spring: SpringState) -> Self {
        Self {
            spring,
            ..Self::new(config)
        }
    }

    fn begin_step(&mut self) {
        self.state.was_status_changed = false;
        self.state.was_loop_completed = false;
    }

    fn set_status(&mut self, status: MotionStatus) {
        if self.state.status != status {
            self.state.status = status;
            self.state.was_status_changed = true;
        }
    }

    /// Advance by one frame delta (nanoseconds, before playback speed)
    ///
    /// Finished records do not move.
    pub fn advance(&mut self, delta: i64) -> Sample {
        self.begin_step();
        if !self.state.status.is_running() {
            return Sample::Hold;
        }

        let previous = self.state.time;
        let delta = scale_delta(delta, self.state.playback_speed).max(0);
        self.state.time = previous.saturating_add(delta);

        match self.config.kind {
            MotionKind::Tween { .. } => self.evaluate_tween(),
            MotionKind::Spring(options) => self.evaluate_spring(previous, &options),
        }
    }

    /// Jump a duration-based motion to `time` nanoseconds after scheduling
    ///
    /// A preserved completed motion re-enters playback when seeked back into
    /// range. Springs have no timeline; callers reject them before seeking.
    pub fn seek(&mut self, time: i64) -> Sample {
        self.begin_step();
        if self.config.is_spring() {
            return Sample::Hold;
        }
        self.state.time = time.max(0);
        self.evaluate_tween()
    }

    /// Run to the natural end right away
    ///
    /// Infinite tweens cannot complete; callers reject them first.
    pub fn complete(&mut self) -> Sample {
        self.begin_step();
        match self.config.kind {
            MotionKind::Tween { .. } => match self.config.total_duration() {
                Some(total) => {
                    self.state.time = total;
                    self.evaluate_tween()
                }
                None => Sample::Hold,
            },
            MotionKind::Spring(options) => {
                self.spring.snap_to_rest(&options);
                self.set_status(MotionStatus::Completed);
                Sample::Spring(self.spring.value)
            }
        }
    }

    pub fn cancel(&mut self) {
        self.begin_step();
        self.set_status(MotionStatus::Canceled);
    }

    /// Mark completed where it stands, without moving the value
    pub fn finish(&mut self) {
        self.begin_step();
        self.set_status(MotionStatus::Completed);
    }

    /// The sample for the current state, without stepping
    pub fn current(&self) -> Sample {
        match self.config.kind {
            MotionKind::Tween { .. } => {
                Sample::Progress(sample_tween(&self.config, self.state.time).eased)
            }
            MotionKind::Spring(_) => Sample::Spring(self.spring.value),
        }
    }

    /// Point a spring at a new target; velocity carries over
    ///
    /// A completed spring that is still alive resumes playing. A
    /// duration-limited spring restarts its clock, so the new target gets the
    /// full duration.
    pub fn retarget(&mut self, target: [f32; 4]) {
        self.spring.target = target;
        if let MotionKind::Spring(SpringOptions {
            solver: SpringSolver::DurationLimit { .. },
            ..
        }) = self.config.kind
        {
            self.state.time = self.state.time.min(self.config.delay);
        }
        self.wake_spring();
    }

    /// Overwrite a spring's current value and velocity
    pub fn set_spring_state(&mut self, value: [f32; 4], velocity: [f32; 4]) {
        self.spring.value = value;
        self.spring.velocity = velocity;
        self.spring.intermediate = value;
        self.spring.intermediate_velocity = [0.0; 4];
        self.wake_spring();
    }

    fn wake_spring(&mut self) {
        if self.state.status == MotionStatus::Completed {
            self.state.status = MotionStatus::Playing;
            self.state.time = self.config.delay;
        }
    }

    fn evaluate_tween(&mut self) -> Sample {
        let sample = sample_tween(&self.config, self.state.time);
        if sample.completed_loops > self.state.completed_loops {
            self.state.was_loop_completed = true;
        }
        self.state.completed_loops = sample.completed_loops;
        self.state.progress = sample.progress;
        self.set_status(sample.status);

        if sample.status == MotionStatus::Delayed && self.config.skip_values_during_delay {
            Sample::Hold
        } else {
            Sample::Progress(sample.eased)
        }
    }

    fn evaluate_spring(&mut self, previous: i64, options: &SpringOptions) -> Sample {
        let delay = self.config.delay;
        if self.state.time < delay {
            self.set_status(MotionStatus::Delayed);
            return if self.config.skip_values_during_delay {
                Sample::Hold
            } else {
                Sample::Spring(self.spring.value)
            };
        }

        let active_from = previous.max(delay);
        let dt = nanos_to_secs(self.state.time - active_from) as f32;
        let elapsed = nanos_to_secs(active_from - delay) as f32;
        self.spring.step(dt, elapsed, options);

        if self.spring.is_settled(options) {
            self.spring.snap_to_rest(options);
            self.state.progress = 1.0;
            self.set_status(MotionStatus::Completed);
        } else {
            self.set_status(MotionStatus::Playing);
        }
        Sample::Spring(self.spring.value)
    }
}
