//! Kinetic Animation System
//!
//! Spring dampers, easing, motion evaluation, and batched frame updates.
//!
//! # Features
//!
//! - **Dampers**: Six closed-form and semi-implicit spring solvers over four float lanes
//! - **Easing**: The standard curve families plus user-supplied keyframed curves
//! - **Motions**: Tweens and springs with loops, delays, playback speed, and preservation
//! - **Batch Updates**: Parallel stepping, ordered callbacks, and compaction per value type
//! - **Sequences**: Place tweens on a shared timeline with append / join / insert
//! - **Handles**: Generation-counted, so stale handles are rejected instead of aliasing
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{Ease, MotionBuilder, MotionManager};
//! use kinetic_core::FrameTime;
//!
//! let mut manager = MotionManager::new();
//! let handle = MotionBuilder::tween(0.0f32, 100.0, 1.0)
//!     .with_ease(Ease::Linear)
//!     .schedule(&mut manager);
//!
//! manager.update(FrameTime::uniform(0.5));
//! assert_eq!(manager.value::<f32>(handle), Ok(50.0));
//! ```

pub mod builder;
pub mod damper;
pub mod easing;
pub mod manager;
pub mod motion;
pub mod sequence;
pub mod settings;
pub mod spring;
pub mod storage;

pub use builder::MotionBuilder;
pub use easing::{evaluate, evaluate_with, CurveKey, Ease, EaseCurve};
pub use manager::{FrameReport, MotionManager};
pub use motion::{
    sample_tween, DelayType, LoopType, MotionConfig, MotionCore, MotionKind, MotionState, Sample,
    TweenSample, INFINITE_LOOPS,
};
pub use sequence::{Sequence, SequenceBuilder};
pub use settings::MotionSettings;
pub use spring::{Spring, SpringOptions, SpringSolver, SpringState};
pub use storage::{
    AnyStorage, Callbacks, EventCallback, LoopCallback, MotionRecord, MotionStorage, StepOutput,
    StepReport, UpdateCallback,
};

pub use kinetic_core::{
    ErrorSink, FrameTime, Interpolate, Lanes, MotionError, MotionHandle, MotionStatus,
    MotionTimeKind, SequenceHandle, SharedErrorSink, TracingErrorSink,
};
