//! Kinetic Core
//!
//! Foundational types shared by the Kinetic motion system:
//!
//! - **Values**: Lane-based vector and color types plus the [`Interpolate`] trait
//! - **Handles**: Generation-counted references to motion records
//! - **Status**: The motion lifecycle state machine
//! - **Frame Time**: Scaled / unscaled / realtime deltas in nanoseconds
//! - **Errors**: Typed control-operation failures and the injectable error sink
//!
//! # Example
//!
//! ```rust
//! use kinetic_core::{Interpolate, MotionStatus, Vec2};
//!
//! let a = Vec2::new(0.0, 10.0);
//! let b = Vec2::new(10.0, 20.0);
//! assert_eq!(a.lerp(&b, 0.5), Vec2::new(5.0, 15.0));
//!
//! assert!(MotionStatus::Scheduled.can_transition_to(MotionStatus::Playing));
//! assert!(!MotionStatus::Playing.can_transition_to(MotionStatus::Scheduled));
//! ```

pub mod error;
pub mod handle;
pub mod sink;
pub mod status;
pub mod time;
pub mod value;

pub use error::{MotionError, Result};
pub use handle::{MotionHandle, MotionKey, SequenceHandle, SequenceKey, StorageId};
pub use sink::{ErrorSink, SharedErrorSink, TracingErrorSink};
pub use status::MotionStatus;
pub use time::{nanos_to_secs, secs_to_nanos, FrameTime, MotionTimeKind, NANOS_PER_SECOND};
pub use value::{Color, Interpolate, Lanes, Vec2, Vec3, Vec4};
