//! Error types for motion control operations

use crate::handle::{MotionHandle, SequenceHandle};
use thiserror::Error;

/// Errors surfaced by single-record control operations and callback dispatch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    /// The handle's slot is free, was reused, or never existed
    #[error("motion not found: {0:?}")]
    NotFound(MotionHandle),

    /// The motion was canceled, or completed without being preserved
    #[error("motion already finished: {0:?}")]
    AlreadyFinished(MotionHandle),

    /// The motion is driven by a sequence and cannot be controlled on its own
    #[error("motion is owned by a sequence: {0:?}")]
    InSequence(MotionHandle),

    /// Complete was requested on a motion that loops forever
    #[error("cannot complete an infinitely looping motion, cancel it instead: {0:?}")]
    InfiniteLoopComplete(MotionHandle),

    /// SetTime was requested on a spring motion, which has no timeline to seek
    #[error("spring motions cannot be seeked: {0:?}")]
    SpringSeek(MotionHandle),

    /// A spring-only operation was requested on a duration-based motion
    #[error("motion is not a spring: {0:?}")]
    NotSpring(MotionHandle),

    /// The sequence handle is stale or never existed
    #[error("sequence not found: {0:?}")]
    SequenceNotFound(SequenceHandle),

    /// Complete was requested on a sequence that loops forever
    #[error("cannot complete an infinitely looping sequence, cancel it instead: {0:?}")]
    InfiniteSequenceComplete(SequenceHandle),

    /// An observer callback returned an error or panicked
    #[error("callback failed for {handle:?}: {message}")]
    CallbackFailure {
        handle: MotionHandle,
        message: String,
    },
}

impl MotionError {
    /// The motion handle the error refers to, if it concerns a single motion
    pub fn handle(&self) -> Option<MotionHandle> {
        match self {
            MotionError::NotFound(handle)
            | MotionError::AlreadyFinished(handle)
            | MotionError::InSequence(handle)
            | MotionError::InfiniteLoopComplete(handle)
            | MotionError::SpringSeek(handle)
            | MotionError::NotSpring(handle)
            | MotionError::CallbackFailure { handle, .. } => Some(*handle),
            MotionError::SequenceNotFound(_) | MotionError::InfiniteSequenceComplete(_) => None,
        }
    }

    /// True for the errors produced by handle validation
    pub fn is_stale_handle(&self) -> bool {
        matches!(
            self,
            MotionError::NotFound(_)
                | MotionError::AlreadyFinished(_)
                | MotionError::SequenceNotFound(_)
        )
    }
}

/// Result type for motion control operations
pub type Result<T> = std::result::Result<T, MotionError>;
