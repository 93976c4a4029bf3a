//! Motion lifecycle
//!
//! ```text
//! None -> Scheduled -> Delayed -> Playing -> Completed
//!             |           |          |
//!             +-----------+----------+----> Canceled
//! ```
//!
//! Transitions never re-enter `Scheduled`. `Playing -> Playing` happens on a
//! loop wrap, `Delayed -> Playing` on delay expiry, and a preserved
//! `Completed` record may go back to `Delayed`/`Playing` when seeked.

/// Lifecycle status of a motion record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionStatus {
    /// Slot not allocated
    #[default]
    None,
    /// Allocated, not stepped yet
    Scheduled,
    /// Waiting for the start delay to elapse
    Delayed,
    /// Advancing through its timeline or spring simulation
    Playing,
    /// Reached its natural end
    Completed,
    /// Stopped before its natural end
    Canceled,
}

impl MotionStatus {
    /// Scheduled, delayed, or playing
    pub fn is_running(self) -> bool {
        matches!(
            self,
            MotionStatus::Scheduled | MotionStatus::Delayed | MotionStatus::Playing
        )
    }

    /// Completed or canceled
    pub fn is_finished(self) -> bool {
        matches!(self, MotionStatus::Completed | MotionStatus::Canceled)
    }

    /// Whether the lifecycle permits moving from `self` to `to`
    ///
    /// Leaving `Completed` is only legal for preserved records being seeked;
    /// callers enforce the preserve condition, this checks the shape.
    pub fn can_transition_to(self, to: MotionStatus) -> bool {
        use MotionStatus::*;
        match (self, to) {
            (_, None) | (_, Scheduled) => self == to && self != None,
            (None, _) => false,
            (Canceled, other) => other == Canceled,
            (Scheduled, _) => true,
            (Delayed, _) | (Playing, _) | (Completed, _) => true,
        }
    }
}
