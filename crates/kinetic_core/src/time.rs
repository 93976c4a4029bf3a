//! Frame time
//!
//! Motion timelines are measured in signed nanoseconds. Each host frame hands
//! the manager three deltas: game time (scaled), unscaled time, and realtime.
//! Every record picks which of the three advances it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert seconds to nanoseconds, saturating at the `i64` range
pub fn secs_to_nanos(secs: f64) -> i64 {
    let nanos = secs * NANOS_PER_SECOND as f64;
    if nanos.is_nan() {
        0
    } else {
        nanos.clamp(i64::MIN as f64, i64::MAX as f64) as i64
    }
}

/// Convert nanoseconds to seconds
pub fn nanos_to_secs(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_SECOND as f64
}

/// Which frame delta advances a motion
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionTimeKind {
    /// Game time, affected by the host's time scale
    #[default]
    Time,
    /// Game time ignoring the time scale
    UnscaledTime,
    /// Wall clock time
    Realtime,
}

/// The three deltas of one host frame, in nanoseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTime {
    pub delta: i64,
    pub unscaled_delta: i64,
    pub realtime_delta: i64,
}

impl FrameTime {
    pub fn new(delta: i64, unscaled_delta: i64, realtime_delta: i64) -> Self {
        Self {
            delta,
            unscaled_delta,
            realtime_delta,
        }
    }

    /// All three deltas equal to `secs`
    pub fn uniform(secs: f64) -> Self {
        let nanos = secs_to_nanos(secs);
        Self::new(nanos, nanos, nanos)
    }

    pub fn from_secs(delta: f64, unscaled_delta: f64, realtime_delta: f64) -> Self {
        Self::new(
            secs_to_nanos(delta),
            secs_to_nanos(unscaled_delta),
            secs_to_nanos(realtime_delta),
        )
    }

    /// Build from an unscaled frame duration and the host's time scale
    pub fn from_duration(elapsed: Duration, time_scale: f64) -> Self {
        let unscaled = elapsed.as_secs_f64();
        Self::from_secs(unscaled * time_scale, unscaled, unscaled)
    }

    /// The delta a motion with the given time kind should advance by
    pub fn delta_for(&self, kind: MotionTimeKind) -> i64 {
        match kind {
            MotionTimeKind::Time => self.delta,
            MotionTimeKind::UnscaledTime => self.unscaled_delta,
            MotionTimeKind::Realtime => self.realtime_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secs_to_nanos() {
        assert_eq!(secs_to_nanos(1.5), 1_500_000_000);
        assert_eq!(secs_to_nanos(f64::NAN), 0);
        assert_eq!(secs_to_nanos(f64::INFINITY), i64::MAX);
    }

    #[test]
    fn test_time_scale_only_affects_scaled_delta() {
        let frame = FrameTime::from_duration(Duration::from_millis(100), 0.5);
        assert_eq!(frame.delta_for(MotionTimeKind::Time), 50_000_000);
        assert_eq!(frame.delta_for(MotionTimeKind::UnscaledTime), 100_000_000);
        assert_eq!(frame.delta_for(MotionTimeKind::Realtime), 100_000_000);
    }
}
