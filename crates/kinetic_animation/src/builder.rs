//! Fluent motion construction
//!
//! ```ignore
//! let mut manager = MotionManager::new();
//! let opacity = Arc::new(Mutex::new(Style::default()));
//!
//! let handle = MotionBuilder::tween(0.0f32, 1.0, 0.3)
//!     .with_ease(Ease::OutCubic)
//!     .with_loops(2)
//!     .with_loop_type(LoopType::Yoyo)
//!     .bind_to(Arc::clone(&opacity), |style, value| style.opacity = *value)
//!     .on_complete(|| Ok(()))
//!     .schedule(&mut manager);
//! ```

use crate::easing::{Ease, EaseCurve};
use crate::manager::MotionManager;
use crate::motion::{DelayType, LoopType, MotionConfig, MotionCore};
use crate::spring::{SpringOptions, SpringState};
use crate::storage::{Callbacks, MotionRecord};
use kinetic_core::{secs_to_nanos, Interpolate, Lanes, MotionHandle, MotionTimeKind};
use std::sync::{Arc, Mutex};

/// Builder for one motion
///
/// Options left unset fall back to the manager's [`crate::MotionSettings`]
/// when the motion is scheduled.
pub struct MotionBuilder<T: Interpolate> {
    config: MotionConfig,
    start: T,
    end: T,
    spring: Option<(SpringState, fn([f32; 4]) -> T)>,
    callbacks: Callbacks<T>,
    ease: Option<Ease>,
    time_kind: Option<MotionTimeKind>,
    skip_values_during_delay: Option<bool>,
    cancel_on_error: Option<bool>,
    playback_speed: f32,
    preserve: bool,
}

impl<T: Interpolate> MotionBuilder<T> {
    /// Interpolate from `start` to `end` over `duration` seconds per loop
    pub fn tween(start: T, end: T, duration: f64) -> Self {
        Self::with_config(MotionConfig::tween(duration), start, end)
    }

    fn with_config(config: MotionConfig, start: T, end: T) -> Self {
        Self {
            config,
            start,
            end,
            spring: None,
            callbacks: Callbacks::default(),
            ease: None,
            time_kind: None,
            skip_values_during_delay: None,
            cancel_on_error: None,
            playback_speed: 1.0,
            preserve: false,
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = Some(ease);
        self
    }

    /// Ease with a custom curve
    pub fn with_curve(mut self, curve: EaseCurve) -> Self {
        self.ease = Some(Ease::Custom);
        self.config.curve = Some(Arc::new(curve));
        self
    }

    /// Number of loops; [`crate::INFINITE_LOOPS`] never stops
    pub fn with_loops(mut self, loops: i32) -> Self {
        self.config.loops = loops;
        self
    }

    pub fn with_loop_type(mut self, loop_type: LoopType) -> Self {
        self.config.loop_type = loop_type;
        self
    }

    pub fn with_delay(mut self, secs: f64, delay_type: DelayType) -> Self {
        self.config.delay = secs_to_nanos(secs).max(0);
        self.config.delay_type = delay_type;
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

    pub fn with_cancel_on_error(mut self, cancel: bool) -> Self {
        self.cancel_on_error = Some(cancel);
        self
    }

    pub fn skip_values_during_delay(mut self, skip: bool) -> Self {
        self.skip_values_during_delay = Some(skip);
        self
    }

    /// Keep the record alive after it finishes
    pub fn preserve(mut self) -> Self {
        self.preserve = true;
        self
    }

    // =========================================================================
    // Callbacks
    // =========================================================================

    /// Called with every new value
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&T) -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.on_update = Some(Box::new(callback));
        self
    }

    /// Infallible form of [`Self::on_update`]
    pub fn bind<F>(self, mut setter: F) -> Self
    where
        F: FnMut(&T) + Send + 'static,
    {
        self.on_update(move |value| {
            setter(value);
            Ok(())
        })
    }

    /// Write every new value into a shared target
    pub fn bind_to<S>(self, target: Arc<Mutex<S>>, setter: fn(&mut S, &T)) -> Self
    where
        S: Send + 'static,
    {
        self.on_update(move |value| {
            let mut target = target
                .lock()
                .map_err(|_| anyhow::anyhow!("bound target lock poisoned"))?;
            setter(&mut target, value);
            Ok(())
        })
    }

    pub fn on_loop_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut(i32) -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.on_loop_complete = Some(Box::new(callback));
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.on_complete = Some(Box::new(callback));
        self
    }

    pub fn on_cancel<F>(mut self, callback: F) -> Self
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        self.callbacks.on_cancel = Some(Box::new(callback));
        self
    }

    /// Allocate the record and return its handle
    ///
    /// Nothing is written or called until the next update.
    pub fn schedule(self, manager: &mut MotionManager) -> MotionHandle {
        let settings = manager.settings();
        let mut config = self.config;
        config.ease = self.ease.unwrap_or(settings.default_ease);
        config.time_kind = self.time_kind.unwrap_or(settings.default_time_kind);
        config.skip_values_during_delay = self
            .skip_values_during_delay
            .unwrap_or(settings.skip_values_during_delay);
        config.cancel_on_error = self.cancel_on_error.unwrap_or(settings.cancel_on_error);

        let (mut core, from_lanes) = match self.spring {
            Some((spring, from_lanes)) => {
                (MotionCore::with_spring(config, spring), Some(from_lanes))
            }
            None => (MotionCore::new(config), None),
        };
        core.state.playback_speed = self.playback_speed;
        core.state.is_preserved = self.preserve;

        let mut record = MotionRecord::new(core, self.start, self.end, self.callbacks);
        if let Some(from_lanes) = from_lanes {
            record = record.with_lanes(from_lanes);
        }
        manager.insert(record)
    }
}

impl<T: Lanes> MotionBuilder<T> {
    /// Spring from `start` toward `target` until it settles
    pub fn spring(start: T, target: T, options: SpringOptions) -> Self {
        let mut builder = Self::with_config(MotionConfig::spring(options), start, target);
        let from_lanes: fn([f32; 4]) -> T = T::from_lanes;
        builder.spring = Some((SpringState::new(start, target), from_lanes));
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_core::{FrameTime, MotionStatus, Vec2};

    #[derive(Default)]
    struct Widget {
        position: Vec2,
    }

    #[test]
    fn test_bind_to_writes_target() {
        let mut manager = MotionManager::new();
        let widget = Arc::new(Mutex::new(Widget::default()));

        MotionBuilder::tween(Vec2::ZERO, Vec2::new(100.0, 50.0), 1.0)
            .bind_to(Arc::clone(&widget), |widget, value| widget.position = *value)
            .schedule(&mut manager);

        manager.update(FrameTime::uniform(0.5));
        assert_eq!(widget.lock().unwrap().position, Vec2::new(50.0, 25.0));
    }

    #[test]
    fn test_settings_supply_defaults() {
        let settings = crate::MotionSettings {
            default_ease: Ease::InQuad,
            ..crate::MotionSettings::default()
        };
        let mut manager = MotionManager::with_settings(settings);
        let defaulted = MotionBuilder::tween(0.0f32, 1.0, 1.0).schedule(&mut manager);
        let explicit = MotionBuilder::tween(0.0f32, 1.0, 1.0)
            .with_ease(Ease::Linear)
            .schedule(&mut manager);

        manager.update(FrameTime::uniform(0.5));
        assert_eq!(manager.value::<f32>(defaulted), Ok(0.25));
        assert_eq!(manager.value::<f32>(explicit), Ok(0.5));
    }

    #[test]
    fn test_custom_curve() {
        let mut manager = MotionManager::new();
        let handle = MotionBuilder::tween(0.0f32, 10.0, 1.0)
            .with_curve(EaseCurve::from_points(&[(0.0, 0.0), (0.5, 1.0), (1.0, 1.0)]))
            .schedule(&mut manager);

        manager.update(FrameTime::uniform(0.5));
        assert!((manager.value::<f32>(handle).unwrap() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_spring_builder_drives_lanes() {
        let mut manager = MotionManager::new();
        let target = Vec2::new(10.0, -10.0);
        let handle = MotionBuilder::spring(Vec2::ZERO, target, SpringOptions::snappy())
            .preserve()
            .schedule(&mut manager);

        for _ in 0..240 {
            manager.update(FrameTime::uniform(1.0 / 60.0));
        }

        assert_eq!(manager.status(handle), Ok(MotionStatus::Completed));
        assert_eq!(manager.value::<Vec2>(handle), Ok(target));
    }

    #[test]
    fn test_string_reveal_motion() {
        let mut manager = MotionManager::new();
        let handle = MotionBuilder::tween(String::from("....."), String::from("hello"), 1.0)
            .schedule(&mut manager);

        manager.update(FrameTime::uniform(0.4));
        assert_eq!(manager.value::<String>(handle).unwrap(), "he...");
    }
}
