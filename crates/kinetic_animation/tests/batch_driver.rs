//! Integration tests for the per-frame batch update
//!
//! These tests verify that:
//! - Callback failures are isolated to the record that raised them
//! - Callbacks fire in insertion order, update before loop before complete
//! - Large storages take the parallel path with the same results
//! - The error sink is swappable at runtime

use kinetic_animation::{
    MotionBuilder, MotionError, MotionManager, MotionSettings, MotionStatus, SharedErrorSink,
};
use kinetic_core::{FrameTime, Vec3};
use std::sync::{Arc, Mutex};

fn collecting_sink() -> (Arc<Mutex<Vec<MotionError>>>, SharedErrorSink) {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&errors);
    let sink: SharedErrorSink = Arc::new(move |error: &MotionError| {
        seen.lock().unwrap().push(error.clone());
    });
    (errors, sink)
}

/// One failing observer does not stop the rest of the batch
#[test]
fn test_failure_is_isolated() {
    let (errors, sink) = collecting_sink();
    let mut manager = MotionManager::new().with_error_sink(sink);
    let written = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let written = Arc::clone(&written);
            MotionBuilder::tween(0.0f32, 10.0, 1.0)
                .on_update(move |value| {
                    if i == 2 {
                        anyhow::bail!("observer {i} is gone");
                    }
                    written.lock().unwrap().push((i, *value));
                    Ok(())
                })
                .schedule(&mut manager)
        })
        .collect();

    let report = manager.update(FrameTime::uniform(0.5));

    assert_eq!(report.motions.failures, 1);
    assert_eq!(
        written.lock().unwrap().as_slice(),
        &[(0, 5.0), (1, 5.0), (3, 5.0)]
    );

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0],
        MotionError::CallbackFailure {
            handle: handles[2],
            message: "observer 2 is gone".to_string(),
        }
    );

    // The failing motion keeps playing by default
    assert_eq!(manager.status(handles[2]), Ok(MotionStatus::Playing));
    assert_eq!(manager.value::<f32>(handles[2]), Ok(5.0));
}

/// With cancel-on-error the failing motion is canceled, the others are not
#[test]
fn test_cancel_on_error() {
    let (errors, sink) = collecting_sink();
    let mut manager = MotionManager::new().with_error_sink(sink);
    let canceled = Arc::new(Mutex::new(false));
    let canceled_clone = Arc::clone(&canceled);

    let failing = MotionBuilder::tween(0.0f32, 1.0, 1.0)
        .with_cancel_on_error(true)
        .on_update(|_| -> anyhow::Result<()> { panic!("observer panicked") })
        .on_cancel(move || {
            *canceled_clone.lock().unwrap() = true;
            Ok(())
        })
        .schedule(&mut manager);
    let healthy = MotionBuilder::tween(0.0f32, 1.0, 1.0).schedule(&mut manager);

    let report = manager.update(FrameTime::uniform(0.25));

    assert_eq!(report.motions.canceled, vec![failing]);
    assert!(*canceled.lock().unwrap());
    assert_eq!(manager.status(failing), Err(MotionError::NotFound(failing)));
    assert_eq!(manager.status(healthy), Ok(MotionStatus::Playing));

    let errors = errors.lock().unwrap();
    assert!(matches!(
        &errors[0],
        MotionError::CallbackFailure { message, .. } if message.contains("observer panicked")
    ));
}

/// Cancel-on-error can be switched on for every motion through settings
#[test]
fn test_cancel_on_error_from_settings() {
    let settings = MotionSettings {
        cancel_on_error: true,
        ..MotionSettings::default()
    };
    let (_, sink) = collecting_sink();
    let mut manager = MotionManager::with_settings(settings).with_error_sink(sink);

    let handle = MotionBuilder::tween(0.0f32, 1.0, 1.0)
        .on_update(|_| Err(anyhow::anyhow!("rejected")))
        .schedule(&mut manager);

    manager.update(FrameTime::uniform(0.1));
    assert!(!manager.is_active(handle));
}

/// Callbacks fire in insertion order; per record, update then loop then complete
#[test]
fn test_callback_order() {
    let mut manager = MotionManager::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second"] {
        let on_update = Arc::clone(&log);
        let on_loop = Arc::clone(&log);
        let on_complete = Arc::clone(&log);
        MotionBuilder::tween(0.0f32, 1.0, 0.5)
            .on_update(move |_| {
                on_update.lock().unwrap().push(format!("{name}: update"));
                Ok(())
            })
            .on_loop_complete(move |loops| {
                on_loop.lock().unwrap().push(format!("{name}: loop {loops}"));
                Ok(())
            })
            .on_complete(move || {
                on_complete.lock().unwrap().push(format!("{name}: complete"));
                Ok(())
            })
            .schedule(&mut manager);
    }

    manager.update(FrameTime::uniform(1.0));

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            "first: update",
            "first: loop 1",
            "first: complete",
            "second: update",
            "second: loop 1",
            "second: complete",
        ]
    );
    assert_eq!(manager.motion_count(), 0);
}

/// Completed records are compacted out and the survivors keep their values
#[test]
fn test_compaction_keeps_survivors() {
    let mut manager = MotionManager::new();
    let durations = [0.5, 2.0, 0.5, 4.0, 0.5];
    let handles: Vec<_> = durations
        .iter()
        .map(|duration| MotionBuilder::tween(0.0f32, 1.0, *duration).schedule(&mut manager))
        .collect();

    let report = manager.update(FrameTime::uniform(1.0));

    assert_eq!(report.motions.stepped, 5);
    assert_eq!(report.motions.completed, vec![handles[0], handles[2], handles[4]]);
    assert_eq!(manager.motion_count(), 2);
    assert_eq!(manager.value::<f32>(handles[1]), Ok(0.5));
    assert_eq!(manager.value::<f32>(handles[3]), Ok(0.25));

    let report = manager.update(FrameTime::uniform(1.0));
    assert_eq!(report.motions.stepped, 2);
    assert_eq!(report.motions.completed, vec![handles[1]]);
}

/// Storages above the threshold step in parallel with identical results
#[test]
fn test_parallel_path_matches_serial() {
    let parallel = MotionSettings {
        parallel_threshold: 8,
        parallel_batch_size: 5,
        ..MotionSettings::default()
    };
    let serial = MotionSettings {
        parallel_threshold: usize::MAX,
        ..MotionSettings::default()
    };

    let run = |settings: MotionSettings| {
        let mut manager = MotionManager::with_settings(settings);
        let handles: Vec<_> = (1..=100)
            .map(|i| {
                let end = Vec3::new(i as f32, -(i as f32), 1.0);
                MotionBuilder::tween(Vec3::ZERO, end, f64::from(i) / 10.0).schedule(&mut manager)
            })
            .collect();
        for _ in 0..30 {
            manager.update(FrameTime::uniform(1.0 / 60.0));
        }
        handles
            .iter()
            .map(|handle| manager.value::<Vec3>(*handle).ok())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(parallel), run(serial));
}

/// `step_storage` returns every value written, in dispatch order
#[test]
fn test_step_storage_returns_values() {
    let mut manager = MotionManager::new();
    let a = MotionBuilder::tween(0.0f32, 2.0, 1.0).schedule(&mut manager);
    let b = MotionBuilder::tween(0.0f32, 4.0, 1.0).schedule(&mut manager);
    let c = MotionBuilder::tween(Vec3::ZERO, Vec3::ONE, 1.0).schedule(&mut manager);

    let output = manager.step_storage::<f32>(FrameTime::uniform(0.5));

    assert_eq!(output.values, vec![(a, 1.0), (b, 2.0)]);
    // Other storages were left alone
    assert_eq!(manager.status(c), Ok(MotionStatus::Scheduled));
    assert_eq!(manager.value::<Vec3>(c), Ok(Vec3::ZERO));
}

/// The sink can be replaced and restored between frames
#[test]
fn test_error_sink_swap() {
    let (errors, sink) = collecting_sink();
    let mut manager = MotionManager::new();

    MotionBuilder::tween(0.0f32, 1.0, 1.0)
        .on_update(|_| Err(anyhow::anyhow!("still failing")))
        .schedule(&mut manager);

    manager.update(FrameTime::uniform(0.1));
    assert!(errors.lock().unwrap().is_empty());

    manager.set_error_sink(sink);
    manager.update(FrameTime::uniform(0.1));
    assert_eq!(errors.lock().unwrap().len(), 1);

    manager.reset_error_sink();
    manager.update(FrameTime::uniform(0.1));
    assert_eq!(errors.lock().unwrap().len(), 1);
}
