//! Error sink
//!
//! Callback failures during batch updates never propagate out of the update
//! call. They are handed to an [`ErrorSink`] injected into the manager at
//! construction time, which decides how to surface them.

use crate::error::MotionError;
use std::sync::Arc;

/// Receives errors that cannot be returned synchronously to a caller
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &MotionError);
}

/// Shared, clonable error sink
pub type SharedErrorSink = Arc<dyn ErrorSink>;

/// Default sink: logs every failure through `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, error: &MotionError) {
        match error.handle() {
            Some(handle) => tracing::error!(
                storage = handle.storage().0,
                index = handle.index(),
                version = handle.version(),
                "unhandled motion error: {}",
                error
            ),
            None => tracing::error!("unhandled motion error: {}", error),
        }
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&MotionError) + Send + Sync,
{
    fn report(&self, error: &MotionError) {
        self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::MotionHandle;
    use std::sync::Mutex;

    #[test]
    fn test_closure_sink_receives_errors() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let sink: SharedErrorSink = Arc::new(move |error: &MotionError| {
            seen_clone.lock().unwrap().push(error.clone());
        });

        let error = MotionError::CallbackFailure {
            handle: MotionHandle::default(),
            message: "boom".to_string(),
        };
        sink.report(&error);

        assert_eq!(seen.lock().unwrap().as_slice(), &[error]);
    }
}
