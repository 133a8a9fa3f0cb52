//! Small helpers for turning a `Result`/`Option` into a logged, discarded
//! value instead of propagating or panicking — used where one bad cluster
//! shouldn't abort the whole merge.

use std::fmt::Debug;

/// Logs `Err`/`None` at `error` level and returns `Option<T>`, dropping the
/// error after logging it.
pub fn trace_ok_err<T, E: Debug>(result: Result<T, E>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::error!("{e:?}");
            None
        }
    }
}

/// Like [`trace_ok_err`] but logs at `warn` level, for issues that are
/// expected to happen occasionally during normal operation.
pub fn trace_ok_warn<T, E: Debug>(result: Result<T, E>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{e:?}");
            None
        }
    }
}
