use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::HandlerError;

/// Outcome of one contained unit of work that did not succeed.
#[derive(Debug)]
pub(crate) enum Fault {
    Failed(HandlerError),
    Panicked(String),
}

/// Runs one handler, listener or behavior call so that neither an error nor a
/// panic escapes into the tick.
pub(crate) fn contain<T, F>(call: F) -> Result<T, Fault>
where
    F: FnOnce() -> Result<T, HandlerError>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(Fault::Failed(err)),
        Err(payload) => Err(Fault::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
