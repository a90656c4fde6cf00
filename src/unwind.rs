//! Panic isolation for chunk callbacks, in the style of rayon's unwind helpers.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::string::ToString;
use core::any::Any;
use core::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::panic::resume_unwind;
use std::thread::Result;

/// Executes `f` and captures any panic, translating that panic into a
/// `Err` result. The caller either resumes the panic later with
/// `resume_unwinding` or records it, so `f` can be treated as exception safe.
#[inline(always)]
pub fn halt_unwinding<F, R>(func: F) -> Result<R>
where
    F: FnOnce() -> R,
{
    catch_unwind(AssertUnwindSafe(func))
}

#[cold]
pub fn resume_unwinding(payload: Box<dyn Any + Send>) -> ! {
    resume_unwind(payload)
}

/// Extracts the message from a panic payload. `panic!` produces either a
/// `&'static str` or a `String`; anything else came from `panic_any`.
#[cold]
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
