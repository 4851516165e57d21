// Licensed under the Apache-2.0 license

/// Runs `f` with exclusive access to the flash controller.
///
/// On hardware this masks interrupts for the duration of `f`: the flash
/// controller must not be interrupted in the middle of an erase or program.
/// Host builds get the `critical-section` std implementation, a global lock.
pub fn with_exclusive_flash_access<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_| f())
}
