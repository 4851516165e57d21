// Licensed under the Apache-2.0 license

//! Stand-ins for the diverging platform hooks. Leaving the bootloader is
//! modelled as an unwinding panic carrying an [`Exit`] payload, which
//! [`run_to_exit`] catches and returns.

use amboot_hil::{HostTransport, ImageLauncher};
use std::panic::{self, AssertUnwindSafe};

/// How control left the bootloader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Exit {
    Launched {
        vector_table: u32,
        stack_pointer: u32,
        reset_vector: u32,
    },
    WaitForHost,
}

#[derive(Default)]
pub struct RecordingLauncher;

impl ImageLauncher for RecordingLauncher {
    fn launch(&mut self, vector_table: u32, stack_pointer: u32, reset_vector: u32) -> ! {
        log::info!(
            "launch: vtor={:#010x} sp={:#010x} rv={:#010x}",
            vector_table,
            stack_pointer,
            reset_vector
        );
        panic::resume_unwind(Box::new(Exit::Launched {
            vector_table,
            stack_pointer,
            reset_vector,
        }))
    }
}

#[derive(Default)]
pub struct RecordingTransport;

impl HostTransport for RecordingTransport {
    fn wait_for_host(&mut self) -> ! {
        log::info!("waiting for host");
        panic::resume_unwind(Box::new(Exit::WaitForHost))
    }
}

/// Runs a diverging boot path and reports where it went.
///
/// The closure's return type is left generic so callers can pass a
/// diverging call directly. Returning at all is treated as a failure, and
/// panics that were not raised by the recording hooks are propagated.
pub fn run_to_exit<R>(f: impl FnOnce() -> R) -> Exit {
    let payload = match panic::catch_unwind(AssertUnwindSafe(|| {
        f();
    })) {
        Ok(()) => panic!("boot path returned"),
        Err(payload) => payload,
    };
    match payload.downcast::<Exit>() {
        Ok(exit) => *exit,
        Err(other) => panic::resume_unwind(other),
    }
}
