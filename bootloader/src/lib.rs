/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Multi-boot bootloader core: flag page, image checks, installers,
    staging writer and the boot dispatcher.

--*/

#![cfg_attr(target_arch = "arm", no_std)]

pub mod boot_status;
pub use boot_status::BootState;
pub mod dispatcher;
pub use dispatcher::{BootDispatcher, BootOutcome};
pub mod flag_page;
pub use flag_page::FlagPageStore;
pub mod flash;
pub mod image_verifier;
pub use image_verifier::{EntryPoint, ImageChecker, ImageVerifier, StorageKind};
pub mod installer;
pub mod session;
pub use session::BootSession;
pub mod staging;
pub use staging::StagingWriter;

use core::cell::RefCell;
use critical_section::Mutex;

pub trait FatalErrorHandler {
    fn fatal_error(&mut self, code: u32) -> !;
}

type FatalHandlerRef = &'static mut (dyn FatalErrorHandler + Send);

static FATAL_ERROR_HANDLER: Mutex<RefCell<Option<FatalHandlerRef>>> =
    Mutex::new(RefCell::new(None));

/// Set the fatal error handler.
///
/// The handler is only ever invoked from [`fatal_error`].
pub fn set_fatal_error_handler(handler: &'static mut (dyn FatalErrorHandler + Send)) {
    critical_section::with(|cs| {
        *FATAL_ERROR_HANDLER.borrow_ref_mut(cs) = Some(handler);
    });
}

/// Reports an unrecoverable error and never returns. Image verification
/// failures are not fatal and never end up here.
#[inline(never)]
#[allow(clippy::empty_loop)]
pub fn fatal_error(code: u32) -> ! {
    bootutil::println!("[amboot] Fatal error {}", bootutil::HexWord(code));
    critical_section::with(|cs| {
        if let Some(handler) = FATAL_ERROR_HANDLER.borrow_ref_mut(cs).as_mut() {
            handler.fatal_error(code);
        }
    });
    // If no handler is set, just loop forever
    loop {}
}
