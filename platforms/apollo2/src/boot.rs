/*++

Licensed under the Apache-2.0 license.

File Name:

    boot.rs

Abstract:

    File contains the Apollo2 bootloader entry: wires the vendor drivers into
    the dispatcher and leaves through the image or the host transport.

--*/

use crate::config::{APOLLO2_STRAPS, BOOT_MEMORY_MAP, PAGE_BUFFER_SIZE};
use crate::flash::Apollo2Flash;
use crate::gpio::Apollo2Gpio;
use crate::io::{Apollo2FatalErrorHandler, ItmWriter};
use crate::launch::{CortexMLauncher, HostIdle};
use crate::spi_flash::Apollo2SpiFlash;
use amboot_bootloader::{fatal_error, BootDispatcher, BootSession};
use amboot_error::BootError;

static FLASH: Apollo2Flash = Apollo2Flash::new(&BOOT_MEMORY_MAP);

pub(crate) fn boot_entry() -> ! {
    if cfg!(debug_assertions) {
        if let Some(writer) = cortex_m::singleton!(: ItmWriter = ItmWriter {}) {
            bootutil::set_printer(writer);
        }
    }
    match cortex_m::singleton!(: Apollo2FatalErrorHandler = Apollo2FatalErrorHandler {}) {
        Some(handler) => amboot_bootloader::set_fatal_error_handler(handler),
        None => fatal_error(BootError::OutOfRange.code()),
    }
    bootutil::println!("[amboot] Apollo2 bootloader");

    let Some(buffer) = cortex_m::singleton!(: [u8; PAGE_BUFFER_SIZE] = [0; PAGE_BUFFER_SIZE])
    else {
        fatal_error(BootError::OutOfRange.code());
    };
    let session = BootSession::new(&BOOT_MEMORY_MAP, buffer)
        .unwrap_or_else(|err| fatal_error(err.code()));

    let Some(gpio) = cortex_m::singleton!(: Apollo2Gpio = Apollo2Gpio) else {
        fatal_error(BootError::OutOfRange.code());
    };
    let Some(spi_flash) = cortex_m::singleton!(: Apollo2SpiFlash = Apollo2SpiFlash) else {
        fatal_error(BootError::ExternalFlashFailed.code());
    };

    let mut dispatcher =
        BootDispatcher::new(&FLASH, gpio, APOLLO2_STRAPS, session).with_external(spi_flash);
    dispatcher.boot(&mut CortexMLauncher, &mut HostIdle)
}
