/*++

Licensed under the Apache-2.0 license.

File Name:

    main.rs

Abstract:

    File contains main entry point for the Apollo2 bootloader

--*/

#![cfg_attr(target_arch = "arm", no_std)]
#![cfg_attr(target_arch = "arm", no_main)]

#[cfg_attr(not(target_arch = "arm"), allow(dead_code))]
mod config;

#[cfg(target_arch = "arm")]
mod boot;
#[cfg(target_arch = "arm")]
mod flash;
#[cfg(target_arch = "arm")]
mod gpio;
#[cfg(target_arch = "arm")]
mod hal;
#[cfg(target_arch = "arm")]
mod io;
#[cfg(target_arch = "arm")]
mod launch;
#[cfg(target_arch = "arm")]
mod spi_flash;

#[cfg(target_arch = "arm")]
#[cortex_m_rt::entry]
fn main() -> ! {
    boot::boot_entry()
}

#[panic_handler]
#[inline(never)]
#[cfg(target_arch = "arm")]
fn bootloader_panic(_: &core::panic::PanicInfo) -> ! {
    amboot_bootloader::fatal_error(0);
}

#[cfg(not(target_arch = "arm"))]
fn main() {
    // no-op on the host just to keep the build clean
    println!("nop");
}
