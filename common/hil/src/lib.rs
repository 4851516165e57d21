// Licensed under the Apache-2.0 license

//! Generic interfaces for the hardware the bootloader consumes: internal
//! flash, an external serial flash, the GPIO used for the override pin, and
//! the platform hooks that leave the bootloader.

#![no_std]

use core::result::Result;

/// Simple interface for reading, programming and erasing internal flash.
/// It is expected that the platform's flash driver implements this trait.
///
/// Addresses are absolute internal flash addresses.
pub trait FlashStorage {
    /// Read from flash, filling the provided buffer with data.
    fn read(&self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError>;

    /// Program the full contents of the buffer starting at `address`. The
    /// buffer length must be a multiple of the flash word size and the target
    /// range must have been erased.
    fn write(&self, buffer: &[u8], address: u32) -> Result<(), FlashDrvError>;

    /// Erase `length` bytes starting at `address`. Both must be page aligned.
    fn erase(&self, address: u32, length: u32) -> Result<(), FlashDrvError>;

    /// Returns the size of the flash in bytes.
    fn capacity(&self) -> u32;

    /// Returns the erase granule in bytes.
    fn page_size(&self) -> u32;
}

/// An external serial NOR flash behind a bus that is only powered while
/// in use.
pub trait ExternalFlash {
    /// Power the bus and pins, and initialize the device.
    fn power_on(&mut self) -> Result<(), FlashDrvError>;

    fn power_off(&mut self);

    fn read(&mut self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError>;

    /// Erase the sector containing `address`.
    fn erase_sector(&mut self, address: u32) -> Result<(), FlashDrvError>;

    fn sector_size(&self) -> u32;
}

pub trait GpioInput {
    fn configure_input(&mut self, pin: u32);

    /// Returns `true` when the pin reads high.
    fn read(&mut self, pin: u32) -> bool;
}

/// Transfers control to an application image. Never returns.
pub trait ImageLauncher {
    /// Relocate the vector table to `vector_table`, load the main stack
    /// pointer and branch to `reset_vector`.
    fn launch(&mut self, vector_table: u32, stack_pointer: u32, reset_vector: u32) -> !;
}

/// Idle hook used when there is nothing bootable: the platform raises
/// clocks, enables the host interface interrupts and waits for a new image.
pub trait HostTransport {
    fn wait_for_host(&mut self) -> !;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum FlashDrvError {
    // Reserved value, for when "no error" / "success" should be
    // encoded in the same numeric representation as FlashDrvError
    //
    // Ok(()) = 0,
    /// Generic failure condition
    FAIL = 1,
    /// The component is powered down
    OFF = 4,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
    /// Device is not available
    NODEVICE = 11,
}

impl From<FlashDrvError> for amboot_error::BootError {
    fn from(_: FlashDrvError) -> Self {
        amboot_error::BootError::FlashOperationFailed
    }
}
