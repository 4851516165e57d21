// Licensed under the Apache-2.0 license

//! Error codes shared by the bootloader, its platform bindings and the
//! fatal error hook.
//!
//! Every variant has a stable numeric code so that a platform fatal error
//! handler (or a debugger watching the checkpoint register) can report it
//! without any formatting support.

#![cfg_attr(target_arch = "arm", no_std)]

use thiserror::Error;

#[repr(u32)]
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BootError {
    /// The image (link address plus length) does not fit in internal flash.
    #[error("image does not fit in internal flash")]
    OutOfRange = 0xb000_0001,
    #[error("stack pointer outside of SRAM")]
    BadStackPointer = 0xb000_0002,
    #[error("reset vector outside of image")]
    BadResetVector = 0xb000_0003,
    #[error("image CRC mismatch")]
    CrcMismatch = 0xb000_0004,
    /// The internal flash driver reported a failure for erase, program or read.
    #[error("internal flash operation failed")]
    FlashOperationFailed = 0xb000_0005,
    /// A length was not a multiple of the flash word size, a chunk was
    /// larger than one flash page, or a destination was not page aligned.
    #[error("address or length is not aligned for flash programming")]
    UnalignedLength = 0xb000_0006,
    #[error("destination flash is not erased")]
    NotErased = 0xb000_0007,
    #[error("flash read-back does not match programmed data")]
    VerifyFailed = 0xb000_0008,
    #[error("external flash operation failed")]
    ExternalFlashFailed = 0xb000_0009,
}

impl BootError {
    pub const fn code(self) -> u32 {
        self as u32
    }
}

impl From<BootError> for u32 {
    fn from(err: BootError) -> u32 {
        err.code()
    }
}
