/*++

Licensed under the Apache-2.0 license.

File Name:

    flag_page.rs

Abstract:

    File contains the persistent store for the image descriptor.

--*/

use crate::flash::flash_partition::FlashPartition;
use crate::flash::hil::FlashStorage;
use amboot_error::BootError;
use bootutil::with_exclusive_flash_access;
use flash_image::{FlagPageRecord, ImageDescriptor, FLAG_PAGE_RECORD_SIZE};
use zerocopy::{FromZeros, IntoBytes};

/// One flash page holding a [`FlagPageRecord`] at its start. The rest of
/// the page stays erased.
pub struct FlagPageStore<'a> {
    partition: FlashPartition<'a>,
}

impl<'a> FlagPageStore<'a> {
    pub fn new(flash: &'a dyn FlashStorage, address: u32) -> Result<Self, BootError> {
        let partition = FlashPartition::new(flash, "flag page", address, flash.page_size())?;
        Ok(FlagPageStore { partition })
    }

    pub fn address(&self) -> u32 {
        self.partition.base_address()
    }

    /// Reads the descriptor. An erased page yields a descriptor with no
    /// pending update.
    pub fn load(&self) -> Result<ImageDescriptor, BootError> {
        let mut record = FlagPageRecord::new_zeroed();
        with_exclusive_flash_access(|| self.partition.read(0, record.as_mut_bytes()))?;
        Ok(ImageDescriptor::from(&record))
    }

    /// Replaces the stored descriptor: erase, program, then read back.
    pub fn store(&self, descriptor: &ImageDescriptor) -> Result<(), BootError> {
        let bytes = descriptor.encode();
        with_exclusive_flash_access(|| {
            self.partition.erase(0, self.partition.len())?;
            self.partition.write(0, &bytes)
        })?;

        let mut readback = [0u8; FLAG_PAGE_RECORD_SIZE];
        with_exclusive_flash_access(|| self.partition.read(0, &mut readback))?;
        if readback != bytes {
            bootutil::println!("[amboot] Flag page read-back mismatch");
            return Err(BootError::VerifyFailed);
        }
        Ok(())
    }
}
