/*++

Licensed under the Apache-2.0 license.

File Name:

    staging.rs

Abstract:

    Receive side of an update: writes image chunks delivered by the host
    transport into flash and announces the staged image in the flag page.

--*/

use crate::flag_page::FlagPageStore;
use crate::flash::external::PoweredExternalFlash;
use crate::flash::hil::{ExternalFlash, FlashStorage};
use crate::session::BootSession;
use amboot_config::{BootMemoryMap, ERASED_WORD, FLASH_WORD_SIZE};
use amboot_error::BootError;
use bootutil::{with_exclusive_flash_access, HexWord};
use flash_image::ImageDescriptor;

pub struct StagingWriter<'a> {
    flash: &'a dyn FlashStorage,
    map: &'a BootMemoryMap,
}

impl<'a> StagingWriter<'a> {
    pub fn new(flash: &'a dyn FlashStorage, map: &'a BootMemoryMap) -> Self {
        StagingWriter { flash, map }
    }

    fn check_range(&self, address: u32, len: u32) -> Result<(), BootError> {
        match address.checked_add(len) {
            Some(end) if address >= self.map.flash_offset && end <= self.map.flash_end() => Ok(()),
            _ => Err(BootError::OutOfRange),
        }
    }

    fn erase_page(&self, address: u32) -> Result<(), BootError> {
        with_exclusive_flash_access(|| self.flash.erase(address, self.map.flash_page_size))?;
        Ok(())
    }

    /// Erases every page touched by `len` bytes from the page-aligned
    /// `address`.
    pub fn erase_region(&self, address: u32, len: u32) -> Result<(), BootError> {
        self.check_range(address, len)?;
        if !self.map.is_page_aligned(address) {
            return Err(BootError::UnalignedLength);
        }
        let page_size = self.map.flash_page_size;
        let pages = len.div_ceil(page_size);
        // Rounding up to whole pages must stay inside flash.
        self.check_range(address, pages * page_size)?;
        for page in 0..pages {
            self.erase_page(address + page * page_size)?;
        }
        Ok(())
    }

    /// Programs one chunk of at most a flash page.
    ///
    /// A chunk starting on a page boundary erases that page first. A chunk
    /// starting inside a page must land on erased flash; if it spills into
    /// the next page, that page is erased first, which is not allowed
    /// across the end of a flash instance. The programmed bytes are read
    /// back and compared.
    pub fn write_chunk(
        &self,
        session: &mut BootSession,
        address: u32,
        data: &[u8],
    ) -> Result<(), BootError> {
        if data.is_empty() {
            return Ok(());
        }
        let len = u32::try_from(data.len()).map_err(|_| BootError::OutOfRange)?;
        let page_size = self.map.flash_page_size;
        if len % FLASH_WORD_SIZE != 0 || address % FLASH_WORD_SIZE != 0 || len > page_size {
            return Err(BootError::UnalignedLength);
        }
        self.check_range(address, len)?;

        if self.map.is_page_aligned(address) {
            self.erase_page(address)?;
        } else {
            let room = page_size - (address % page_size);
            let check_len = if len > room {
                if self.map.addr_to_page(address) == self.map.pages_per_instance() - 1 {
                    bootutil::println!(
                        "[amboot] Chunk at {} crosses a flash instance",
                        HexWord(address)
                    );
                    return Err(BootError::OutOfRange);
                }
                self.erase_page(self.map.page_base(address) + page_size)?;
                room
            } else {
                len
            };

            let buf = &mut session.page_buffer()[..check_len as usize];
            self.flash.read(buf, address)?;
            if buf.chunks_exact(4).any(|word| word != ERASED_WORD.to_le_bytes()) {
                return Err(BootError::NotErased);
            }
        }

        with_exclusive_flash_access(|| self.flash.write(data, address))?;

        let readback = &mut session.page_buffer()[..data.len()];
        self.flash.read(readback, address)?;
        if readback != data {
            bootutil::println!("[amboot] Read-back mismatch at {}", HexWord(address));
            return Err(BootError::VerifyFailed);
        }

        session.note_received(data);
        Ok(())
    }

    /// Erases the external sectors covering `len` bytes from `address`.
    pub fn erase_external(
        &self,
        external: &mut dyn ExternalFlash,
        address: u32,
        len: u32,
    ) -> Result<(), BootError> {
        let mut device = PoweredExternalFlash::power_on(external)?;
        let sector_size = device.sector_size();
        for sector in 0..len.div_ceil(sector_size) {
            let sector_address = sector
                .checked_mul(sector_size)
                .and_then(|offset| address.checked_add(offset))
                .ok_or(BootError::OutOfRange)?;
            device.erase_sector(sector_address)?;
        }
        Ok(())
    }

    /// Announces a fully staged image so that the next boot installs it.
    pub fn commit(
        &self,
        session: &BootSession,
        descriptor: &ImageDescriptor,
    ) -> Result<(), BootError> {
        let address = self.map.flag_page_address().ok_or(BootError::OutOfRange)?;
        bootutil::println!(
            "[amboot] Committing image of {} bytes ({} received)",
            descriptor.num_bytes,
            session.bytes_received()
        );
        FlagPageStore::new(self.flash, address)?.store(descriptor)
    }
}
