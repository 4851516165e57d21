// Licensed under the Apache-2.0 license

// Internal flash driver on top of the boot ROM flash helpers.

use crate::hal;
use amboot_config::{BootMemoryMap, FLASH_WORD_SIZE};
use amboot_hil::{FlashDrvError, FlashStorage};

/// Words programmed per helper call; the source must be word aligned.
const PROGRAM_CHUNK_WORDS: usize = 64;

pub struct Apollo2Flash {
    map: &'static BootMemoryMap,
}

impl Apollo2Flash {
    pub const fn new(map: &'static BootMemoryMap) -> Self {
        Apollo2Flash { map }
    }

    fn check_range(&self, address: u32, len: usize) -> Result<(), FlashDrvError> {
        let len = u32::try_from(len).map_err(|_| FlashDrvError::SIZE)?;
        match address.checked_add(len) {
            Some(end) if address >= self.map.flash_offset && end <= self.map.flash_end() => Ok(()),
            _ => Err(FlashDrvError::SIZE),
        }
    }
}

impl FlashStorage for Apollo2Flash {
    fn read(&self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError> {
        self.check_range(address, buffer.len())?;
        for (i, byte) in buffer.iter_mut().enumerate() {
            // Safety: internal flash is memory mapped and the range was checked.
            *byte = unsafe { core::ptr::read_volatile((address as usize + i) as *const u8) };
        }
        Ok(())
    }

    fn write(&self, buffer: &[u8], address: u32) -> Result<(), FlashDrvError> {
        if buffer.len() % FLASH_WORD_SIZE as usize != 0 || address % FLASH_WORD_SIZE != 0 {
            return Err(FlashDrvError::INVAL);
        }
        self.check_range(address, buffer.len())?;

        let mut words = [0u32; PROGRAM_CHUNK_WORDS];
        let mut dst = address;
        for chunk in buffer.chunks(PROGRAM_CHUNK_WORDS * 4) {
            let count = chunk.len() / 4;
            for (word, bytes) in words.iter_mut().zip(chunk.chunks_exact(4)) {
                *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            // Safety: `words` holds `count` initialized words and the
            // destination range lies in internal flash.
            let status = unsafe {
                hal::am_hal_flash_program_main(
                    hal::AM_HAL_FLASH_PROGRAM_KEY,
                    words.as_ptr(),
                    dst as *mut u32,
                    count as u32,
                )
            };
            if status != 0 {
                return Err(FlashDrvError::FAIL);
            }
            dst += chunk.len() as u32;
        }
        Ok(())
    }

    fn erase(&self, address: u32, length: u32) -> Result<(), FlashDrvError> {
        if !self.map.is_page_aligned(address) || !self.map.is_page_aligned(length) {
            return Err(FlashDrvError::INVAL);
        }
        self.check_range(address, length as usize)?;
        let mut page = address;
        while page < address + length {
            // Safety: the helper only touches the addressed page.
            let status = unsafe {
                hal::am_hal_flash_page_erase(
                    hal::AM_HAL_FLASH_PROGRAM_KEY,
                    self.map.addr_to_instance(page),
                    self.map.addr_to_page(page),
                )
            };
            if status != 0 {
                return Err(FlashDrvError::FAIL);
            }
            page += self.map.flash_page_size;
        }
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.map.flash_end()
    }

    fn page_size(&self) -> u32 {
        self.map.flash_page_size
    }
}
