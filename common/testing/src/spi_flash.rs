/*++

Licensed under the Apache-2.0 license.

File Name:

    spi_flash.rs

Abstract:

    File contains external SPI NOR flash emulation, including bus power state.

--*/

use amboot_hil::{ExternalFlash, FlashDrvError};

pub struct EmulatedSpiFlash {
    data: Vec<u8>,
    sector_size: u32,
    powered: bool,
    power_on_count: usize,
    power_off_count: usize,
    fail_power_on: bool,
    fail_read_at: Option<u32>,
}

impl EmulatedSpiFlash {
    pub fn new(capacity: u32, sector_size: u32) -> Self {
        Self {
            data: vec![0xff; capacity as usize],
            sector_size,
            powered: false,
            power_on_count: 0,
            power_off_count: 0,
            fail_power_on: false,
            fail_read_at: None,
        }
    }

    pub fn load(&mut self, address: u32, bytes: &[u8]) {
        let start = address as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn snapshot(&self, address: u32, len: usize) -> Vec<u8> {
        let start = address as usize;
        self.data[start..start + len].to_vec()
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn power_on_count(&self) -> usize {
        self.power_on_count
    }

    pub fn power_off_count(&self) -> usize {
        self.power_off_count
    }

    pub fn fail_power_on(&mut self) {
        self.fail_power_on = true;
    }

    /// Makes every read covering `address` fail.
    pub fn fail_read_at(&mut self, address: u32) {
        self.fail_read_at = Some(address);
    }
}

impl ExternalFlash for EmulatedSpiFlash {
    fn power_on(&mut self) -> Result<(), FlashDrvError> {
        if self.fail_power_on {
            return Err(FlashDrvError::NODEVICE);
        }
        self.powered = true;
        self.power_on_count += 1;
        Ok(())
    }

    fn power_off(&mut self) {
        self.powered = false;
        self.power_off_count += 1;
    }

    fn read(&mut self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError> {
        if !self.powered {
            return Err(FlashDrvError::OFF);
        }
        if let Some(bad) = self.fail_read_at {
            if bad >= address && ((bad - address) as usize) < buffer.len() {
                return Err(FlashDrvError::FAIL);
            }
        }
        let start = address as usize;
        let end = start
            .checked_add(buffer.len())
            .filter(|end| *end <= self.data.len())
            .ok_or(FlashDrvError::SIZE)?;
        buffer.copy_from_slice(&self.data[start..end]);
        Ok(())
    }

    fn erase_sector(&mut self, address: u32) -> Result<(), FlashDrvError> {
        if !self.powered {
            return Err(FlashDrvError::OFF);
        }
        let base = (address - address % self.sector_size) as usize;
        if base >= self.data.len() {
            return Err(FlashDrvError::SIZE);
        }
        let end = (base + self.sector_size as usize).min(self.data.len());
        self.data[base..end].fill(0xff);
        log::trace!("spi flash: erase sector {:#x}", base);
        Ok(())
    }

    fn sector_size(&self) -> u32 {
        self.sector_size
    }
}
