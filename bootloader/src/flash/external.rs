// Licensed under the Apache-2.0 license

use crate::flash::hil::ExternalFlash;
use amboot_error::BootError;

/// An external flash with its bus powered on. The bus is powered off again
/// when the guard is dropped, on success and error paths alike.
pub struct PoweredExternalFlash<'a> {
    device: &'a mut dyn ExternalFlash,
}

impl<'a> PoweredExternalFlash<'a> {
    pub fn power_on(device: &'a mut dyn ExternalFlash) -> Result<Self, BootError> {
        if device.power_on().is_err() {
            bootutil::println!("[amboot] External flash did not power on");
            device.power_off();
            return Err(BootError::ExternalFlashFailed);
        }
        Ok(PoweredExternalFlash { device })
    }

    pub fn read(&mut self, buffer: &mut [u8], address: u32) -> Result<(), BootError> {
        self.device
            .read(buffer, address)
            .map_err(|_| BootError::ExternalFlashFailed)
    }

    pub fn erase_sector(&mut self, address: u32) -> Result<(), BootError> {
        self.device
            .erase_sector(address)
            .map_err(|_| BootError::ExternalFlashFailed)
    }

    pub fn sector_size(&self) -> u32 {
        self.device.sector_size()
    }
}

impl Drop for PoweredExternalFlash<'_> {
    fn drop(&mut self) {
        self.device.power_off();
    }
}
