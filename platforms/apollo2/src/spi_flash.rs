// Licensed under the Apache-2.0 license

use crate::hal;
use amboot_hil::{ExternalFlash, FlashDrvError};

static IOM_CONFIG: hal::AmHalIomConfig = hal::AmHalIomConfig {
    interface_mode: hal::AM_HAL_IOM_SPIMODE,
    clock_frequency: hal::AM_HAL_IOM_8MHZ,
    spha: false,
    spol: false,
    write_threshold: 0,
    read_threshold: 60,
};

static SPI_FLASH: hal::AmDevicesSpiflash = hal::AmDevicesSpiflash {
    iom_module: hal::AM_BSP_FLASH_IOM,
    chip_select: hal::AM_BSP_FLASH_CS,
};

/// The board SPI NOR flash behind IOM1.
pub struct Apollo2SpiFlash;

impl ExternalFlash for Apollo2SpiFlash {
    /// Powers and configures the IOM as an 8 MHz SPI master, then hands it
    /// to the SPI flash driver.
    fn power_on(&mut self) -> Result<(), FlashDrvError> {
        // Safety: vendor BSP calls on the IOM reserved for the SPI flash. Both
        // configuration structs are statics that outlive the driver.
        unsafe {
            hal::am_hal_iom_pwrctrl_enable(hal::AM_BSP_FLASH_IOM);
            hal::am_hal_iom_config(hal::AM_BSP_FLASH_IOM, &IOM_CONFIG);
            hal::am_bsp_iom_spi_pins_enable(hal::AM_BSP_FLASH_IOM);
            hal::am_devices_spiflash_init(&SPI_FLASH);
            hal::am_hal_iom_enable(hal::AM_BSP_FLASH_IOM);
        }
        Ok(())
    }

    fn power_off(&mut self) {
        // Safety: as above.
        unsafe {
            hal::am_bsp_iom_spi_pins_disable(hal::AM_BSP_FLASH_IOM);
            hal::am_hal_iom_disable(hal::AM_BSP_FLASH_IOM);
            hal::am_hal_iom_power_off_save(hal::AM_BSP_FLASH_IOM);
        }
    }

    fn read(&mut self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError> {
        let len = u32::try_from(buffer.len()).map_err(|_| FlashDrvError::SIZE)?;
        // Safety: the driver writes exactly `len` bytes into `buffer`.
        let status = unsafe { hal::am_devices_spiflash_read(buffer.as_mut_ptr(), address, len) };
        if status != 0 {
            return Err(FlashDrvError::FAIL);
        }
        Ok(())
    }

    fn erase_sector(&mut self, address: u32) -> Result<(), FlashDrvError> {
        // Safety: sector erase takes no pointers.
        let status = unsafe { hal::am_devices_spiflash_sector_erase(address) };
        if status != 0 {
            return Err(FlashDrvError::FAIL);
        }
        Ok(())
    }

    fn sector_size(&self) -> u32 {
        hal::AM_DEVICES_SPIFLASH_SECTOR_SIZE
    }
}
