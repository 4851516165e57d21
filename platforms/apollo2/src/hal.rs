// Licensed under the Apache-2.0 license

//! Bindings to the AmbiqSuite HAL, BSP and SPI flash device driver, linked
//! in from the vendor SDK.

/// Key that unlocks the flash helpers in the boot ROM.
pub const AM_HAL_FLASH_PROGRAM_KEY: u32 = 0x1234_4321;
/// Fastest system clock setting.
pub const AM_HAL_CLKGEN_SYSCLK_MAX: u32 = 0;
/// IOM module wired to the board's SPI flash.
pub const AM_BSP_FLASH_IOM: u32 = 1;
/// IOM chip select wired to the board's SPI flash.
pub const AM_BSP_FLASH_CS: u32 = 3;
/// Erase granule of the board's SPI flash.
pub const AM_DEVICES_SPIFLASH_SECTOR_SIZE: u32 = 64 * 1024;

pub const AM_HAL_IOM_SPIMODE: u32 = 1;
pub const AM_HAL_IOM_8MHZ: u32 = 8_000_000;

#[repr(C)]
pub struct AmHalIomConfig {
    pub interface_mode: u32,
    pub clock_frequency: u32,
    pub spha: bool,
    pub spol: bool,
    pub write_threshold: u8,
    pub read_threshold: u8,
}

#[repr(C)]
pub struct AmDevicesSpiflash {
    pub iom_module: u32,
    pub chip_select: u32,
}

/// Cache controller settings owned by the HAL. Only ever passed by address.
#[repr(C)]
pub struct AmHalCachectrlConfig {
    _private: [u8; 0],
}

extern "C" {
    pub fn am_hal_flash_page_erase(value: u32, flash_inst: u32, page_num: u32) -> i32;
    pub fn am_hal_flash_program_main(
        value: u32,
        src: *const u32,
        dst: *mut u32,
        num_words: u32,
    ) -> i32;

    pub fn am_hal_clkgen_sysclk_select(setting: u32);

    pub static am_hal_cachectrl_defaults: AmHalCachectrlConfig;
    pub fn am_hal_cachectrl_enable(config: *const AmHalCachectrlConfig);
    pub fn am_bsp_low_power_init();

    pub fn am_hal_iom_pwrctrl_enable(module: u32);
    pub fn am_hal_iom_config(module: u32, config: *const AmHalIomConfig);
    pub fn am_hal_iom_power_off_save(module: u32);
    pub fn am_hal_iom_enable(module: u32);
    pub fn am_hal_iom_disable(module: u32);
    pub fn am_bsp_iom_spi_pins_enable(module: u32);
    pub fn am_bsp_iom_spi_pins_disable(module: u32);

    pub fn am_devices_spiflash_init(device: *const AmDevicesSpiflash);
    pub fn am_devices_spiflash_read(rx_buffer: *mut u8, read_address: u32, num_bytes: u32) -> u32;
    pub fn am_devices_spiflash_sector_erase(sector_address: u32) -> u32;
}
