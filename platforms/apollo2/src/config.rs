// Licensed under the Apache-2.0 license

use amboot_config::{BootMemoryMap, BootStraps, FlagPageLocation, ERASED_WORD};

pub const APOLLO2_MEMORY_MAP: BootMemoryMap = BootMemoryMap {
    flash_offset: 0x0000_0000,
    flash_size: 1024 * 1024,
    flash_page_size: 8 * 1024,
    flash_instance_size: 512 * 1024,
    sram_offset: 0x1000_0000,
    sram_size: 256 * 1024,
    stack_window_start: 0x1000_0000,
    stack_window_end: 0x1fff_ffff,
    flag_page: FlagPageLocation::Fixed(0x0000_6000),
};

pub const APOLLO2_STRAPS: BootStraps = BootStraps {
    default_link_address: 0x0000_c000,
    default_override_gpio: ERASED_WORD,
    default_override_polarity: ERASED_WORD,
};

/// Size of the session staging buffer: one flash page.
pub const PAGE_BUFFER_SIZE: usize = 8 * 1024;

#[no_mangle]
#[used]
pub static BOOT_MEMORY_MAP: BootMemoryMap = APOLLO2_MEMORY_MAP;

#[no_mangle]
#[used]
pub static BOOT_STRAPS: BootStraps = APOLLO2_STRAPS;
