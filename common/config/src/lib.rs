// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "arm", no_std)]

/// Flash words are programmed 32 bits at a time.
pub const FLASH_WORD_SIZE: u32 = 4;

/// Value of an erased flash word, also used as the "unset" sentinel in
/// flag page fields.
pub const ERASED_WORD: u32 = 0xffff_ffff;

/// Where the flag page lives in internal flash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagPageLocation {
    /// A fixed, page-aligned flash address.
    Fixed(u32),
    /// The last page of internal flash.
    LastPage,
    /// No flag page; the bootloader boots the compiled-in default image.
    Disabled,
}

/// Configures the memory map for the bootloader.
/// These are the defaults that can be overridden and provided to the platform builds.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootMemoryMap {
    pub flash_offset: u32,
    pub flash_size: u32,
    pub flash_page_size: u32,
    pub flash_instance_size: u32,
    pub sram_offset: u32,
    pub sram_size: u32,
    /// Inclusive bounds a stack pointer must fall in to be plausible.
    pub stack_window_start: u32,
    pub stack_window_end: u32,
    pub flag_page: FlagPageLocation,
}

impl Default for BootMemoryMap {
    fn default() -> Self {
        BootMemoryMap {
            flash_offset: 0x0000_0000,
            flash_size: 1024 * 1024,
            flash_page_size: 8 * 1024,
            flash_instance_size: 512 * 1024,
            sram_offset: 0x1000_0000,
            sram_size: 256 * 1024,
            stack_window_start: 0x1000_0000,
            stack_window_end: 0x1fff_ffff,
            flag_page: FlagPageLocation::Fixed(0x0000_6000),
        }
    }
}

impl BootMemoryMap {
    /// First address past the end of internal flash.
    pub const fn flash_end(&self) -> u32 {
        self.flash_offset + self.flash_size
    }

    /// Resolves the configured flag page location to an address, or `None`
    /// when the flag page is disabled.
    pub const fn flag_page_address(&self) -> Option<u32> {
        match self.flag_page {
            FlagPageLocation::Fixed(addr) => Some(addr),
            FlagPageLocation::LastPage => Some(self.flash_end() - self.flash_page_size),
            FlagPageLocation::Disabled => None,
        }
    }

    pub const fn page_base(&self, addr: u32) -> u32 {
        addr - (addr % self.flash_page_size)
    }

    pub const fn is_page_aligned(&self, addr: u32) -> bool {
        addr % self.flash_page_size == 0
    }

    /// Flash instance (bank) that holds `addr`.
    pub const fn addr_to_instance(&self, addr: u32) -> u32 {
        (addr - self.flash_offset) / self.flash_instance_size
    }

    /// Page number of `addr` within its flash instance.
    pub const fn addr_to_page(&self, addr: u32) -> u32 {
        ((addr - self.flash_offset) % self.flash_instance_size) / self.flash_page_size
    }

    pub const fn pages_per_instance(&self) -> u32 {
        self.flash_instance_size / self.flash_page_size
    }

    pub const fn stack_pointer_in_window(&self, sp: u32) -> bool {
        sp >= self.stack_window_start && sp <= self.stack_window_end
    }

    #[cfg(not(target_arch = "arm"))]
    pub fn hash_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        map.insert(
            "FLASH_OFFSET".to_string(),
            format!("0x{:x}", self.flash_offset),
        );
        map.insert("FLASH_SIZE".to_string(), format!("0x{:x}", self.flash_size));
        map.insert(
            "FLASH_PAGE_SIZE".to_string(),
            format!("0x{:x}", self.flash_page_size),
        );
        map.insert(
            "FLASH_INSTANCE_SIZE".to_string(),
            format!("0x{:x}", self.flash_instance_size),
        );
        map.insert("SRAM_OFFSET".to_string(), format!("0x{:x}", self.sram_offset));
        map.insert("SRAM_SIZE".to_string(), format!("0x{:x}", self.sram_size));
        map.insert(
            "STACK_WINDOW_START".to_string(),
            format!("0x{:x}", self.stack_window_start),
        );
        map.insert(
            "STACK_WINDOW_END".to_string(),
            format!("0x{:x}", self.stack_window_end),
        );
        if let Some(addr) = self.flag_page_address() {
            map.insert("FLAG_PAGE".to_string(), format!("0x{:x}", addr));
        }
        map
    }
}

/// Build-time straps: defaults used when no flag page is in use.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootStraps {
    pub default_link_address: u32,
    pub default_override_gpio: u32,
    pub default_override_polarity: u32,
}

impl Default for BootStraps {
    fn default() -> Self {
        BootStraps {
            default_link_address: 0x0000_c000,
            default_override_gpio: ERASED_WORD,
            default_override_polarity: ERASED_WORD,
        }
    }
}
