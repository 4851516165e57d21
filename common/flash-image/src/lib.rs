// Licensed under the Apache-2.0 license

//! Flag page record and image descriptor shared by the bootloader and the
//! host tool that stages updates.
//!
//! The record is a fixed sequence of little-endian 32-bit words. Nothing
//! here depends on the struct layout chosen by a compiler: every field is
//! read and written through explicit byte-order wrappers.

#![no_std]

use zerocopy::byteorder::{LittleEndian, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const OPTION_NO_NEW_IMAGE: u32 = 0xffff_ffff;
pub const OPTION_NEW_IMAGE_INTERNAL_FLASH: u32 = 0x0000_0001;
pub const OPTION_NEW_IMAGE_EXTERNAL_FLASH: u32 = 0x0000_0002;

/// Written to `storage_address` once a staged image has been consumed.
pub const NO_STORAGE_ADDRESS: u32 = 0xffff_ffff;
/// Override pin/polarity value meaning "no override pin".
pub const NO_OVERRIDE: u32 = 0xffff_ffff;

pub const FLAG_PAGE_RECORD_SIZE: usize = core::mem::size_of::<FlagPageRecord>();
/// Initial stack pointer and reset vector at the start of every image.
pub const VECTOR_HEADER_SIZE: usize = 8;

/// Where a staged image currently resides.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootOptions {
    NoNewImage,
    NewImageInternalFlash,
    NewImageExternalFlash,
}

impl From<u32> for BootOptions {
    /// Unknown values are treated as "nothing to install".
    fn from(raw: u32) -> Self {
        match raw {
            OPTION_NEW_IMAGE_INTERNAL_FLASH => BootOptions::NewImageInternalFlash,
            OPTION_NEW_IMAGE_EXTERNAL_FLASH => BootOptions::NewImageExternalFlash,
            _ => BootOptions::NoNewImage,
        }
    }
}

impl From<BootOptions> for u32 {
    fn from(options: BootOptions) -> u32 {
        match options {
            BootOptions::NoNewImage => OPTION_NO_NEW_IMAGE,
            BootOptions::NewImageInternalFlash => OPTION_NEW_IMAGE_INTERNAL_FLASH,
            BootOptions::NewImageExternalFlash => OPTION_NEW_IMAGE_EXTERNAL_FLASH,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
    Low,
    High,
}

/// A GPIO that, when it reads `polarity`, forces the resident image to boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverridePin {
    pub gpio: u32,
    pub polarity: Polarity,
}

/// On-flash layout of the flag page.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct FlagPageRecord {
    pub link_address: U32<LittleEndian>,
    pub num_bytes: U32<LittleEndian>,
    pub crc32: U32<LittleEndian>,
    pub override_gpio: U32<LittleEndian>,
    pub override_polarity: U32<LittleEndian>,
    pub stack_pointer: U32<LittleEndian>,
    pub reset_vector: U32<LittleEndian>,
    pub encrypted: U32<LittleEndian>,
    pub options: U32<LittleEndian>,
    pub storage_address: U32<LittleEndian>,
}

const _: () = assert!(FLAG_PAGE_RECORD_SIZE == 40);

/// Describes a firmware image staged for installation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub link_address: u32,
    pub num_bytes: u32,
    pub crc32: u32,
    pub override_gpio: u32,
    pub override_polarity: u32,
    /// Only meaningful when `encrypted` is set.
    pub stack_pointer: u32,
    /// Only meaningful when `encrypted` is set.
    pub reset_vector: u32,
    pub encrypted: bool,
    pub options: BootOptions,
    pub storage_address: u32,
}

impl ImageDescriptor {
    /// A descriptor for an image already resident at `link_address`, with no
    /// pending update.
    pub const fn resident(link_address: u32) -> Self {
        ImageDescriptor {
            link_address,
            num_bytes: 0,
            crc32: 0,
            override_gpio: NO_OVERRIDE,
            override_polarity: NO_OVERRIDE,
            stack_pointer: 0,
            reset_vector: 0,
            encrypted: false,
            options: BootOptions::NoNewImage,
            storage_address: NO_STORAGE_ADDRESS,
        }
    }

    /// Decodes a flag page record. Returns `None` only when `bytes` is too
    /// short to hold one; an erased page decodes to a descriptor with no
    /// pending update.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let (record, _) = FlagPageRecord::read_from_prefix(bytes).ok()?;
        Some(Self::from(&record))
    }

    pub fn encode(&self) -> [u8; FLAG_PAGE_RECORD_SIZE] {
        let mut out = [0u8; FLAG_PAGE_RECORD_SIZE];
        out.copy_from_slice(FlagPageRecord::from(self).as_bytes());
        out
    }

    /// The override pin, unless either field carries the "unset" sentinel.
    pub fn override_pin(&self) -> Option<OverridePin> {
        if self.override_gpio == NO_OVERRIDE || self.override_polarity == NO_OVERRIDE {
            return None;
        }
        let polarity = if self.override_polarity == 0 {
            Polarity::Low
        } else {
            Polarity::High
        };
        Some(OverridePin {
            gpio: self.override_gpio,
            polarity,
        })
    }

    pub fn has_pending_update(&self) -> bool {
        self.options != BootOptions::NoNewImage
    }

    /// The descriptor to write back after the staged image was installed:
    /// identical except that it no longer points at a staged copy.
    pub fn consumed(&self) -> Self {
        ImageDescriptor {
            options: BootOptions::NoNewImage,
            storage_address: NO_STORAGE_ADDRESS,
            ..*self
        }
    }

    /// First address past the end of the image at its link address.
    pub fn link_end(&self) -> Option<u32> {
        self.link_address.checked_add(self.num_bytes)
    }
}

impl From<&FlagPageRecord> for ImageDescriptor {
    fn from(record: &FlagPageRecord) -> Self {
        ImageDescriptor {
            link_address: record.link_address.get(),
            num_bytes: record.num_bytes.get(),
            crc32: record.crc32.get(),
            override_gpio: record.override_gpio.get(),
            override_polarity: record.override_polarity.get(),
            stack_pointer: record.stack_pointer.get(),
            reset_vector: record.reset_vector.get(),
            encrypted: record.encrypted.get() != 0,
            options: BootOptions::from(record.options.get()),
            storage_address: record.storage_address.get(),
        }
    }
}

impl From<&ImageDescriptor> for FlagPageRecord {
    fn from(desc: &ImageDescriptor) -> Self {
        FlagPageRecord {
            link_address: desc.link_address.into(),
            num_bytes: desc.num_bytes.into(),
            crc32: desc.crc32.into(),
            override_gpio: desc.override_gpio.into(),
            override_polarity: desc.override_polarity.into(),
            stack_pointer: desc.stack_pointer.into(),
            reset_vector: desc.reset_vector.into(),
            encrypted: u32::from(desc.encrypted).into(),
            options: u32::from(desc.options).into(),
            storage_address: desc.storage_address.into(),
        }
    }
}

/// The first two words of a Cortex-M image.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct VectorHeader {
    pub stack_pointer: U32<LittleEndian>,
    pub reset_vector: U32<LittleEndian>,
}

impl VectorHeader {
    pub fn decode(bytes: &[u8; VECTOR_HEADER_SIZE]) -> (u32, u32) {
        let header: VectorHeader = zerocopy::transmute!(*bytes);
        (header.stack_pointer.get(), header.reset_vector.get())
    }
}
