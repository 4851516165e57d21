// Licensed under the Apache-2.0 license

use crate::flash::external::PoweredExternalFlash;
use crate::flash::hil::{ExternalFlash, FlashStorage};
use amboot_config::BootMemoryMap;
use amboot_error::BootError;
use bootutil::{Crc32Digest, HexWord};
use flash_image::{ImageDescriptor, VectorHeader, VECTOR_HEADER_SIZE};

/// Where the bytes described by an [`ImageDescriptor`] are read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    /// Staged in internal flash at `storage_address`.
    Internal,
    /// Staged in external flash at `storage_address`.
    External,
    /// Installed at `link_address`.
    Resident,
}

/// Where to hand control to once an image has been judged safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub vector_table: u32,
    pub stack_pointer: u32,
    pub reset_vector: u32,
}

/// Decides whether an image may be installed or executed.
///
/// Verification is read-only. Every failure is reported as an error and
/// callers treat it as "do not install, do not jump".
pub trait ImageVerifier {
    fn verify(
        &mut self,
        descriptor: &ImageDescriptor,
        kind: StorageKind,
    ) -> Result<EntryPoint, BootError>;

    fn is_image_safe(&mut self, descriptor: &ImageDescriptor, kind: StorageKind) -> bool {
        self.verify(descriptor, kind).is_ok()
    }
}

/// The bootloader's image checks: range, stack pointer, reset vector and
/// CRC-32, streamed through the session staging buffer.
pub struct ImageChecker<'a> {
    map: &'a BootMemoryMap,
    flash: &'a dyn FlashStorage,
    external: Option<&'a mut dyn ExternalFlash>,
    buffer: &'a mut [u8],
}

impl<'a> ImageChecker<'a> {
    pub fn new(map: &'a BootMemoryMap, flash: &'a dyn FlashStorage, buffer: &'a mut [u8]) -> Self {
        ImageChecker {
            map,
            flash,
            external: None,
            buffer,
        }
    }

    /// Allows checking images staged in external flash.
    pub fn with_external(mut self, external: &'a mut dyn ExternalFlash) -> Self {
        self.external = Some(external);
        self
    }

    fn check_range(&self, descriptor: &ImageDescriptor, kind: StorageKind) -> Result<(), BootError> {
        let fits = |start: u32| {
            start >= self.map.flash_offset
                && start
                    .checked_add(descriptor.num_bytes)
                    .is_some_and(|end| end <= self.map.flash_end())
        };
        if !fits(descriptor.link_address) {
            return Err(BootError::OutOfRange);
        }
        if kind == StorageKind::Internal && !fits(descriptor.storage_address) {
            return Err(BootError::OutOfRange);
        }
        Ok(())
    }

    fn read_vector_header(
        &mut self,
        descriptor: &ImageDescriptor,
        kind: StorageKind,
    ) -> Result<(u32, u32), BootError> {
        let mut header = [0u8; VECTOR_HEADER_SIZE];
        match kind {
            StorageKind::Internal => self.flash.read(&mut header, descriptor.storage_address)?,
            StorageKind::Resident => self.flash.read(&mut header, descriptor.link_address)?,
            StorageKind::External => {
                let device = self
                    .external
                    .as_deref_mut()
                    .ok_or(BootError::ExternalFlashFailed)?;
                PoweredExternalFlash::power_on(device)?
                    .read(&mut header, descriptor.storage_address)?;
            }
        }
        Ok(VectorHeader::decode(&header))
    }

    /// CRC-32 of `len` bytes of internal flash starting at `address`.
    fn internal_crc(&mut self, address: u32, len: u32) -> Result<u32, BootError> {
        let mut digest = Crc32Digest::new();
        let chunk_size = self.map.flash_page_size;
        let mut offset = 0;
        while offset < len {
            let chunk = chunk_size.min(len - offset);
            let buf = &mut self.buffer[..chunk as usize];
            self.flash.read(buf, address + offset)?;
            digest.update(buf);
            offset += chunk;
        }
        Ok(digest.finalize())
    }
}

impl ImageVerifier for ImageChecker<'_> {
    fn verify(
        &mut self,
        descriptor: &ImageDescriptor,
        kind: StorageKind,
    ) -> Result<EntryPoint, BootError> {
        self.check_range(descriptor, kind)?;

        let (stack_pointer, reset_vector) = if descriptor.encrypted {
            (descriptor.stack_pointer, descriptor.reset_vector)
        } else {
            self.read_vector_header(descriptor, kind)?
        };

        if !self.map.stack_pointer_in_window(stack_pointer) {
            bootutil::println!("[amboot] Bad stack pointer {}", HexWord(stack_pointer));
            return Err(BootError::BadStackPointer);
        }

        // check_range guarantees link_address + num_bytes does not overflow.
        let link_end = descriptor.link_address + descriptor.num_bytes;
        if reset_vector < descriptor.link_address || reset_vector >= link_end {
            bootutil::println!("[amboot] Bad reset vector {}", HexWord(reset_vector));
            return Err(BootError::BadResetVector);
        }

        if !descriptor.encrypted {
            let source = match kind {
                StorageKind::Internal => Some(descriptor.storage_address),
                StorageKind::Resident => Some(descriptor.link_address),
                // Checked while streaming the copy.
                StorageKind::External => None,
            };
            if let Some(address) = source {
                let crc = self.internal_crc(address, descriptor.num_bytes)?;
                if crc != descriptor.crc32 {
                    bootutil::println!(
                        "[amboot] CRC mismatch: expected {} computed {}",
                        HexWord(descriptor.crc32),
                        HexWord(crc)
                    );
                    return Err(BootError::CrcMismatch);
                }
            }
        }

        Ok(EntryPoint {
            vector_table: descriptor.link_address,
            stack_pointer,
            reset_vector,
        })
    }
}
