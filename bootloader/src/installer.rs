/*++

Licensed under the Apache-2.0 license.

File Name:

    installer.rs

Abstract:

    Copies a staged image to its link address one flash page at a time and
    checks the result.

--*/

use crate::flash::external::PoweredExternalFlash;
use crate::flash::hil::{ExternalFlash, FlashStorage};
use crate::session::BootSession;
use amboot_config::{BootMemoryMap, FLASH_WORD_SIZE};
use amboot_error::BootError;
use bootutil::{with_exclusive_flash_access, Crc32Digest, HexWord};
use flash_image::ImageDescriptor;

/// Destination checks shared by both sources: page-aligned link address,
/// whole flash words, inside flash and clear of the flag page.
fn check_destination(
    map: &BootMemoryMap,
    descriptor: &ImageDescriptor,
) -> Result<(), BootError> {
    if !map.is_page_aligned(descriptor.link_address)
        || descriptor.num_bytes % FLASH_WORD_SIZE != 0
    {
        return Err(BootError::UnalignedLength);
    }
    let end = descriptor.link_end().ok_or(BootError::OutOfRange)?;
    if descriptor.link_address < map.flash_offset || end > map.flash_end() {
        return Err(BootError::OutOfRange);
    }
    if let Some(flag_page) = map.flag_page_address() {
        if flag_page < end && descriptor.link_address < flag_page + map.flash_page_size {
            return Err(BootError::OutOfRange);
        }
    }
    Ok(())
}

/// Erases the destination page and programs `data` at its start.
fn program_page(
    flash: &dyn FlashStorage,
    page_size: u32,
    address: u32,
    data: &[u8],
) -> Result<(), BootError> {
    with_exclusive_flash_access(|| {
        flash.erase(address, page_size)?;
        flash.write(data, address)
    })?;
    Ok(())
}

fn check_installed_crc(
    flash: &dyn FlashStorage,
    session: &mut BootSession,
    descriptor: &ImageDescriptor,
) -> Result<(), BootError> {
    let mut digest = Crc32Digest::new();
    let mut offset = 0;
    while offset < descriptor.num_bytes {
        let buf = session.page_buffer();
        let chunk = (buf.len() as u32).min(descriptor.num_bytes - offset);
        let buf = &mut buf[..chunk as usize];
        flash.read(buf, descriptor.link_address + offset)?;
        digest.update(buf);
        offset += chunk;
    }
    let crc = digest.finalize();
    if crc != descriptor.crc32 {
        bootutil::println!(
            "[amboot] Installed image CRC {} does not match {}",
            HexWord(crc),
            HexWord(descriptor.crc32)
        );
        return Err(BootError::CrcMismatch);
    }
    Ok(())
}

/// Installs an image staged in internal flash.
///
/// The staged copy must not overlap its destination. On failure the
/// destination may be partially written; the caller leaves the flag page
/// untouched so the install is attempted again on the next boot.
pub fn install_from_internal(
    flash: &dyn FlashStorage,
    session: &mut BootSession,
    descriptor: &ImageDescriptor,
) -> Result<(), BootError> {
    let map = session.map();
    check_destination(map, descriptor)?;
    let source_end = descriptor
        .storage_address
        .checked_add(descriptor.num_bytes)
        .ok_or(BootError::OutOfRange)?;
    if source_end > map.flash_end()
        || (descriptor.storage_address < descriptor.link_address + descriptor.num_bytes
            && descriptor.link_address < source_end)
    {
        return Err(BootError::OutOfRange);
    }

    bootutil::println!(
        "[amboot] Installing {} bytes from internal {} to {}",
        descriptor.num_bytes,
        HexWord(descriptor.storage_address),
        HexWord(descriptor.link_address)
    );
    let page_size = map.flash_page_size;
    let mut offset = 0;
    while offset < descriptor.num_bytes {
        let chunk = page_size.min(descriptor.num_bytes - offset);
        let buf = &mut session.page_buffer()[..chunk as usize];
        flash.read(buf, descriptor.storage_address + offset)?;
        program_page(flash, page_size, descriptor.link_address + offset, buf)?;
        offset += chunk;
    }

    if !descriptor.encrypted {
        check_installed_crc(flash, session, descriptor)?;
    }
    Ok(())
}

/// Installs an image staged in external flash.
///
/// The external copy is checked against the descriptor CRC before any
/// internal page is erased, then copied, then the destination is checked
/// again. The external bus is powered only for the duration of each pass.
pub fn install_from_external(
    flash: &dyn FlashStorage,
    external: &mut dyn ExternalFlash,
    session: &mut BootSession,
    descriptor: &ImageDescriptor,
) -> Result<(), BootError> {
    let map = session.map();
    check_destination(map, descriptor)?;
    descriptor
        .storage_address
        .checked_add(descriptor.num_bytes)
        .ok_or(BootError::OutOfRange)?;
    let page_size = map.flash_page_size;

    if !descriptor.encrypted {
        let mut source = PoweredExternalFlash::power_on(&mut *external)?;
        let mut digest = Crc32Digest::new();
        let mut offset = 0;
        while offset < descriptor.num_bytes {
            let chunk = page_size.min(descriptor.num_bytes - offset);
            let buf = &mut session.page_buffer()[..chunk as usize];
            source.read(buf, descriptor.storage_address + offset)?;
            digest.update(buf);
            offset += chunk;
        }
        drop(source);
        if digest.finalize() != descriptor.crc32 {
            bootutil::println!("[amboot] External image CRC mismatch");
            return Err(BootError::CrcMismatch);
        }
    }

    bootutil::println!(
        "[amboot] Installing {} bytes from external {} to {}",
        descriptor.num_bytes,
        HexWord(descriptor.storage_address),
        HexWord(descriptor.link_address)
    );
    {
        let mut source = PoweredExternalFlash::power_on(&mut *external)?;
        let mut offset = 0;
        while offset < descriptor.num_bytes {
            let chunk = page_size.min(descriptor.num_bytes - offset);
            let buf = &mut session.page_buffer()[..chunk as usize];
            source.read(buf, descriptor.storage_address + offset)?;
            program_page(flash, page_size, descriptor.link_address + offset, buf)?;
            offset += chunk;
        }
    }

    if !descriptor.encrypted {
        check_installed_crc(flash, session, descriptor)?;
    }
    Ok(())
}
