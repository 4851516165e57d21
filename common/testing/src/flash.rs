/*++

Licensed under the Apache-2.0 license.

File Name:

    flash.rs

Abstract:

    File contains internal flash emulation with NOR programming semantics.

--*/

use amboot_hil::{FlashDrvError, FlashStorage};
use std::cell::RefCell;

struct FlashState {
    data: Vec<u8>,
    erase_count: usize,
    write_count: usize,
    fail_write_at: Option<u32>,
    fail_erase_at: Option<u32>,
    flip_bit_at: Option<u32>,
}

/// Internal flash backed by a byte vector.
///
/// Programming can only clear bits, as on real NOR flash: writing over
/// programmed data without an erase ANDs the two together.
pub struct EmulatedFlash {
    page_size: u32,
    state: RefCell<FlashState>,
}

impl EmulatedFlash {
    /// Creates a fully erased flash of `capacity` bytes.
    pub fn new(capacity: u32, page_size: u32) -> Self {
        assert!(capacity % page_size == 0, "capacity must be whole pages");
        Self {
            page_size,
            state: RefCell::new(FlashState {
                data: vec![0xff; capacity as usize],
                erase_count: 0,
                write_count: 0,
                fail_write_at: None,
                fail_erase_at: None,
                flip_bit_at: None,
            }),
        }
    }

    /// Places `bytes` at `address` directly, bypassing erase/program rules.
    pub fn load(&self, address: u32, bytes: &[u8]) {
        let start = address as usize;
        self.state.borrow_mut().data[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn snapshot(&self, address: u32, len: usize) -> Vec<u8> {
        let start = address as usize;
        self.state.borrow().data[start..start + len].to_vec()
    }

    pub fn erase_count(&self) -> usize {
        self.state.borrow().erase_count
    }

    pub fn write_count(&self) -> usize {
        self.state.borrow().write_count
    }

    /// Makes the next program operation covering `address` fail without
    /// writing anything.
    pub fn fail_write_at(&self, address: u32) {
        self.state.borrow_mut().fail_write_at = Some(address);
    }

    pub fn fail_erase_at(&self, address: u32) {
        self.state.borrow_mut().fail_erase_at = Some(address);
    }

    /// Silently corrupts the byte at `address` on the next program operation
    /// covering it, while reporting success.
    pub fn flip_bit_at(&self, address: u32) {
        self.state.borrow_mut().flip_bit_at = Some(address);
    }

    fn check_range(&self, address: u32, len: usize) -> Result<usize, FlashDrvError> {
        let start = address as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.state.borrow().data.len() => Ok(start),
            _ => Err(FlashDrvError::SIZE),
        }
    }
}

fn covers(target: Option<u32>, address: u32, len: usize) -> bool {
    target.is_some_and(|t| t >= address && (t - address) < len as u32)
}

impl FlashStorage for EmulatedFlash {
    fn read(&self, buffer: &mut [u8], address: u32) -> Result<(), FlashDrvError> {
        let start = self.check_range(address, buffer.len())?;
        buffer.copy_from_slice(&self.state.borrow().data[start..start + buffer.len()]);
        Ok(())
    }

    fn write(&self, buffer: &[u8], address: u32) -> Result<(), FlashDrvError> {
        if buffer.len() % 4 != 0 || address % 4 != 0 {
            return Err(FlashDrvError::INVAL);
        }
        let start = self.check_range(address, buffer.len())?;
        let mut state = self.state.borrow_mut();
        if covers(state.fail_write_at, address, buffer.len()) {
            state.fail_write_at = None;
            log::debug!("flash: injected program failure at {:#x}", address);
            return Err(FlashDrvError::FAIL);
        }
        for (dst, src) in state.data[start..start + buffer.len()]
            .iter_mut()
            .zip(buffer)
        {
            *dst &= *src;
        }
        if let Some(target) = state.flip_bit_at {
            if covers(Some(target), address, buffer.len()) {
                state.flip_bit_at = None;
                state.data[target as usize] ^= 0x01;
            }
        }
        state.write_count += 1;
        log::trace!("flash: program {:#x}+{:#x}", address, buffer.len());
        Ok(())
    }

    fn erase(&self, address: u32, length: u32) -> Result<(), FlashDrvError> {
        if address % self.page_size != 0 || length % self.page_size != 0 {
            return Err(FlashDrvError::INVAL);
        }
        let start = self.check_range(address, length as usize)?;
        let mut state = self.state.borrow_mut();
        if covers(state.fail_erase_at, address, length as usize) {
            state.fail_erase_at = None;
            log::debug!("flash: injected erase failure at {:#x}", address);
            return Err(FlashDrvError::FAIL);
        }
        state.data[start..start + length as usize].fill(0xff);
        state.erase_count += 1;
        log::trace!("flash: erase {:#x}+{:#x}", address, length);
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.state.borrow().data.len() as u32
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}
