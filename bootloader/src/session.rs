/*++

Licensed under the Apache-2.0 license.

File Name:

    session.rs

Abstract:

    Per-boot context: the single flash page staging buffer, the host
    receive counters and the trace of dispatcher states.

--*/

use crate::boot_status::BootState;
use amboot_config::BootMemoryMap;
use amboot_error::BootError;
use arrayvec::ArrayVec;
use bootutil::Crc32Digest;

/// Enough for the longest dispatcher path.
pub const MAX_TRACE: usize = 8;

pub struct BootSession<'a> {
    map: &'a BootMemoryMap,
    buffer: &'a mut [u8],
    bytes_received: u32,
    received_crc: Crc32Digest,
    trace: ArrayVec<BootState, MAX_TRACE>,
}

impl<'a> BootSession<'a> {
    /// Creates a session around a staging buffer of at least one flash page.
    pub fn new(map: &'a BootMemoryMap, buffer: &'a mut [u8]) -> Result<Self, BootError> {
        if buffer.len() < map.flash_page_size as usize {
            return Err(BootError::OutOfRange);
        }
        Ok(BootSession {
            map,
            buffer,
            bytes_received: 0,
            received_crc: Crc32Digest::new(),
            trace: ArrayVec::new(),
        })
    }

    pub fn map(&self) -> &'a BootMemoryMap {
        self.map
    }

    /// The staging buffer, exactly one flash page long.
    pub fn page_buffer(&mut self) -> &mut [u8] {
        let page_size = self.map.flash_page_size as usize;
        &mut self.buffer[..page_size]
    }

    pub(crate) fn enter(&mut self, state: BootState) {
        bootutil::println!(
            "[amboot] State {}: {}",
            u16::from(state),
            state.name()
        );
        // The dispatcher visits each state at most once.
        let _ = self.trace.try_push(state);
    }

    /// States entered so far, in order.
    pub fn trace(&self) -> &[BootState] {
        &self.trace
    }

    pub fn current_state(&self) -> Option<BootState> {
        self.trace.last().copied()
    }

    pub(crate) fn note_received(&mut self, data: &[u8]) {
        self.received_crc.update(data);
        self.bytes_received = self.bytes_received.wrapping_add(data.len() as u32);
    }

    /// Bytes accepted by the staging writer since the last reset.
    pub fn bytes_received(&self) -> u32 {
        self.bytes_received
    }

    /// CRC-32 of everything the staging writer accepted so far.
    pub fn received_crc(&self) -> u32 {
        self.received_crc.clone().finalize()
    }

    /// Starts a new transfer.
    pub fn reset_received(&mut self) {
        self.bytes_received = 0;
        self.received_crc = Crc32Digest::new();
    }
}
