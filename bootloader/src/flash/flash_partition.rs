// Licensed under the Apache-2.0 license

use crate::flash::hil::{FlashDrvError, FlashStorage};

/// Represents a partition within internal flash.
///
/// A `FlashPartition` provides a view into a contiguous, page-aligned region
/// of the underlying flash, allowing for read, write, and erase operations
/// within the specified bounds. All operations are checked to ensure they
/// do not exceed the partition's boundaries.
///
/// # Fields
/// - `driver`: Reference to the flash storage driver.
/// - `name`: Name of the partition (for debugging or identification).
/// - `base_address`: The absolute flash address the partition starts at.
/// - `length`: The size of the partition in bytes.
pub struct FlashPartition<'a> {
    driver: &'a dyn FlashStorage,
    name: &'static str,
    base_address: u32,
    length: u32,
}

impl<'a> FlashPartition<'a> {
    /// Creates a new `FlashPartition` instance.
    ///
    /// # Returns
    ///
    /// Returns `Err(FlashDrvError::SIZE)` if the partition exceeds the flash
    /// capacity and `Err(FlashDrvError::INVAL)` if it is not page aligned.
    pub fn new(
        driver: &'a dyn FlashStorage,
        name: &'static str,
        base_address: u32,
        length: u32,
    ) -> Result<Self, FlashDrvError> {
        let end = base_address
            .checked_add(length)
            .ok_or(FlashDrvError::SIZE)?;
        if end > driver.capacity() {
            return Err(FlashDrvError::SIZE);
        }
        let page_size = driver.page_size();
        if base_address % page_size != 0 || length % page_size != 0 {
            return Err(FlashDrvError::INVAL);
        }
        Ok(FlashPartition {
            driver,
            name,
            base_address,
            length,
        })
    }

    fn check_range(&self, partition_offset: u32, len: usize) -> Result<u32, FlashDrvError> {
        let len = u32::try_from(len).map_err(|_| FlashDrvError::SIZE)?;
        match partition_offset.checked_add(len) {
            Some(end) if end <= self.length => Ok(self.base_address + partition_offset),
            _ => Err(FlashDrvError::SIZE),
        }
    }

    /// Reads data from the partition into the provided buffer, starting at
    /// the specified offset within the partition.
    ///
    /// Returns `Err(FlashDrvError::SIZE)` if the requested range exceeds the
    /// partition size, or propagates errors from the underlying driver.
    pub fn read(&self, partition_offset: u32, buf: &mut [u8]) -> Result<(), FlashDrvError> {
        let address = self.check_range(partition_offset, buf.len())?;
        self.driver.read(buf, address)
    }

    /// Programs data into the partition, starting at the specified offset
    /// within the partition.
    pub fn write(&self, partition_offset: u32, buf: &[u8]) -> Result<(), FlashDrvError> {
        let address = self.check_range(partition_offset, buf.len())?;
        self.driver.write(buf, address)
    }

    /// Erases a region of the partition, starting at the specified offset
    /// within the partition.
    pub fn erase(&self, partition_offset: u32, len: u32) -> Result<(), FlashDrvError> {
        let address = self.check_range(partition_offset, len as usize)?;
        self.driver.erase(address, len)
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
