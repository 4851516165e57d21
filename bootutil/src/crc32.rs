// Licensed under the Apache-2.0 license

//! CRC-32 (IEEE 802.3 / ISO-HDLC), the checksum used for image integrity.

use crc::{Crc, Digest, CRC_32_ISO_HDLC};

static CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// CRC-32 over a contiguous buffer.
pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}

/// Incremental CRC-32 for images that are never resident in memory at once.
/// Feeding the same bytes in any chunking yields the same result as [`crc32`].
#[derive(Clone)]
pub struct Crc32Digest {
    digest: Digest<'static, u32>,
}

impl Crc32Digest {
    pub fn new() -> Self {
        Crc32Digest {
            digest: CRC32.digest(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.digest.update(data);
    }

    pub fn finalize(self) -> u32 {
        self.digest.finalize()
    }
}

impl Default for Crc32Digest {
    fn default() -> Self {
        Self::new()
    }
}
