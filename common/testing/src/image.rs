// Licensed under the Apache-2.0 license

/// Initial stack pointer written into generated test images.
pub const TEST_STACK_POINTER: u32 = 0x1000_8000;

/// Builds a plausible Cortex-M image of `len` bytes linked at
/// `link_address`, returning the bytes and their CRC-32.
///
/// The first word is [`TEST_STACK_POINTER`], the second a Thumb reset
/// vector just past the vector table; the rest is a pattern derived from
/// `seed` so that different images have different checksums.
pub fn test_image(link_address: u32, len: usize, seed: u8) -> (Vec<u8>, u32) {
    assert!(len >= 8 && len % 4 == 0, "images are whole words");
    let mut image: Vec<u8> = (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect();
    image[0..4].copy_from_slice(&TEST_STACK_POINTER.to_le_bytes());
    let reset_vector = link_address + 0x0c1;
    image[4..8].copy_from_slice(&reset_vector.to_le_bytes());
    let crc = bootutil::crc32(&image);
    (image, crc)
}

fn crc_table_entry(index: u8) -> u32 {
    let mut entry = u32::from(index);
    for _ in 0..8 {
        entry = if entry & 1 != 0 {
            (entry >> 1) ^ 0xedb8_8320
        } else {
            entry >> 1
        };
    }
    entry
}

/// Like [`test_image`], but the last word is chosen so that the CRC-32 of
/// the whole image is `crc32`.
pub fn test_image_with_crc(link_address: u32, len: usize, crc32: u32) -> Vec<u8> {
    assert!(len >= 12, "the CRC word must not overlap the vector table");
    let (mut image, _) = test_image(link_address, len, 0);
    let body = len - 4;

    // Table entries have distinct top bytes, so walking the register back
    // from the target picks one table index per appended byte.
    let mut indices = [0u8; 4];
    let mut reg = !crc32;
    for slot in indices.iter_mut().rev() {
        let index = (0..=u8::MAX)
            .find(|i| crc_table_entry(*i) >> 24 == reg >> 24)
            .expect("CRC-32 table top bytes are distinct");
        *slot = index;
        reg = (reg ^ crc_table_entry(index)) << 8;
    }

    let mut reg = !bootutil::crc32(&image[..body]);
    for (i, index) in indices.iter().enumerate() {
        image[body + i] = (reg as u8) ^ index;
        reg = (reg >> 8) ^ crc_table_entry(*index);
    }
    assert_eq!(bootutil::crc32(&image), crc32);
    image
}
