// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::*;
    use amboot_bootloader::{BootSession, StagingWriter};
    use amboot_error::BootError;
    use amboot_testing::{test_image, TEST_STACK_POINTER};
    use flash_image::{BootOptions, ImageDescriptor};

    const CHUNK: usize = 0x1000;

    /// Receives `image` in host-sized chunks at `address` and announces it.
    fn stage_internal(board: &Board, image: &[u8], crc: u32) -> Result<u32, BootError> {
        let mut buffer = vec![0u8; PAGE as usize];
        let mut session = BootSession::new(&board.map, &mut buffer)?;
        let writer = StagingWriter::new(&board.flash, &board.map);
        for (i, chunk) in image.chunks(CHUNK).enumerate() {
            writer.write_chunk(&mut session, STORAGE_ADDRESS + (i * CHUNK) as u32, chunk)?;
        }
        assert_eq!(session.bytes_received(), image.len() as u32);
        let received = session.received_crc();
        writer.commit(
            &session,
            &staged(image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS),
        )?;
        Ok(received)
    }

    #[test]
    fn test_staged_image_installs_on_next_boot() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x4804, 30);
        assert_eq!(stage_internal(&board, &image, crc), Ok(crc));
        assert_eq!(board.flash.snapshot(STORAGE_ADDRESS, image.len()), image);

        assert_eq!(
            board.boot(),
            launched_at(LINK_ADDRESS, TEST_STACK_POINTER, LINK_ADDRESS + 0x0c1)
        );
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
        assert_eq!(board.flag_page().options, BootOptions::NoNewImage);
    }

    #[test]
    fn test_restaging_over_old_copy() {
        let board = Board::new();
        let (first, first_crc) = test_image(LINK_ADDRESS, 0x3000, 31);
        let (second, second_crc) = test_image(LINK_ADDRESS, 0x3000, 32);
        stage_internal(&board, &first, first_crc).unwrap();
        // Page-aligned chunks erase their page, so a new image can be
        // received over the previous one.
        stage_internal(&board, &second, second_crc).unwrap();
        assert_eq!(board.flash.snapshot(STORAGE_ADDRESS, second.len()), second);
        assert_eq!(board.flag_page().crc32, second_crc);
    }

    #[test]
    fn test_unaligned_chunk_over_programmed_flash_is_rejected() {
        let board = Board::new();
        board.flash.load(STORAGE_ADDRESS + 0x100, &[0u8; 4]);
        let mut buffer = vec![0u8; PAGE as usize];
        let mut session = BootSession::new(&board.map, &mut buffer).unwrap();
        let writer = StagingWriter::new(&board.flash, &board.map);
        assert_eq!(
            writer.write_chunk(&mut session, STORAGE_ADDRESS + 0x80, &[0x5a; 0x100]),
            Err(BootError::NotErased)
        );
        assert_eq!(session.bytes_received(), 0);
    }

    #[test]
    fn test_external_staging_round_trip() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x2400, 33);
        board.spi.load(EXTERNAL_ADDRESS, &[0u8; 0x100]);
        {
            let writer = StagingWriter::new(&board.flash, &board.map);
            writer
                .erase_external(&mut board.spi, EXTERNAL_ADDRESS, image.len() as u32)
                .unwrap();
        }
        assert!(board
            .spi
            .snapshot(EXTERNAL_ADDRESS, 0x100)
            .iter()
            .all(|b| *b == 0xff));
        assert!(!board.spi.is_powered());

        // The external device is filled by the host transport directly.
        board.spi.load(EXTERNAL_ADDRESS, &image);
        board.set_flag_page(&ImageDescriptor {
            override_gpio: 9,
            override_polarity: 0,
            ..staged(&image, crc, BootOptions::NewImageExternalFlash, EXTERNAL_ADDRESS)
        });
        board.gpio.set_level(9, true);

        let outcome = board.run();
        assert!(outcome.installed);
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
    }

    #[test]
    fn test_commit_needs_a_flag_page() {
        let mut board = Board::new();
        board.map.flag_page = amboot_config::FlagPageLocation::Disabled;
        let buffer = &mut vec![0u8; PAGE as usize];
        let session = BootSession::new(&board.map, buffer).unwrap();
        let writer = StagingWriter::new(&board.flash, &board.map);
        assert_eq!(
            writer.commit(&session, &ImageDescriptor::resident(LINK_ADDRESS)),
            Err(BootError::OutOfRange)
        );
    }
}
