// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::*;
    use amboot_bootloader::BootState;
    use amboot_error::BootError;
    use amboot_testing::{test_image, Exit, TEST_STACK_POINTER};
    use flash_image::{BootOptions, ImageDescriptor, NO_STORAGE_ADDRESS};

    #[test]
    fn test_external_install_powers_bus_off() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x4804, 20);
        board.spi.load(EXTERNAL_ADDRESS, &image);
        board.set_flag_page(&staged(
            &image,
            crc,
            BootOptions::NewImageExternalFlash,
            EXTERNAL_ADDRESS,
        ));

        assert_eq!(
            board.boot(),
            launched_at(LINK_ADDRESS, TEST_STACK_POINTER, LINK_ADDRESS + 0x0c1)
        );
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
        let consumed = board.flag_page();
        assert_eq!(consumed.options, BootOptions::NoNewImage);
        assert_eq!(consumed.storage_address, NO_STORAGE_ADDRESS);

        // Header check, CRC pass and copy pass each power the bus once.
        assert!(!board.spi.is_powered());
        assert_eq!(board.spi.power_on_count(), 3);
        assert_eq!(board.spi.power_off_count(), 3);
    }

    #[test]
    fn test_bad_external_crc_never_erases_resident() {
        let mut board = Board::new();
        let (old, old_crc) = test_image(LINK_ADDRESS, 0x2000, 21);
        board.flash.load(LINK_ADDRESS, &old);
        let (new, _) = test_image(LINK_ADDRESS, 0x2000, 22);
        board.spi.load(EXTERNAL_ADDRESS, &new);
        // Same size, but the CRC still describes the running image.
        let pending = staged(&new, old_crc, BootOptions::NewImageExternalFlash, EXTERNAL_ADDRESS);
        board.set_flag_page(&pending);
        let erases = board.flash.erase_count();

        let outcome = board.run();
        assert_eq!(outcome.state, BootState::BootExisting);
        assert_eq!(outcome.last_error, Some(BootError::CrcMismatch));
        assert_eq!(board.flash.erase_count(), erases);
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, old.len()), old);
        assert_eq!(board.flag_page(), pending);
        assert!(!board.spi.is_powered());
    }

    #[test]
    fn test_external_read_error_powers_off() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x6000, 23);
        board.spi.load(EXTERNAL_ADDRESS, &image);
        board.spi.fail_read_at(EXTERNAL_ADDRESS + 0x4000);
        let pending = staged(&image, crc, BootOptions::NewImageExternalFlash, EXTERNAL_ADDRESS);
        board.set_flag_page(&pending);

        assert_eq!(board.boot(), Exit::WaitForHost);
        assert!(!board.spi.is_powered());
        assert_eq!(board.spi.power_on_count(), board.spi.power_off_count());
        assert_eq!(board.flag_page(), pending);
    }

    #[test]
    fn test_missing_external_device() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x1000, 24);
        board.flash.load(LINK_ADDRESS, &image);
        board.spi.fail_power_on();
        let pending = staged(&image, crc, BootOptions::NewImageExternalFlash, EXTERNAL_ADDRESS);
        board.set_flag_page(&pending);

        let outcome = board.run();
        assert_eq!(outcome.last_error, Some(BootError::ExternalFlashFailed));
        assert_eq!(outcome.state, BootState::BootExisting);
        assert!(!outcome.installed);
        assert_eq!(board.flag_page(), pending);
    }

    #[test]
    fn test_encrypted_external_image() {
        let mut board = Board::new();
        let (image, _) = test_image(LINK_ADDRESS, 0x3000, 25);
        board.spi.load(EXTERNAL_ADDRESS, &image);
        let pending = ImageDescriptor {
            encrypted: true,
            stack_pointer: TEST_STACK_POINTER,
            reset_vector: LINK_ADDRESS + 0x0c1,
            ..staged(&image, 0x1234_5678, BootOptions::NewImageExternalFlash, EXTERNAL_ADDRESS)
        };
        board.set_flag_page(&pending);

        let outcome = board.run();
        assert!(outcome.installed);
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
        // Vectors come from the flag page and there is no CRC pass.
        assert_eq!(board.spi.power_on_count(), 1);
        assert!(!board.spi.is_powered());
    }
}
