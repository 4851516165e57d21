// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::*;
    use amboot_bootloader::BootState;
    use amboot_error::BootError;
    use amboot_testing::{test_image, test_image_with_crc, Exit, TEST_STACK_POINTER};
    use flash_image::{BootOptions, ImageDescriptor};

    const SCENARIO_LINK: u32 = 0x6000;
    const SCENARIO_STORAGE: u32 = 0x2_0000;
    const SCENARIO_CRC: u32 = 0xdead_beef;

    fn scenario_descriptor() -> ImageDescriptor {
        ImageDescriptor {
            num_bytes: 4096,
            crc32: SCENARIO_CRC,
            encrypted: false,
            options: BootOptions::NewImageInternalFlash,
            storage_address: SCENARIO_STORAGE,
            ..ImageDescriptor::resident(SCENARIO_LINK)
        }
    }

    #[test]
    fn test_staged_image_with_wrong_crc_is_not_installed() {
        let mut board = Board::new();
        let (image, crc) = test_image(SCENARIO_LINK, 4096, 40);
        assert_ne!(crc, SCENARIO_CRC);
        board.flash.load(SCENARIO_STORAGE, &image);
        let pending = scenario_descriptor();
        board.set_flag_page(&pending);

        let outcome = board.run();
        assert!(!outcome.installed);
        assert_eq!(
            outcome.visited.as_slice(),
            &[
                BootState::CheckOverride,
                BootState::CheckNewImage,
                BootState::VerifyAndInstall,
                BootState::BootExisting,
                BootState::WaitForHost
            ]
        );
        assert_eq!(board.flag_page(), pending);
        assert!(board
            .flash
            .snapshot(SCENARIO_LINK, 4096)
            .iter()
            .all(|b| *b == 0xff));
    }

    #[test]
    fn test_staged_image_with_wrong_crc_boots_matching_resident() {
        let mut board = Board::new();
        let resident = test_image_with_crc(SCENARIO_LINK, 4096, SCENARIO_CRC);
        board.flash.load(SCENARIO_LINK, &resident);
        let (image, _) = test_image(SCENARIO_LINK, 4096, 41);
        board.flash.load(SCENARIO_STORAGE, &image);
        let pending = scenario_descriptor();
        board.set_flag_page(&pending);

        assert_eq!(
            board.boot(),
            launched_at(SCENARIO_LINK, TEST_STACK_POINTER, SCENARIO_LINK + 0x0c1)
        );
        assert_eq!(board.flag_page(), pending);
        assert_eq!(board.flash.snapshot(SCENARIO_LINK, 4096), resident);
    }

    #[test]
    fn test_staged_image_with_matching_crc_is_installed() {
        let mut board = Board::new();
        let image = test_image_with_crc(SCENARIO_LINK, 4096, SCENARIO_CRC);
        board.flash.load(SCENARIO_STORAGE, &image);
        board.set_flag_page(&scenario_descriptor());

        let outcome = board.run();
        assert!(outcome.installed);
        assert_eq!(outcome.state, BootState::BootExisting);
        assert_eq!(board.flash.snapshot(SCENARIO_LINK, 4096), image);

        let consumed = board.flag_page();
        assert_eq!(consumed.options, BootOptions::NoNewImage);
        assert_eq!(consumed.storage_address, 0xffff_ffff);
        assert_eq!(consumed.crc32, SCENARIO_CRC);
        assert_eq!(consumed.link_address, SCENARIO_LINK);
    }

    #[test]
    fn test_blank_board_waits_for_host() {
        let mut board = Board::new();
        assert_eq!(board.boot(), Exit::WaitForHost);
    }

    #[test]
    fn test_no_new_image_never_writes_flash() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x3000, 1);
        board.flash.load(LINK_ADDRESS, &image);
        let current = staged(&image, crc, BootOptions::NoNewImage, STORAGE_ADDRESS);
        board.set_flag_page(&current);
        let erases = board.flash.erase_count();
        let writes = board.flash.write_count();

        for _ in 0..3 {
            assert_eq!(
                board.boot(),
                launched_at(LINK_ADDRESS, TEST_STACK_POINTER, LINK_ADDRESS + 0x0c1)
            );
        }
        assert_eq!(board.flash.erase_count(), erases);
        assert_eq!(board.flash.write_count(), writes);
        assert_eq!(board.flag_page(), current);
    }

    #[test]
    fn test_bad_staged_crc_keeps_flag_page_and_boots_resident() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x1000, 2);
        board.flash.load(LINK_ADDRESS, &image);

        // A retry of the image already running, whose staged copy got damaged.
        let mut damaged = image.clone();
        damaged[0x800] ^= 0x40;
        board.flash.load(STORAGE_ADDRESS, &damaged);
        let pending = staged(&image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS);
        board.set_flag_page(&pending);

        let outcome = board.run();
        assert_eq!(outcome.state, BootState::BootExisting);
        assert!(!outcome.installed);
        assert_eq!(outcome.last_error, Some(BootError::CrcMismatch));
        assert_eq!(
            outcome.visited.as_slice(),
            &[
                BootState::CheckOverride,
                BootState::CheckNewImage,
                BootState::VerifyAndInstall,
                BootState::BootExisting
            ]
        );
        assert_eq!(board.flag_page(), pending);
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
    }

    #[test]
    fn test_bad_staged_crc_with_other_resident_waits_for_host() {
        let mut board = Board::new();
        let (old, _) = test_image(LINK_ADDRESS, 0x1000, 3);
        board.flash.load(LINK_ADDRESS, &old);
        let (new, _) = test_image(LINK_ADDRESS, 0x1000, 4);
        board.flash.load(STORAGE_ADDRESS, &new);
        let pending = ImageDescriptor {
            crc32: 0xdead_beef,
            ..staged(&new, 0, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS)
        };
        board.set_flag_page(&pending);

        assert_eq!(board.boot(), Exit::WaitForHost);
        assert_eq!(board.flag_page(), pending);
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, old.len()), old);
    }

    #[test]
    fn test_override_gpio_skips_pending_update() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x1000, 5);
        board.flash.load(LINK_ADDRESS, &image);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = ImageDescriptor {
            override_gpio: 4,
            override_polarity: 1,
            ..staged(&image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS)
        };
        board.set_flag_page(&pending);
        board.gpio.set_level(4, true);
        let erases = board.flash.erase_count();

        let outcome = board.run();
        assert_eq!(
            outcome.visited.as_slice(),
            &[BootState::CheckOverride, BootState::BootExisting]
        );
        assert_eq!(outcome.state, BootState::BootExisting);
        assert!(board.gpio.is_configured(4));
        assert_eq!(board.flash.erase_count(), erases);
        assert_eq!(board.flag_page(), pending);

        // Releasing the pin lets the pending update through.
        board.gpio.set_level(4, false);
        assert!(board.run().installed);
        assert_eq!(board.flag_page().options, BootOptions::NoNewImage);
    }

    #[test]
    fn test_unset_override_reads_no_gpio() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x400, 6);
        board.flash.load(LINK_ADDRESS, &image);
        board.set_flag_page(&staged(&image, crc, BootOptions::NoNewImage, STORAGE_ADDRESS));
        board.run();
        assert_eq!(board.gpio.read_count(), 0);
    }

    #[test]
    fn test_implausible_resident_image_waits_for_host() {
        let mut board = Board::new();
        let (mut image, _) = test_image(LINK_ADDRESS, 0x400, 7);
        // Reset vector outside the image.
        image[4..8].copy_from_slice(&0x0002_0001u32.to_le_bytes());
        let crc = bootutil::crc32(&image);
        board.flash.load(LINK_ADDRESS, &image);
        board.set_flag_page(&staged(&image, crc, BootOptions::NoNewImage, STORAGE_ADDRESS));

        let outcome = board.run();
        assert_eq!(outcome.state, BootState::WaitForHost);
        assert_eq!(outcome.last_error, Some(BootError::BadResetVector));
        assert_eq!(board.boot(), Exit::WaitForHost);
    }
}
