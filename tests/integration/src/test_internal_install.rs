// Licensed under the Apache-2.0 license

#[cfg(test)]
mod test {
    use crate::test::*;
    use amboot_bootloader::BootState;
    use amboot_error::BootError;
    use amboot_testing::{test_image, Exit, TEST_STACK_POINTER};
    use flash_image::{BootOptions, ImageDescriptor, NO_STORAGE_ADDRESS};

    #[test]
    fn test_good_internal_install() {
        let mut board = Board::new();
        let (old, _) = test_image(LINK_ADDRESS, 0x2000, 10);
        board.flash.load(LINK_ADDRESS, &old);
        let (image, crc) = test_image(LINK_ADDRESS, 0x4000, 11);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = staged(&image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS);
        board.set_flag_page(&pending);

        assert_eq!(
            board.boot(),
            launched_at(LINK_ADDRESS, TEST_STACK_POINTER, LINK_ADDRESS + 0x0c1)
        );
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);

        let consumed = board.flag_page();
        assert_eq!(consumed.options, BootOptions::NoNewImage);
        assert_eq!(consumed.storage_address, NO_STORAGE_ADDRESS);
        assert_eq!(consumed.crc32, crc);
        assert_eq!(consumed.num_bytes, image.len() as u32);
        assert_eq!(consumed, pending.consumed());
    }

    #[test]
    fn test_install_is_idempotent_across_resets() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x2000, 12);
        board.flash.load(STORAGE_ADDRESS, &image);
        board.set_flag_page(&staged(
            &image,
            crc,
            BootOptions::NewImageInternalFlash,
            STORAGE_ADDRESS,
        ));

        let first = board.run();
        assert!(first.installed);
        assert_eq!(
            first.visited.as_slice(),
            &[
                BootState::CheckOverride,
                BootState::CheckNewImage,
                BootState::VerifyAndInstall,
                BootState::UpdateFlagPage,
                BootState::BootExisting
            ]
        );
        let erases = board.flash.erase_count();

        let second = board.run();
        assert!(!second.installed);
        assert_eq!(second.entry, first.entry);
        assert_eq!(board.flash.erase_count(), erases);
    }

    #[test]
    fn test_round_trip_of_partial_last_page() {
        for len in [0x104, 0x1ffc, 0x2004, 0x2804, 0x5ff0] {
            let mut board = Board::new();
            let (image, crc) = test_image(LINK_ADDRESS, len, len as u8);
            board.flash.load(STORAGE_ADDRESS, &image);
            board.set_flag_page(&staged(
                &image,
                crc,
                BootOptions::NewImageInternalFlash,
                STORAGE_ADDRESS,
            ));

            let outcome = board.run();
            assert!(outcome.installed, "len {:#x}", len);
            let installed = board.flash.snapshot(LINK_ADDRESS, len);
            assert_eq!(bootutil::crc32(&installed), board.flag_page().crc32);
            // The rest of the last page is left erased.
            let tail = board.map.page_base(LINK_ADDRESS + len as u32 - 1) + PAGE;
            let rest = board
                .flash
                .snapshot(LINK_ADDRESS + len as u32, (tail - LINK_ADDRESS) as usize - len);
            assert!(rest.iter().all(|b| *b == 0xff), "len {:#x}", len);
        }
    }

    #[test]
    fn test_corrupted_copy_fails_closed_then_recovers() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x3000, 13);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = staged(&image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS);
        board.set_flag_page(&pending);
        board.flash.flip_bit_at(LINK_ADDRESS + 0x2100);

        let outcome = board.run();
        assert!(!outcome.installed);
        assert_eq!(outcome.state, BootState::WaitForHost);
        assert_eq!(outcome.last_error, Some(BootError::CrcMismatch));
        assert_eq!(board.flag_page(), pending);

        // The staged copy is intact, so the next reset installs it.
        let outcome = board.run();
        assert!(outcome.installed);
        assert_eq!(outcome.state, BootState::BootExisting);
    }

    #[test]
    fn test_program_failure_leaves_flag_page() {
        let mut board = Board::new();
        let (image, crc) = test_image(LINK_ADDRESS, 0x3000, 14);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = staged(&image, crc, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS);
        board.set_flag_page(&pending);
        board.flash.fail_write_at(LINK_ADDRESS + PAGE);

        assert_eq!(board.boot(), Exit::WaitForHost);
        assert_eq!(board.flag_page(), pending);
    }

    #[test]
    fn test_encrypted_image_skips_crc() {
        let mut board = Board::new();
        let (image, _) = test_image(LINK_ADDRESS, 0x1000, 15);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = ImageDescriptor {
            encrypted: true,
            stack_pointer: 0x1000_4000,
            reset_vector: LINK_ADDRESS + 0x201,
            ..staged(&image, 0, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS)
        };
        board.set_flag_page(&pending);

        assert_eq!(
            board.boot(),
            launched_at(LINK_ADDRESS, 0x1000_4000, LINK_ADDRESS + 0x201)
        );
        assert_eq!(board.flash.snapshot(LINK_ADDRESS, image.len()), image);
        assert_eq!(board.flag_page(), pending.consumed());
    }

    #[test]
    fn test_encrypted_image_with_bad_stack_pointer_is_rejected() {
        let mut board = Board::new();
        let (image, _) = test_image(LINK_ADDRESS, 0x1000, 16);
        board.flash.load(STORAGE_ADDRESS, &image);
        let pending = ImageDescriptor {
            encrypted: true,
            stack_pointer: 0x2000_0000,
            reset_vector: LINK_ADDRESS + 0x201,
            ..staged(&image, 0, BootOptions::NewImageInternalFlash, STORAGE_ADDRESS)
        };
        board.set_flag_page(&pending);

        let outcome = board.run();
        assert!(!outcome.installed);
        assert_eq!(outcome.last_error, Some(BootError::BadStackPointer));
        assert_eq!(board.flag_page(), pending);
    }
}
