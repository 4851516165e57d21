// Licensed under the Apache-2.0 license

//! Host-side emulation of the hardware the bootloader talks to, for unit and
//! integration tests.

mod exit;
mod flash;
mod gpio;
mod image;
mod spi_flash;

pub use exit::{run_to_exit, Exit, RecordingLauncher, RecordingTransport};
pub use flash::EmulatedFlash;
pub use gpio::EmulatedGpio;
pub use image::{test_image, test_image_with_crc, TEST_STACK_POINTER};
pub use spi_flash::EmulatedSpiFlash;
