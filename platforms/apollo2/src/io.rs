// Licensed under the Apache-2.0 license.

use amboot_bootloader::FatalErrorHandler;
use bootutil::HexWord;
use core::fmt::Write;
use cortex_m::peripheral::{itm, ITM, SCB};

/// Debug output on ITM stimulus port 0.
pub(crate) struct ItmWriter {}

impl Write for ItmWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        // Safety: the bootloader is single threaded and port 0 is only
        // written from here.
        let itm = unsafe { &mut *(ITM::PTR as *mut itm::RegisterBlock) };
        cortex_m::itm::write_str(&mut itm.stim[0], s);
        Ok(())
    }
}

pub(crate) struct Apollo2FatalErrorHandler {}

impl FatalErrorHandler for Apollo2FatalErrorHandler {
    fn fatal_error(&mut self, code: u32) -> ! {
        let _ = writeln!(ItmWriter {}, "[amboot] Fatal error: {}", HexWord(code));
        SCB::sys_reset();
    }
}
