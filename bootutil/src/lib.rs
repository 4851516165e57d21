// Licensed under the Apache-2.0 license

#![cfg_attr(target_arch = "arm", no_std)]

mod crc32;
pub use crc32::*;
mod exclusive;
pub use exclusive::*;

// Helpers to route debug output to whatever sink the platform provides
// (ITM or UART on hardware). Without a printer installed, printing is a no-op.

use core::cell::RefCell;
use core::fmt::{Arguments, Display, Write};
use critical_section::Mutex;

static WRITER: Mutex<RefCell<Option<&'static mut (dyn Write + Send)>>> =
    Mutex::new(RefCell::new(None));

/// Sets the global backing writer for `print` and `println` macros.
pub fn set_printer(writer: &'static mut (dyn Write + Send)) {
    critical_section::with(|cs| {
        *WRITER.borrow_ref_mut(cs) = Some(writer);
    });
}

/// Removes the backing writer; subsequent prints are dropped.
pub fn clear_printer() {
    critical_section::with(|cs| {
        *WRITER.borrow_ref_mut(cs) = None;
    });
}

#[doc(hidden)]
pub fn _print(args: Arguments, newline: bool) {
    critical_section::with(|cs| {
        if let Some(writer) = WRITER.borrow_ref_mut(cs).as_mut() {
            let _ = writer.write_fmt(args);
            if newline {
                let _ = writer.write_str("\n");
            }
        }
    });
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::_print(format_args!($($arg)*), false)
    };
}

#[macro_export]
macro_rules! println {
    ($($arg:tt)*) => {
        $crate::_print(format_args!($($arg)*), true)
    };
}

pub struct HexBytes<'a>(pub &'a [u8]);
impl Display for HexBytes<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        // Rust can't prove the indexes are correct in a format macro.
        for &x in self.0.iter() {
            let c = x >> 4;
            if c < 10 {
                f.write_char((c + b'0') as char)?;
            } else {
                f.write_char((c - 10 + b'A') as char)?;
            }
            let c = x & 0xf;
            if c < 10 {
                f.write_char((c + b'0') as char)?;
            } else {
                f.write_char((c - 10 + b'A') as char)?;
            }
        }
        Ok(())
    }
}

pub struct HexWord(pub u32);
impl Display for HexWord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        HexBytes(&self.0.to_be_bytes()).fmt(f)
    }
}
