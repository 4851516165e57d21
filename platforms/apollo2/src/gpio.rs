// Licensed under the Apache-2.0 license

// Minimal GPIO input access through the Apollo2 GPIO block registers.

use amboot_hil::GpioInput;

const GPIO_BASE: usize = 0x4001_0000;
const PADREG: usize = GPIO_BASE;
const CFG: usize = GPIO_BASE + 0x40;
const PADKEY: usize = GPIO_BASE + 0x60;
const RDA: usize = GPIO_BASE + 0x80;
const RDB: usize = GPIO_BASE + 0x84;

const PADKEY_UNLOCK: u32 = 0x73;
const PAD_INPEN: u32 = 0x02;
const PAD_FIELD_MASK: u32 = 0xff;
const CFG_FIELD_MASK: u32 = 0xf;
const MAX_PIN: u32 = 49;

pub struct Apollo2Gpio;

fn modify(reg: usize, mask: u32, value: u32) {
    // Safety: `reg` is a GPIO block register.
    unsafe {
        let old = core::ptr::read_volatile(reg as *const u32);
        core::ptr::write_volatile(reg as *mut u32, (old & !mask) | value);
    }
}

impl GpioInput for Apollo2Gpio {
    fn configure_input(&mut self, pin: u32) {
        if pin > MAX_PIN {
            return;
        }
        let pad_reg = PADREG + (pin as usize / 4) * 4;
        let pad_shift = (pin % 4) * 8;
        let cfg_reg = CFG + (pin as usize / 8) * 4;
        let cfg_shift = (pin % 8) * 4;
        critical_section::with(|_| {
            // Safety: PADKEY is a GPIO block register.
            unsafe { core::ptr::write_volatile(PADKEY as *mut u32, PADKEY_UNLOCK) };
            modify(pad_reg, PAD_FIELD_MASK << pad_shift, PAD_INPEN << pad_shift);
            // Output disabled, input read enabled.
            modify(cfg_reg, CFG_FIELD_MASK << cfg_shift, 0);
            // Safety: as above.
            unsafe { core::ptr::write_volatile(PADKEY as *mut u32, 0) };
        });
    }

    fn read(&mut self, pin: u32) -> bool {
        if pin > MAX_PIN {
            return false;
        }
        let (reg, bit) = if pin < 32 { (RDA, pin) } else { (RDB, pin - 32) };
        // Safety: RDA/RDB are read-only GPIO block registers.
        let value = unsafe { core::ptr::read_volatile(reg as *const u32) };
        value & (1 << bit) != 0
    }
}
