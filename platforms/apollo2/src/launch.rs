// Licensed under the Apache-2.0 license

use crate::hal;
use amboot_hil::{HostTransport, ImageLauncher};
use cortex_m::peripheral::SCB;

/// Jumps into an application image the way the Cortex-M core would after
/// reset: vector table relocated, MSP loaded, reset handler entered.
pub struct CortexMLauncher;

impl ImageLauncher for CortexMLauncher {
    fn launch(&mut self, vector_table: u32, stack_pointer: u32, reset_vector: u32) -> ! {
        cortex_m::interrupt::disable();
        // Safety: the image was verified and nothing else touches VTOR.
        unsafe {
            (*SCB::PTR).vtor.write(vector_table);
        }
        cortex_m::asm::dsb();
        cortex_m::asm::isb();
        // Safety: stack pointer and reset vector were validated against the
        // SRAM window and the image bounds.
        unsafe { cortex_m::asm::bootstrap(stack_pointer as *const u32, reset_vector as *const u32) }
    }
}

/// Runs the core at full speed with the cache on and unused board pads in
/// their low power state, then parks it until the host interface delivers
/// a new image. The transfer itself runs from interrupt handlers installed
/// by the application-specific transport.
pub struct HostIdle;

impl HostTransport for HostIdle {
    fn wait_for_host(&mut self) -> ! {
        // Safety: clock, cache and pad setup have no memory safety
        // requirements. The cache defaults are a HAL-owned static.
        unsafe {
            hal::am_hal_clkgen_sysclk_select(hal::AM_HAL_CLKGEN_SYSCLK_MAX);
            hal::am_hal_cachectrl_enable(core::ptr::addr_of!(hal::am_hal_cachectrl_defaults));
            hal::am_bsp_low_power_init();
        }
        // Safety: the bootloader holds no critical section here.
        unsafe { cortex_m::interrupt::enable() };
        loop {
            cortex_m::asm::wfi();
        }
    }
}
