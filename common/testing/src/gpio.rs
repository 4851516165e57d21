// Licensed under the Apache-2.0 license

use amboot_hil::GpioInput;
use std::collections::{HashMap, HashSet};

/// GPIO bank whose input levels are set by the test. Unset pins read low.
#[derive(Default)]
pub struct EmulatedGpio {
    levels: HashMap<u32, bool>,
    configured: HashSet<u32>,
    reads: usize,
}

impl EmulatedGpio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_level(&mut self, pin: u32, high: bool) {
        self.levels.insert(pin, high);
    }

    pub fn is_configured(&self, pin: u32) -> bool {
        self.configured.contains(&pin)
    }

    pub fn read_count(&self) -> usize {
        self.reads
    }
}

impl GpioInput for EmulatedGpio {
    fn configure_input(&mut self, pin: u32) {
        self.configured.insert(pin);
    }

    fn read(&mut self, pin: u32) -> bool {
        self.reads += 1;
        self.levels.get(&pin).copied().unwrap_or(false)
    }
}
