// Licensed under the Apache-2.0 license

pub mod external;
pub mod flash_partition;
pub use amboot_hil as hil;
