// Licensed under the Apache-2.0 license

use amboot_config::{BootMemoryMap, BootStraps};

pub(crate) fn lines(map: &BootMemoryMap, straps: &BootStraps) -> Vec<String> {
    let mut vars: Vec<(String, String)> = map.hash_map().into_iter().collect();
    vars.push((
        "DEFAULT_LINK_ADDRESS".to_string(),
        format!("0x{:x}", straps.default_link_address),
    ));
    vars.sort();
    vars.into_iter().map(|(k, v)| format!("{k}={v}")).collect()
}

pub(crate) fn print() {
    for line in lines(&BootMemoryMap::default(), &BootStraps::default()) {
        println!("{line}");
    }
}
