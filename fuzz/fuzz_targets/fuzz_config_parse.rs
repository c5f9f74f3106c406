// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz preference parsing with arbitrary TOML-like strings.
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing must never panic.
        if let Ok(prefs) = tl_config::parse_toml(s) {
            let _ = tl_config::validate_preferences(&prefs);
            let _ = prefs.wait_policy();
        }

        if let Ok(val) = toml::from_str::<toml::Value>(s) {
            let _ = toml::to_string(&val);
        }
    }
});
