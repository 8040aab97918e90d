#![no_main]

use hitload::config::Target;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(target) = Target::parse(input) {
            debug_assert!(!target.host().is_empty());
            debug_assert!(target.path_and_query().starts_with('/'));
        }
    }
});
