#![no_main]

use clap::Parser;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let mut args = Vec::new();
        args.push("hitload".to_owned());
        for token in input.split_whitespace().take(64) {
            args.push(token.to_owned());
        }
        let arg_refs: Vec<&str> = args.iter().map(|value| value.as_str()).collect();
        if let Ok(parsed) = hitload::args::TesterArgs::try_parse_from(arg_refs) {
            debug_assert!(parsed.clients.get() >= 1);
            if let Some(requests) = parsed.requests {
                debug_assert!(requests.get() >= 1);
            }
            if hitload::config::validate_args(&parsed).is_ok() {
                debug_assert!(parsed.url.is_some() != parsed.urls_file.is_some());
                debug_assert!(parsed.requests.is_some() != parsed.duration.is_some());
            }
        }
    }
});
