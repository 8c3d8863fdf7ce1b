#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use plane_tester::suite::parse_suite;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing must never panic; a successful parse must survive a render round-trip
        if let Ok(suite) = parse_suite(s, Path::new("fuzz.test")) {
            let rendered: String = suite.cases.iter().map(|case| case.render()).collect();
            let reparsed = parse_suite(&rendered, Path::new("fuzz.test"));
            assert!(reparsed.is_ok(), "rendered suite failed to parse:\n{rendered}");
        }
    }
});
