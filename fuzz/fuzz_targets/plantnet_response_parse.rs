//! Fuzz target for Pl@ntNet response classification.
//!
//! Feeds arbitrary bodies to the interpreter as if they came back with
//! status 200, checking for panics or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use plantid::interpret;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(identification) = interpret(Some(200), body, None) {
        assert!(identification.candidates.len() <= 5);
        assert!(identification.total_matches >= identification.candidates.len());
    }
});
