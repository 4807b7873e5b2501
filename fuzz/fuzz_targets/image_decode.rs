//! Fuzz target for image decoding and upload normalization.

#![no_main]

use libfuzzer_sys::fuzz_target;
use plantid::{build_request, Organ, Project};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(request) = build_request(data, "fuzz-key", Project::All, Organ::Leaf) {
        let (width, height) = request.dimensions();
        assert!(width.max(height) <= 1024);
    }
});
