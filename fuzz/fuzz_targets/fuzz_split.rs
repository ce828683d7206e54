#![no_main]

use libfuzzer_sys::fuzz_target;
use netframe::protocol::frame::{decode_frame, split_items};

fuzz_target!(|data: &[u8]| {
    // Arbitrary received frames must never panic the splitter
    let _ = decode_frame(data);
    let _ = split_items(data);
});
