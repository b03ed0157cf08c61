#![no_main]
use bonjson::{Limits, PosMap};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = PosMap::scan(data, Limits::default());
});
