#![no_main]
use bonjson::decode::{Decoder, NullVisitor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut visitor = NullVisitor;
    let _ = Decoder::new(data).run(&mut visitor);
});
