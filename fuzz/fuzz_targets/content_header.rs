#![no_main]
use libfuzzer_sys::fuzz_target;
use amqp_props::ContentHeader;

fuzz_target!(|data: &[u8]| {
    let _ = ContentHeader::decode(data);
});
