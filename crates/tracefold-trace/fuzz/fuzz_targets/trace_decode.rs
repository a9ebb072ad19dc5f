#![no_main]
use ciborium::de::from_reader;
use libfuzzer_sys::fuzz_target;
use tracefold_core::Consolidator;
use tracefold_trace::{format::TraceLog, io::decode};

fuzz_target!(|data: &[u8]| {
    let _ = from_reader::<TraceLog, _>(data);
    // Whatever decodes must consolidate without panicking.
    if let Ok(log) = decode(data) {
        let _ = log.consolidate(&Consolidator::default());
    }
});
