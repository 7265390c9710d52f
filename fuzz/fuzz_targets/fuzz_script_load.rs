#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlscript::writer::TraceWriter;
use xmlscript::{player, Script};

fuzz_target!(|data: &[u8]| {
    // Arbitrary script documents either fail to load, fail to replay, or
    // replay to completion; none of them may panic.
    if let Ok(script) = Script::parse_bytes(data) {
        let mut trace = TraceWriter::new();
        let _ = player::run(&script, &mut trace);
        let _ = script.to_xml();
    }
});
