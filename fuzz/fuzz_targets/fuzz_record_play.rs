#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlscript::player;
use xmlscript::writer::XmlWriter;
use xmlscript::{RecordOptions, Recorder};

fuzz_target!(|data: &[u8]| {
    // Record -> replay -> record should never panic
    let options = RecordOptions::default().debug(true);
    if let Ok(script) = Recorder::record_bytes(data, &options) {
        let mut writer = XmlWriter::new(Vec::new());
        if player::run(&script, &mut writer).is_ok() {
            let _ = Recorder::record_bytes(&writer.into_inner(), &options);
        }
    }
});
