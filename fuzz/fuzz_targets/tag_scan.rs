#![no_main]

use libfuzzer_sys::fuzz_target;
use microtmpl_engine::{tokenize, TemplateSettings};
use once_cell::sync::Lazy;

static SETTINGS: Lazy<TemplateSettings> = Lazy::new(TemplateSettings::default);

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        if let Ok(tags) = tokenize(source, &SETTINGS) {
            let mut last_end = 0;
            for tag in tags {
                assert!(tag.span.start >= last_end);
                assert!(tag.span.end <= source.len());
                last_end = tag.span.end;
            }
        }
    }
});
