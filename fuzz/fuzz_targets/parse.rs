#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Parsing never fails; it must also never panic or loop
        let (_, diagnostics) = kpl_syntax::parse(s);
        for d in &diagnostics {
            assert!(d.span.start <= d.span.end);
            assert!(d.span.end <= s.len());
        }
    }
});
