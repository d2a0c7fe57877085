#![no_main]

use libfuzzer_sys::fuzz_target;
use weft_view::ViewName;

fuzz_target!(|data: &[u8]| {
    if let Ok(raw) = std::str::from_utf8(data) {
        let parsed = ViewName::parse(raw);
        let rendered = parsed.to_string();
        let reparsed = ViewName::parse(&rendered);
        // Rendered names re-parse and re-render stably.
        assert_eq!(reparsed.to_string(), rendered);
        // Template names round-trip exactly.
        if parsed.is_template() {
            assert_eq!(reparsed, parsed);
        }
    }
});
