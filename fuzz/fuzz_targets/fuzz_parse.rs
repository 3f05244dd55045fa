#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let result = dw_parser::parse("fuzz.dot", data);
    for err in &result.errors {
        assert!(err.position().is_valid(), "diagnostic without position: {err:?}");
    }
    let _ = serde_json::to_string(&result);
});
