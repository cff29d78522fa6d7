#![no_main]

use libfuzzer_sys::fuzz_target;

// Arbitrary text must either parse or fail with a syntax error, never panic
fuzz_target!(|source: &str| {
    if let Ok(program) = pscript::parse(source) {
        let _ = program.snapshot();
    }
    for token in pscript::tokenize(source) {
        if token.is_err() { break; }
    }
});
