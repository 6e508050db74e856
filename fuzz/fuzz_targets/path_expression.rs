#![no_main]

use geodcat::namespaces::NamespaceRegistry;
use geodcat::PathExpr;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = PathExpr::compile(source, &NamespaceRegistry::iso19139());
    }
});
