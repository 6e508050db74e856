#![no_main]

use std::sync::OnceLock;

use geodcat::{ConversionConfig, Converter, RdfFormat};
use libfuzzer_sys::fuzz_target;

fn converter() -> &'static Converter {
    static CONVERTER: OnceLock<Converter> = OnceLock::new();
    CONVERTER.get_or_init(|| {
        Converter::geodcat_ap(ConversionConfig::new().with_output_format(RdfFormat::NTriples))
            .expect("built-in profile")
    })
}

fuzz_target!(|data: &[u8]| {
    // Any outcome is fine as long as it is not a panic; successful output must
    // be deterministic.
    if let Ok(first) = converter().convert(data) {
        let second = converter().convert(data).expect("second run succeeds");
        assert_eq!(first.output, second.output);
    }
});
