#![deny(missing_docs)]
//! JSON input/output and option parsing for the layout synthesizer.
//!
//! This crate is the only place coordinates ever pass through a textual or
//! floating-point representation; everything past [`load`] is exact
//! [`lss_core::Rational`] arithmetic.

/// Input JSON decoding (`default`/`bench` formats) and isomorphism checks.
pub mod input;
/// Recognized option keys (`SynthesisOptions` and friends).
pub mod options;
/// Output JSON shape and serialization.
pub mod output;

pub use input::{apply_debug_noise, build_and_validate, parse_examples};
pub use options::{InputFormat, InstantiationMethod, LearningMethodOption, NumericType, PruningMethod, SynthesisOptions};
pub use output::{build_output, write_output, OutputDocument};

use lss_core::{Result, Views};

/// Parses, noise-jitters (if requested), and isomorphism-validates an input
/// document in one call — the entry point `lss-pipeline` drives.
pub fn load(json: &str, options: &SynthesisOptions) -> Result<Vec<Views>> {
    let mut specs = parse_examples(json, options.input_format, options.numeric_type)?;
    if options.debug_noise > lss_core::Rational::from_integer(num_bigint::BigInt::from(0)) {
        for spec in &mut specs {
            apply_debug_noise(spec, &options.debug_noise, options.debug_noise_seed);
        }
    }
    build_and_validate(specs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_end_to_end_default_format() {
        let json = r#"{"examples": [{"name": "root", "rect": [0,0,100,100], "children": [
            {"name": "child", "rect": [10,10,60,60], "children": []}
        ]}]}"#;
        let options = SynthesisOptions::default();
        let trees = load(json, &options).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].name(trees[0].root()), "root");
    }
}
