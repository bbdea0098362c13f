//! `SynthesisOptions`: the option keys recognized at the JSON/CLI boundary.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use lss_core::{Error, Rational, Result};

/// Input document shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// `{"examples": [{"name","rect":[L,T,R,B],"children"}, ...]}`.
    Default,
    /// `{"train": [{"name","left","top","width","height","children"}, ...]}`.
    Bench,
}

impl Default for InputFormat {
    fn default() -> Self {
        InputFormat::Default
    }
}

/// Canonical number type requested for rect coordinates. Internally every
/// coordinate is always an exact [`Rational`]; this only gates which values
/// `lss-io` accepts as well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumericType {
    /// Natural numbers: non-negative integers.
    N,
    /// Reals: any rational value (the implementation's practical ceiling).
    R,
    /// Rationals: any value, same acceptance as `R` in this implementation.
    Q,
    /// Integers: denominator must be 1.
    Z,
}

impl Default for NumericType {
    fn default() -> Self {
        NumericType::R
    }
}

impl NumericType {
    /// Validates a decoded coordinate against the requested numeric type.
    pub fn validate(self, value: &Rational) -> Result<()> {
        use num_traits::{One, Signed};
        let is_integer = value.denom().is_one();
        match self {
            NumericType::N => {
                if !is_integer || value.is_negative() {
                    return Err(Error::input(
                        "numeric_type_mismatch",
                        format!("value '{value}' is not a natural number"),
                    ));
                }
            }
            NumericType::Z => {
                if !is_integer {
                    return Err(Error::input(
                        "numeric_type_mismatch",
                        format!("value '{value}' is not an integer"),
                    ));
                }
            }
            NumericType::R | NumericType::Q => {}
        }
        Ok(())
    }
}

/// Template enumerator flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstantiationMethod {
    /// The matrix/bitset algorithm implemented by `lss-template`.
    Numpy,
    /// Legacy Prolog-rule instantiator; recognized as a config value but
    /// not implemented.
    Prolog,
}

impl Default for InstantiationMethod {
    fn default() -> Self {
        InstantiationMethod::Numpy
    }
}

/// Parameter learner variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningMethodOption {
    /// Midpoint-only fit.
    Simple,
    /// Rounds to a small set of "nice" rationals.
    Heuristic,
    /// Stern-Brocot / continued-fraction search.
    Noisetolerant,
}

impl Default for LearningMethodOption {
    fn default() -> Self {
        LearningMethodOption::Noisetolerant
    }
}

impl From<LearningMethodOption> for lss_learn::LearningMethod {
    fn from(value: LearningMethodOption) -> Self {
        match value {
            LearningMethodOption::Simple => lss_learn::LearningMethod::Simple,
            LearningMethodOption::Heuristic => lss_learn::LearningMethod::Heuristic,
            LearningMethodOption::Noisetolerant => lss_learn::LearningMethod::NoiseTolerant,
        }
    }
}

/// Direct vs. hierarchical pruning strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruningMethod {
    /// Solve the whole tree as one Max-SMT instance.
    Baseline,
    /// Top-down worklist decomposition, solving each subtree independently.
    Hierarchical,
}

impl Default for PruningMethod {
    fn default() -> Self {
        PruningMethod::Hierarchical
    }
}

/// The full recognized option set, covering the input/output JSON
/// boundary's configuration keys plus a couple of solver tolerances
/// exposed as config rather than hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    /// Parse mode.
    pub input_format: InputFormat,
    /// Canonical number type for rect coordinates.
    pub numeric_type: NumericType,
    /// Template enumerator flavor.
    pub instantiation_method: InstantiationMethod,
    /// Parameter learner variant.
    pub learning_method: LearningMethodOption,
    /// Direct vs. hierarchical pruning strategy.
    pub pruning_method: PruningMethod,
    /// Enable the CEGIS unambiguity refinement loop.
    pub unambig: bool,
    /// Enable the "at most two of four anchors constrained" determinism
    /// clauses (only meaningful alongside `unambig`).
    pub determinism: bool,
    /// Uniform random noise added to input rects before synthesis, for
    /// robustness testing. Must be non-negative.
    pub debug_noise: Rational,
    /// Seed for the `debug_noise` RNG; fixed so repeated runs are
    /// reproducible.
    pub debug_noise_seed: u64,
    /// Enable the hierarchical "integration" re-admission pass.
    pub integrate: bool,
    /// CEGIS loop iteration cap before raising `AmbiguityLimit`.
    pub ambiguity_iteration_cap: u32,
    /// Tolerance used to fold a `<=`/`>=` pair on the same anchor into a
    /// single `=` constraint.
    pub combine_bounds_tolerance: Rational,
    /// Number of conformances sampled per subtree solve (2 or 3).
    pub conformance_samples: usize,
    /// Optional path to dump the unsat core when an `Infeasible` error is
    /// raised.
    pub conflict_dump_path: Option<PathBuf>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            input_format: InputFormat::default(),
            numeric_type: NumericType::default(),
            instantiation_method: InstantiationMethod::default(),
            learning_method: LearningMethodOption::default(),
            pruning_method: PruningMethod::default(),
            unambig: false,
            determinism: true,
            debug_noise: Rational::from_integer(num_bigint::BigInt::from(0)),
            debug_noise_seed: 0,
            integrate: false,
            ambiguity_iteration_cap: 32,
            combine_bounds_tolerance: Rational::new(num_bigint::BigInt::from(5), num_bigint::BigInt::from(1)),
            conformance_samples: 3,
            conflict_dump_path: None,
        }
    }
}

impl SynthesisOptions {
    /// Parses options from a JSON document, falling back to defaults for
    /// any key not present. Unknown enum values surface as `Error::Input`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            Error::input("bad_options", format!("failed to parse options: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let opts = SynthesisOptions::default();
        let json = serde_json::to_string(&opts).unwrap();
        let parsed = SynthesisOptions::from_json(&json).unwrap();
        assert_eq!(parsed.unambig, opts.unambig);
        assert_eq!(parsed.pruning_method, opts.pruning_method);
    }

    #[test]
    fn unknown_enum_value_is_an_input_error() {
        let json = r#"{"learning_method": "bayesian"}"#;
        let err = SynthesisOptions::from_json(json).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn numeric_type_rejects_non_integer_for_z() {
        let half = Rational::new(num_bigint::BigInt::from(1), num_bigint::BigInt::from(2));
        assert!(NumericType::Z.validate(&half).is_err());
        assert!(NumericType::R.validate(&half).is_ok());
    }
}
