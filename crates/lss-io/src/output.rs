//! Output JSON shape: constraints, (always empty) axioms, and the min/max
//! valuations maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lss_core::rational::to_rational_string;
use lss_core::{Constraint, ConstraintWire, Rational};

/// The output document serialized verbatim as the pipeline's result.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputDocument {
    /// Selected constraints in wire form.
    pub constraints: Vec<ConstraintWire>,
    /// Reserved for future structural axioms; always empty in this
    /// implementation.
    pub axioms: Vec<serde_json::Value>,
    /// `"view.attr"` -> rational string at the low sampled conformance.
    pub valuations_min: BTreeMap<String, String>,
    /// `"view.attr"` -> rational string at the high sampled conformance.
    pub valuations_max: BTreeMap<String, String>,
}

/// Builds the output document from a pipeline's selected constraints and
/// derived anchor bounds.
pub fn build_output(
    constraints: &[Constraint],
    min_vals: &BTreeMap<String, Rational>,
    max_vals: &BTreeMap<String, Rational>,
) -> OutputDocument {
    OutputDocument {
        constraints: constraints.iter().map(Constraint::to_wire).collect(),
        axioms: Vec::new(),
        valuations_min: min_vals.iter().map(|(k, v)| (k.clone(), to_rational_string(v))).collect(),
        valuations_max: max_vals.iter().map(|(k, v)| (k.clone(), to_rational_string(v))).collect(),
    }
}

/// Serializes the output document as pretty-printed JSON.
pub fn write_output(doc: &OutputDocument) -> lss_core::Result<String> {
    serde_json::to_string_pretty(doc).map_err(|err| {
        lss_core::Error::input("bad_output", format!("failed to serialize output: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lss_core::{AnchorId, Attribute, ComparisonOp, ConstraintKind, Priority};
    use num_bigint::BigInt;

    fn r(n: i64) -> Rational {
        Rational::from_integer(BigInt::from(n))
    }

    #[test]
    fn builds_expected_shape() {
        let constraint = Constraint::Constant {
            kind: ConstraintKind::SizeConstant,
            y: AnchorId::new("child", Attribute::Width),
            b: Some(r(50)),
            op: ComparisonOp::Eq,
            priority: Priority::Required,
            sample_count: 4,
            is_falsified: false,
        };
        let mut min_vals = BTreeMap::new();
        min_vals.insert("child.width".to_string(), r(50));
        let max_vals = BTreeMap::new();

        let doc = build_output(&[constraint], &min_vals, &max_vals);
        assert_eq!(doc.constraints.len(), 1);
        assert!(doc.axioms.is_empty());
        assert_eq!(doc.valuations_min["child.width"], "50");

        let json = write_output(&doc).unwrap();
        assert!(json.contains("\"constraints\""));
        assert!(json.contains("\"valuations_min\""));
    }
}
