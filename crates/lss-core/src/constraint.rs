//! Constraint value type, taxonomy, and template/concrete distinction.

use serde::{Deserialize, Serialize};

use crate::rational::{from_rational_string, to_rational_string, Rational};
use crate::view::AnchorId;

/// Comparison operator carried by a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `y = ...`
    Eq,
    /// `y <= ...`
    Le,
    /// `y >= ...`
    Ge,
}

impl ComparisonOp {
    /// Wire symbol: `"="`, `"≤"`, or `"≥"`.
    pub fn as_str(self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Le => "≤",
            ComparisonOp::Ge => "≥",
        }
    }

    /// Flips the inequality direction; `Eq` is its own flip.
    pub fn flip(self) -> ComparisonOp {
        match self {
            ComparisonOp::Eq => ComparisonOp::Eq,
            ComparisonOp::Le => ComparisonOp::Ge,
            ComparisonOp::Ge => ComparisonOp::Le,
        }
    }
}

/// Soft-constraint strength, ordered weakest to strongest for SMT weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Lowest strength: nice to have.
    Weak,
    /// Default learned-candidate strength.
    Medium,
    /// Elevated strength, used by the hierarchical "integration" re-admission
    /// pass.
    Strong,
    /// Hard requirement; never pruned.
    Required,
}

impl Priority {
    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Weak => "weak",
            Priority::Medium => "medium",
            Priority::Strong => "strong",
            Priority::Required => "required",
        }
    }
}

/// Categorical tag for a constraint's shape, fixing which of `a`/`b` are
/// free parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    /// `size = b` (a constant form).
    SizeConstant,
    /// `w = a * h` on the same view (a mul-only form).
    SizeAspectRatio,
    /// `child.size = a * parent.size` (a mul-only form).
    SizeRatio,
    /// `position = position + b` between parent/child or dual siblings (an
    /// add-only form).
    PosLtrbOffset,
    /// `position = position (+ b)` between aligned siblings (an add-only
    /// form, `b` nominally zero but left free for measurement tolerance).
    PosAlignment,
}

impl ConstraintKind {
    /// `true` for [`ConstraintKind::SizeConstant`].
    pub fn is_constant_form(self) -> bool {
        matches!(self, ConstraintKind::SizeConstant)
    }

    /// `true` for kinds where `b` is fixed at zero and `a` is the free
    /// parameter.
    pub fn is_mul_only_form(self) -> bool {
        matches!(self, ConstraintKind::SizeAspectRatio | ConstraintKind::SizeRatio)
    }

    /// `true` for kinds where `a` is fixed at one and `b` is the free
    /// parameter.
    pub fn is_add_only_form(self) -> bool {
        matches!(
            self,
            ConstraintKind::PosLtrbOffset | ConstraintKind::PosAlignment
        )
    }

    /// `true` for kinds where both `a` and `b` are free (none currently; the
    /// instantiator never emits a general-form template, but the bit is part
    /// of the taxonomy contract so solvers can match on it uniformly).
    pub fn is_general_form(self) -> bool {
        !self.is_constant_form() && !self.is_mul_only_form() && !self.is_add_only_form()
    }

    /// Lowercase wire name used in output JSON's `kind` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::SizeConstant => "size_constant",
            ConstraintKind::SizeAspectRatio => "size_aspect_ratio",
            ConstraintKind::SizeRatio => "size_ratio",
            ConstraintKind::PosLtrbOffset => "pos_ltrb_offset",
            ConstraintKind::PosAlignment => "pos_alignment",
        }
    }
}

/// A constraint over anchors: either a constant form (`y op b`) or a linear
/// form (`y op a*x + b`). Shares `kind`/`op`/`priority`/`sample_count`/
/// `is_falsified` across both variants, tagged by shape rather than left as
/// an open trait hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// `y op b`, where `y` is a size anchor and `b` may be unbound
    /// (template) or bound (concrete).
    Constant {
        /// Shape tag.
        kind: ConstraintKind,
        /// The anchor being constrained.
        y: AnchorId,
        /// The constant term, `None` while still a template.
        b: Option<Rational>,
        /// Comparison operator.
        op: ComparisonOp,
        /// Soft-constraint strength.
        priority: Priority,
        /// Number of examples that supported this constraint.
        sample_count: u32,
        /// Set if learning discovered an internal inconsistency for this
        /// shape (e.g. division by zero in a mul-only template).
        is_falsified: bool,
    },
    /// `y op a*x + b`, with `a != 0`. Both `x` and `y` lie in the same axis
    /// family.
    Linear {
        /// Shape tag.
        kind: ConstraintKind,
        /// The anchor being constrained.
        y: AnchorId,
        /// The anchor `y` is expressed in terms of.
        x: AnchorId,
        /// Multiplicative parameter, `None` while still a template for
        /// mul-bearing kinds.
        a: Option<Rational>,
        /// Additive parameter, `None` while still a template for
        /// add-bearing kinds.
        b: Option<Rational>,
        /// Comparison operator.
        op: ComparisonOp,
        /// Soft-constraint strength.
        priority: Priority,
        /// Number of examples that supported this constraint.
        sample_count: u32,
        /// Set if learning discovered an internal inconsistency for this
        /// shape.
        is_falsified: bool,
    },
}

impl Constraint {
    /// Shape tag shared by both variants.
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Constraint::Constant { kind, .. } => *kind,
            Constraint::Linear { kind, .. } => *kind,
        }
    }

    /// The constrained anchor, shared by both variants.
    pub fn y(&self) -> &AnchorId {
        match self {
            Constraint::Constant { y, .. } => y,
            Constraint::Linear { y, .. } => y,
        }
    }

    /// The anchor `y` is expressed in terms of, if this is a [`Constraint::Linear`].
    pub fn x(&self) -> Option<&AnchorId> {
        match self {
            Constraint::Constant { .. } => None,
            Constraint::Linear { x, .. } => Some(x),
        }
    }

    /// Comparison operator, shared by both variants.
    pub fn op(&self) -> ComparisonOp {
        match self {
            Constraint::Constant { op, .. } => *op,
            Constraint::Linear { op, .. } => *op,
        }
    }

    /// Soft-constraint strength, shared by both variants.
    pub fn priority(&self) -> Priority {
        match self {
            Constraint::Constant { priority, .. } => *priority,
            Constraint::Linear { priority, .. } => *priority,
        }
    }

    /// Returns a copy of this constraint with a new priority.
    pub fn with_priority(&self, priority: Priority) -> Constraint {
        let mut out = self.clone();
        match &mut out {
            Constraint::Constant { priority: p, .. } => *p = priority,
            Constraint::Linear { priority: p, .. } => *p = priority,
        }
        out
    }

    /// `true` iff this constraint's numeric parameters are still unbound.
    pub fn is_template(&self) -> bool {
        match self {
            Constraint::Constant { b, .. } => b.is_none(),
            Constraint::Linear { kind, a, b, .. } => {
                if kind.is_mul_only_form() {
                    a.is_none()
                } else if kind.is_add_only_form() {
                    b.is_none()
                } else {
                    a.is_none() || b.is_none()
                }
            }
        }
    }

    /// Concretizes a template by binding its free parameter(s), returning a
    /// new constraint (pure function; `self` is unchanged).
    ///
    /// Panics if called on a non-template constraint.
    pub fn subst(&self, a: Option<Rational>, b: Option<Rational>, sample_count: u32) -> Constraint {
        assert!(self.is_template(), "subst called on a concrete constraint");
        assert_ne!(sample_count, 0, "subst requires a non-zero sample_count");
        match self {
            Constraint::Constant { kind, y, op, priority, is_falsified, .. } => {
                assert!(a.is_none(), "Constant constraints never bind `a`");
                Constraint::Constant {
                    kind: *kind,
                    y: y.clone(),
                    b,
                    op: *op,
                    priority: *priority,
                    sample_count,
                    is_falsified: *is_falsified,
                }
            }
            Constraint::Linear {
                kind,
                y,
                x,
                a: old_a,
                b: old_b,
                op,
                priority,
                is_falsified,
                ..
            } => Constraint::Linear {
                kind: *kind,
                y: y.clone(),
                x: x.clone(),
                a: a.or_else(|| old_a.clone()),
                b: b.or_else(|| old_b.clone()),
                op: *op,
                priority: *priority,
                sample_count,
                is_falsified: *is_falsified,
            },
        }
    }

    /// Serializable wire form matching the output JSON's constraint shape.
    pub fn to_wire(&self) -> ConstraintWire {
        match self {
            Constraint::Constant { y, b, op, priority, kind, .. } => ConstraintWire {
                y: y.to_string(),
                op: op.as_str().to_string(),
                x: None,
                a: None,
                b: b.as_ref().map(to_rational_string),
                strength: priority.as_str().to_string(),
                kind: kind.as_str().to_string(),
            },
            Constraint::Linear { y, x, a, b, op, priority, kind, .. } => ConstraintWire {
                y: y.to_string(),
                op: op.as_str().to_string(),
                x: Some(x.to_string()),
                a: a.as_ref().map(to_rational_string),
                b: b.as_ref().map(to_rational_string),
                strength: priority.as_str().to_string(),
                kind: kind.as_str().to_string(),
            },
        }
    }
}

/// Plain-data wire representation of a [`Constraint`], the shape serialized
/// into the output JSON's `constraints` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintWire {
    /// Constrained anchor id, e.g. `"child.left"`.
    pub y: String,
    /// `"="`, `"≤"`, or `"≥"`.
    pub op: String,
    /// Anchor `y` is expressed in terms of, absent for constant constraints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Multiplicative parameter as a rational string, when bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<String>,
    /// Additive/constant parameter as a rational string, when bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<String>,
    /// `"required" | "strong" | "medium" | "weak"`.
    pub strength: String,
    /// Lowercase [`ConstraintKind`] name.
    pub kind: String,
}

impl ConstraintWire {
    /// Parses the `op` wire symbol back into a [`ComparisonOp`].
    pub fn parse_op(&self) -> Option<ComparisonOp> {
        match self.op.as_str() {
            "=" => Some(ComparisonOp::Eq),
            "≤" | "<=" => Some(ComparisonOp::Le),
            "≥" | ">=" => Some(ComparisonOp::Ge),
            _ => None,
        }
    }

    /// Parses the `a`/`b` rational strings, if present.
    pub fn parse_a(&self) -> Option<Rational> {
        self.a.as_deref().and_then(from_rational_string)
    }

    /// Parses the `b` rational string, if present.
    pub fn parse_b(&self) -> Option<Rational> {
        self.b.as_deref().and_then(from_rational_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn r(n: i64) -> Rational {
        Rational::from_integer(BigInt::from(n))
    }

    fn anchor(name: &str, attr: crate::Attribute) -> AnchorId {
        AnchorId::new(name, attr)
    }

    #[test]
    fn template_subst_binds_constant() {
        let template = Constraint::Constant {
            kind: ConstraintKind::SizeConstant,
            y: anchor("child", crate::Attribute::Width),
            b: None,
            op: ComparisonOp::Eq,
            priority: Priority::Medium,
            sample_count: 0,
            is_falsified: false,
        };
        assert!(template.is_template());
        let concrete = template.subst(None, Some(r(50)), 4);
        assert!(!concrete.is_template());
        match concrete {
            Constraint::Constant { b, sample_count, .. } => {
                assert_eq!(b, Some(r(50)));
                assert_eq!(sample_count, 4);
            }
            _ => panic!("expected Constant"),
        }
    }

    #[test]
    fn mul_only_linear_is_template_until_a_bound() {
        let template = Constraint::Linear {
            kind: ConstraintKind::SizeAspectRatio,
            y: anchor("v", crate::Attribute::Width),
            x: anchor("v", crate::Attribute::Height),
            a: None,
            b: Some(r(0)),
            op: ComparisonOp::Eq,
            priority: Priority::Medium,
            sample_count: 0,
            is_falsified: false,
        };
        assert!(template.is_template());
        let bound = template.subst(Some(r(2)), None, 3);
        assert!(!bound.is_template());
    }

    #[test]
    fn wire_round_trip() {
        let c = Constraint::Linear {
            kind: ConstraintKind::PosLtrbOffset,
            y: anchor("child", crate::Attribute::Left),
            x: anchor("root", crate::Attribute::Left),
            a: Some(r(1)),
            b: Some(r(10)),
            op: ComparisonOp::Eq,
            priority: Priority::Required,
            sample_count: 4,
            is_falsified: false,
        };
        let wire = c.to_wire();
        let json = serde_json::to_string(&wire).unwrap();
        let back: ConstraintWire = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wire);
        assert_eq!(back.parse_op(), Some(ComparisonOp::Eq));
        assert_eq!(back.parse_a(), Some(r(1)));
        assert_eq!(back.parse_b(), Some(r(10)));
    }
}
