#![deny(missing_docs)]
//! Template instantiator.
//!
//! Emits every candidate constraint *shape* justified by the geometric
//! topology of the examples, leaving `a`/`b` unbound where the learner
//! (`lss-learn`) is meant to fit them.

use std::collections::HashSet;

use lss_core::{attribute::is_dual_pair, ComparisonOp, Constraint, ConstraintKind, Priority, Result, Views};
use lss_visibility::Visibility;
use num_traits::{One, Zero};

/// Emits the full set of template constraints implied by `examples`'
/// geometry. Deterministic: iterates `(i, j)` lexicographically over the
/// reference anchor array.
pub fn instantiate(examples: &[Views]) -> Result<Vec<Constraint>> {
    let reference = examples
        .first()
        .ok_or_else(|| lss_core::Error::input("no_examples", "template instantiation requires at least one example"))?;
    for other in &examples[1..] {
        if !reference.is_isomorphic(other) {
            return Err(lss_core::Error::input(
                "non_isomorphic_examples",
                "all examples must share the same view tree shape and names",
            ));
        }
    }

    let visibility = Visibility::compute(examples)?;
    let anchors = visibility.anchors().to_vec();
    let n = anchors.len();

    let mut out: Vec<Constraint> = Vec::new();
    let mut seen: HashSet<(ConstraintKind, String, Option<String>)> = HashSet::new();
    let mut emit = |out: &mut Vec<Constraint>, c: Constraint| {
        let key = (c.kind(), c.y().to_string(), c.x().map(|x| x.to_string()));
        if seen.insert(key) {
            out.push(c);
        }
    };

    for i in 0..n {
        let view_i = reference.find_by_name(&anchors[i].view_name).expect("anchor view must exist");
        for j in 0..n {
            if i == j {
                continue;
            }
            let view_j = reference.find_by_name(&anchors[j].view_name).expect("anchor view must exist");
            let attr_i = anchors[i].attribute;
            let attr_j = anchors[j].attribute;

            let same_view = view_i == view_j;
            let parent_of = reference.is_parent_of(view_i, view_j);
            let sibling = reference.is_sibling_of(view_i, view_j);
            let both_size = attr_i.is_size() && attr_j.is_size();
            let both_position = attr_i.is_position() && attr_j.is_position();
            let both_h = attr_i.is_horizontal() && attr_j.is_horizontal();
            let both_v = attr_i.is_vertical() && attr_j.is_vertical();
            let one_h_one_v = attr_i.is_horizontal() && attr_j.is_vertical();
            let same_attr = attr_i == attr_j;
            let dual = is_dual_pair(attr_i, attr_j);
            let anchor_visible = visibility.is_visible(i, j);

            // Aspect ratio: same view, one size attribute expressed via the
            // orthogonal one (width vs height).
            if same_view && both_size && one_h_one_v {
                emit(
                    &mut out,
                    Constraint::Linear {
                        kind: ConstraintKind::SizeAspectRatio,
                        y: anchors[i].clone(),
                        x: anchors[j].clone(),
                        a: None,
                        b: Some(Zero::zero()),
                        op: ComparisonOp::Eq,
                        priority: Priority::Medium,
                        sample_count: 0,
                        is_falsified: false,
                    },
                );
            }

            // Parent-relative size: child.size = a * parent.size, same axis.
            if parent_of && both_size && (both_h || both_v) {
                emit(
                    &mut out,
                    Constraint::Linear {
                        kind: ConstraintKind::SizeRatio,
                        y: anchors[j].clone(),
                        x: anchors[i].clone(),
                        a: None,
                        b: Some(Zero::zero()),
                        op: ComparisonOp::Eq,
                        priority: Priority::Medium,
                        sample_count: 0,
                        is_falsified: false,
                    },
                );
            }

            // Offset: parent/child same attribute, or mutually-visible
            // sibling dual pair (e.g. left sibling's right edge to right
            // sibling's left edge).
            let offset = (parent_of && both_position && same_attr && anchor_visible)
                || (sibling && both_position && dual && anchor_visible);

            // Alignment: siblings sharing an attribute, promoted via
            // view-level visibility on the orthogonal axis.
            let alignment = sibling
                && both_position
                && same_attr
                && ((both_h && visibility.is_view_visible_v(&anchors[i].view_name, &anchors[j].view_name))
                    || (both_v && visibility.is_view_visible_h(&anchors[i].view_name, &anchors[j].view_name)));

            if offset {
                emit(
                    &mut out,
                    Constraint::Linear {
                        kind: ConstraintKind::PosLtrbOffset,
                        y: anchors[i].clone(),
                        x: anchors[j].clone(),
                        a: Some(One::one()),
                        b: None,
                        op: ComparisonOp::Eq,
                        priority: Priority::Medium,
                        sample_count: 0,
                        is_falsified: false,
                    },
                );
            } else if alignment {
                emit(
                    &mut out,
                    Constraint::Linear {
                        kind: ConstraintKind::PosAlignment,
                        y: anchors[i].clone(),
                        x: anchors[j].clone(),
                        a: Some(One::one()),
                        b: None,
                        op: ComparisonOp::Eq,
                        priority: Priority::Medium,
                        sample_count: 0,
                        is_falsified: false,
                    },
                );
            }
        }
    }

    for anchor in &anchors {
        if anchor.attribute.is_size() {
            emit(
                &mut out,
                Constraint::Constant {
                    kind: ConstraintKind::SizeConstant,
                    y: anchor.clone(),
                    b: None,
                    op: ComparisonOp::Eq,
                    priority: Priority::Medium,
                    sample_count: 0,
                    is_falsified: false,
                },
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lss_core::{Attribute, Rect, ViewSpec};
    use num_bigint::BigInt;

    fn r(n: i64) -> lss_core::Rational {
        lss_core::Rational::from_integer(BigInt::from(n))
    }

    fn rect(l: i64, t: i64, rr: i64, b: i64) -> Rect {
        Rect::new(r(l), r(t), r(rr), r(b))
    }

    fn fixed_child(root_w: i64, root_h: i64) -> Views {
        Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, root_w, root_h),
            children: vec![ViewSpec {
                name: "child".into(),
                rect: rect(10, 10, 60, 60),
                children: vec![],
            }],
        })
        .unwrap()
    }

    #[test]
    fn emits_constant_and_offset_templates_for_fixed_child() {
        let examples = vec![fixed_child(100, 100), fixed_child(200, 100), fixed_child(300, 100)];
        let templates = instantiate(&examples).unwrap();

        let has_constant = |name: &str, attr: Attribute| {
            templates.iter().any(|c| {
                matches!(c, Constraint::Constant { kind: ConstraintKind::SizeConstant, y, .. }
                    if y.view_name == name && y.attribute == attr)
            })
        };
        assert!(has_constant("child", Attribute::Width));
        assert!(has_constant("child", Attribute::Height));

        let has_offset = |y_name: &str, y_attr: Attribute, x_name: &str, x_attr: Attribute| {
            templates.iter().any(|c| {
                matches!(c, Constraint::Linear { kind: ConstraintKind::PosLtrbOffset, y, x, .. }
                    if y.view_name == y_name && y.attribute == y_attr && x.view_name == x_name && x.attribute == x_attr)
            })
        };
        assert!(has_offset("child", Attribute::Left, "root", Attribute::Left));
        assert!(has_offset("child", Attribute::Top, "root", Attribute::Top));
    }

    #[test]
    fn every_linear_template_respects_axis_purity() {
        let examples = vec![fixed_child(100, 100), fixed_child(200, 150)];
        let templates = instantiate(&examples).unwrap();
        for c in &templates {
            if let Constraint::Linear { y, x, .. } = c {
                assert_eq!(y.attribute.is_horizontal(), x.attribute.is_horizontal());
            }
        }
    }

    #[test]
    fn instantiate_is_deterministic() {
        let examples = vec![fixed_child(100, 100), fixed_child(200, 100)];
        let a = instantiate(&examples).unwrap();
        let b = instantiate(&examples).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn two_stacked_siblings_get_offset_and_alignment() {
        let views = Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 100, 100),
            children: vec![
                ViewSpec {
                    name: "top".into(),
                    rect: rect(0, 0, 100, 40),
                    children: vec![],
                },
                ViewSpec {
                    name: "bottom".into(),
                    rect: rect(0, 50, 100, 100),
                    children: vec![],
                },
            ],
        })
        .unwrap();
        let templates = instantiate(std::slice::from_ref(&views)).unwrap();

        let has = |kind: ConstraintKind, y_name: &str, y_attr: Attribute, x_name: &str, x_attr: Attribute| {
            templates.iter().any(|c| match c {
                Constraint::Linear { kind: k, y, x, .. } => {
                    *k == kind && y.view_name == y_name && y.attribute == y_attr && x.view_name == x_name && x.attribute == x_attr
                }
                _ => false,
            })
        };
        assert!(has(
            ConstraintKind::PosLtrbOffset,
            "bottom",
            Attribute::Top,
            "top",
            Attribute::Bottom,
        ));
        assert!(has(
            ConstraintKind::PosAlignment,
            "bottom",
            Attribute::Left,
            "top",
            Attribute::Left,
        ));
    }

    #[test]
    fn rejects_non_isomorphic_examples() {
        let a = fixed_child(100, 100);
        let b = Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 100, 100),
            children: vec![],
        })
        .unwrap();
        assert!(instantiate(&[a, b]).is_err());
    }
}
