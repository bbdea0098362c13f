#![deny(missing_docs)]
//! Parameter learner: fits numeric `a`/`b` values onto template constraints
//! against a set of examples, producing zero or more scored, concrete
//! candidates per template.

/// Continued-fraction / Stern-Brocot / Farey helpers.
pub mod math;

use lss_core::{Candidate, Constraint, Error, Rational, Result, Views};
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Which of the three fitting strategies to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearningMethod {
    /// Accepts the exact rational observed in the first example; rejects on
    /// any mismatch in the rest.
    Simple,
    /// Like [`LearningMethod::Simple`], but clamps the fitted ratio to the
    /// nearest rational with denominator at most `max_denominator`.
    Heuristic,
    /// Searches a Stern-Brocot/Farey neighbourhood for the simplest rational
    /// consistent with every observation within `tolerance`.
    NoiseTolerant,
}

/// Tunables shared by all three learning strategies.
#[derive(Debug, Clone)]
pub struct LearnConfig {
    /// Maximum allowed deviation between a fitted value and any observation.
    pub tolerance: Rational,
    /// Denominator ceiling used by [`LearningMethod::Heuristic`]'s clamp and
    /// as the Farey order it searches.
    pub max_denominator: u64,
    /// Minimum number of examples required before a candidate is emitted.
    pub min_sample_count: u32,
    /// Reject fitted additive (`b`) values whose magnitude exceeds this
    /// bound; guards against degenerate offsets dominating the candidate
    /// pool.
    pub max_offset: Rational,
}

impl Default for LearnConfig {
    fn default() -> Self {
        Self {
            tolerance: Rational::new(BigInt::from(1), BigInt::from(1_000_000)),
            max_denominator: 64,
            min_sample_count: 1,
            max_offset: Rational::new(BigInt::from(1_000_000), BigInt::from(1)),
        }
    }
}

/// Learns concrete candidates for every template, in input order. The
/// returned outer `Vec` is parallel to `templates`; a template with no
/// consistent fit contributes an empty inner `Vec` rather than an error.
pub fn learn(
    templates: &[Constraint],
    samples: &[Views],
    config: &LearnConfig,
    method: LearningMethod,
) -> Result<Vec<Vec<Candidate>>> {
    templates.iter().map(|t| learn_one(t, samples, config, method)).collect()
}

fn observe(template: &Constraint, samples: &[Views]) -> Result<Vec<(Option<Rational>, Rational)>> {
    samples
        .iter()
        .map(|views| {
            let y = views.anchor_value(template.y()).ok_or_else(|| {
                Error::input("unknown_anchor", format!("anchor '{}' is not present in an example", template.y()))
            })?;
            let x = match template.x() {
                Some(x_id) => Some(views.anchor_value(x_id).ok_or_else(|| {
                    Error::input("unknown_anchor", format!("anchor '{x_id}' is not present in an example"))
                })?),
                None => None,
            };
            Ok((x, y))
        })
        .collect()
}

fn learn_one(template: &Constraint, samples: &[Views], config: &LearnConfig, method: LearningMethod) -> Result<Vec<Candidate>> {
    if samples.len() < config.min_sample_count as usize {
        return Ok(Vec::new());
    }
    let obs = observe(template, samples)?;
    let kind = template.kind();

    if kind.is_constant_form() {
        let values: Vec<Rational> = obs.iter().map(|(_, y)| y.clone()).collect();
        return Ok(fit(&values, config, method, false)
            .map(|(b, count)| {
                let constraint = template.subst(None, Some(b.clone()), count);
                vec![Candidate::new(constraint, score(&b, count))]
            })
            .unwrap_or_default());
    }

    if kind.is_add_only_form() {
        let values: Result<Vec<Rational>> = obs
            .iter()
            .map(|(x, y)| {
                let x = x.clone().ok_or_else(|| Error::geometry("missing_x_anchor", "add-only template is missing its x observation"))?;
                Ok(y - x)
            })
            .collect();
        let values = values?;
        return Ok(fit(&values, config, method, false)
            .filter(|(b, _)| b.abs() <= config.max_offset)
            .map(|(b, count)| {
                let constraint = template.subst(Some(Rational::one()), Some(b.clone()), count);
                vec![Candidate::new(constraint, score(&b, count))]
            })
            .unwrap_or_default());
    }

    if kind.is_mul_only_form() {
        let mut falsified = false;
        let mut values = Vec::with_capacity(obs.len());
        for (x, y) in &obs {
            let x = x
                .clone()
                .ok_or_else(|| Error::geometry("missing_x_anchor", "mul-only template is missing its x observation"))?;
            if x.is_zero() {
                falsified = true;
                break;
            }
            values.push(y / x);
        }
        if falsified {
            log::debug!("template {} falsified: division by zero while fitting ratio", template.y());
            return Ok(Vec::new());
        }
        return Ok(fit(&values, config, method, true)
            .map(|(a, count)| {
                let constraint = template.subst(Some(a.clone()), Some(Rational::zero()), count);
                vec![Candidate::new(constraint, score(&a, count))]
            })
            .unwrap_or_default());
    }

    Ok(fit_general(&obs, config, method)
        .map(|(a, b, count)| {
            let constraint = template.subst(Some(a.clone()), Some(b), count);
            vec![Candidate::new(constraint, score(&a, count))]
        })
        .unwrap_or_default())
}

/// Fits a single scalar value across observations per `method`, returning
/// `(value, sample_count)`. `clampable` marks the multiplicative (`a`)
/// parameters the heuristic learner is allowed to round.
fn fit(values: &[Rational], config: &LearnConfig, method: LearningMethod, clampable: bool) -> Option<(Rational, u32)> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as u32;
    match method {
        LearningMethod::Simple => {
            let candidate = values[0].clone();
            all_within(values, &candidate, &config.tolerance).then_some((candidate, count))
        }
        LearningMethod::Heuristic => {
            let candidate = values[0].clone();
            if !all_within(values, &candidate, &config.tolerance) {
                return None;
            }
            let clamped = if clampable {
                math::nearest_in_farey(&candidate, config.max_denominator)
            } else {
                candidate
            };
            Some((clamped, count))
        }
        LearningMethod::NoiseTolerant => {
            let lo = values.iter().max_by(|a, b| a.partial_cmp(b).unwrap())?.clone() - &config.tolerance;
            let hi = values.iter().min_by(|a, b| a.partial_cmp(b).unwrap())?.clone() + &config.tolerance;
            if lo > hi {
                return None;
            }
            Some((math::simplest_rational_in_range(&lo, &hi), count))
        }
    }
}

fn all_within(values: &[Rational], center: &Rational, tolerance: &Rational) -> bool {
    values.iter().all(|v| (v - center).abs() <= *tolerance)
}

/// General form `y = a*x + b`: requires two observations with distinct `x`
/// to solve exactly, then verifies the remainder within tolerance. No
/// template emitted by the instantiator currently has this shape; kept so
/// the taxonomy's general-form bit has a working fit path.
fn fit_general(obs: &[(Option<Rational>, Rational)], config: &LearnConfig, method: LearningMethod) -> Option<(Rational, Rational, u32)> {
    let xs: Vec<(Rational, Rational)> = obs
        .iter()
        .filter_map(|(x, y)| x.clone().map(|x| (x, y.clone())))
        .collect();
    let (x1, y1) = xs.first()?.clone();
    let (x2, y2) = xs.iter().find(|(x, _)| *x != x1)?.clone();

    let a = (&y1 - &y2) / (&x1 - &x2);
    let b = &y1 - &a * &x1;

    let consistent = xs.iter().all(|(x, y)| ((&a * x + &b) - y).abs() <= config.tolerance);
    if !consistent {
        return None;
    }

    let a = if method == LearningMethod::Heuristic {
        math::nearest_in_farey(&a, config.max_denominator)
    } else {
        a
    };
    Some((a, b, xs.len() as u32))
}

fn score(value: &Rational, sample_count: u32) -> f64 {
    let depth = math::sb_depth(value).to_f64().unwrap_or(f64::MAX);
    let irr = math::irrationality(value) as f64;
    let base = 1.0 / (1.0 + depth.abs() + irr);
    base + 0.1 * sample_count as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use lss_core::{Attribute, ConstraintKind, Priority, Rect, ViewSpec};
    use num_bigint::BigInt;

    fn r(n: i64) -> Rational {
        Rational::from_integer(BigInt::from(n))
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

    fn template(kind: ConstraintKind, y: (&str, Attribute), x: Option<(&str, Attribute)>) -> Constraint {
        match x {
            None => Constraint::Constant {
                kind,
                y: lss_core::AnchorId::new(y.0, y.1),
                b: None,
                op: lss_core::ComparisonOp::Eq,
                priority: Priority::Medium,
                sample_count: 0,
                is_falsified: false,
            },
            Some(x) => Constraint::Linear {
                kind,
                y: lss_core::AnchorId::new(y.0, y.1),
                x: lss_core::AnchorId::new(x.0, x.1),
                a: if kind.is_mul_only_form() { None } else { Some(r(1)) },
                b: if kind.is_mul_only_form() { Some(r(0)) } else { None },
                op: lss_core::ComparisonOp::Eq,
                priority: Priority::Medium,
                sample_count: 0,
                is_falsified: false,
            },
        }
    }

    #[test]
    fn learns_constant_width_across_examples() {
        let samples = vec![fixed_child(100, 100), fixed_child(200, 100), fixed_child(300, 100)];
        let t = template(ConstraintKind::SizeConstant, ("child", Attribute::Width), None);
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &samples, &cfg, LearningMethod::NoiseTolerant).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].len(), 1);
        match &candidates[0][0].constraint {
            Constraint::Constant { b: Some(b), sample_count, .. } => {
                assert_eq!(*b, r(50));
                assert_eq!(*sample_count, 3);
            }
            _ => panic!("expected concrete Constant"),
        }
    }

    #[test]
    fn learns_offset_with_consistent_additive_term() {
        let samples = vec![fixed_child(100, 100), fixed_child(200, 100)];
        let t = template(
            ConstraintKind::PosLtrbOffset,
            ("child", Attribute::Left),
            Some(("root", Attribute::Left)),
        );
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &samples, &cfg, LearningMethod::Simple).unwrap();
        match &candidates[0][0].constraint {
            Constraint::Linear { a, b, .. } => {
                assert_eq!(*a, Some(r(1)));
                assert_eq!(*b, Some(r(10)));
            }
            _ => panic!("expected concrete Linear"),
        }
    }

    #[test]
    fn rejects_inconsistent_constant_across_examples() {
        let divergent = Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 100, 100),
            children: vec![ViewSpec {
                name: "child".into(),
                rect: rect(10, 10, 70, 60),
                children: vec![],
            }],
        })
        .unwrap();
        let samples = vec![fixed_child(100, 100), divergent];
        let t = template(ConstraintKind::SizeConstant, ("child", Attribute::Width), None);
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &samples, &cfg, LearningMethod::Simple).unwrap();
        assert!(candidates[0].is_empty());
    }

    #[test]
    fn mul_only_falsifies_on_zero_denominator() {
        let zero_width = Views::build(ViewSpec {
            name: "v".into(),
            rect: rect(0, 0, 0, 50),
            children: vec![],
        })
        .unwrap();
        let t = template(ConstraintKind::SizeAspectRatio, ("v", Attribute::Height), Some(("v", Attribute::Width)));
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &[zero_width], &cfg, LearningMethod::NoiseTolerant).unwrap();
        assert!(candidates[0].is_empty());
    }

    #[test]
    fn heuristic_clamps_aspect_ratio_to_simple_rational() {
        let samples = vec![
            Views::build(ViewSpec {
                name: "v".into(),
                rect: rect(0, 0, 120, 90),
                children: vec![],
            })
            .unwrap(),
            Views::build(ViewSpec {
                name: "v".into(),
                rect: rect(0, 0, 80, 60),
                children: vec![],
            })
            .unwrap(),
        ];
        let t = template(ConstraintKind::SizeAspectRatio, ("v", Attribute::Width), Some(("v", Attribute::Height)));
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &samples, &cfg, LearningMethod::Heuristic).unwrap();
        match &candidates[0][0].constraint {
            Constraint::Linear { a: Some(a), .. } => assert_eq!(*a, Rational::new(BigInt::from(4), BigInt::from(3))),
            _ => panic!("expected a concrete aspect ratio"),
        }
    }

    #[test]
    fn candidate_soundness_within_tolerance() {
        let samples = vec![fixed_child(100, 100), fixed_child(150, 100)];
        let t = template(ConstraintKind::SizeConstant, ("child", Attribute::Height), None);
        let cfg = LearnConfig::default();
        let candidates = learn(&[t], &samples, &cfg, LearningMethod::NoiseTolerant).unwrap();
        let b = match &candidates[0][0].constraint {
            Constraint::Constant { b: Some(b), .. } => b.clone(),
            _ => panic!(),
        };
        for views in &samples {
            let y = views.anchor_value(&lss_core::AnchorId::new("child", Attribute::Height)).unwrap();
            assert!((y - &b).abs() <= cfg.tolerance);
        }
    }
}
