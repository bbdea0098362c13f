#![deny(missing_docs)]
//! Max-SMT pruner driver, built on the `z3` crate.
//!
//! Selects a subset of scored candidates that is jointly satisfiable with
//! the layout axioms over a range of conformances, maximizing total
//! candidate score, and optionally refining the selection until every
//! non-focus anchor is pinned to a unique rational value (CEGIS
//! unambiguity loop).

use std::collections::{BTreeMap, HashMap};

use lss_core::{
    Attribute, Candidate, ComparisonOp, Conformance, ConflictReport, Constraint, ConstraintKind,
    Error, Priority, Rational, Result, ViewId, Views,
};
use num_bigint::BigInt;
use z3::ast::{Ast, Bool, Real};
use z3::{Config, Context, Model, Optimize, SatResult};

/// Which attribute family a constraint or solve instance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// `{left, right, center_x, width}`.
    Horizontal,
    /// `{top, bottom, center_y, height}`.
    Vertical,
}

impl Axis {
    fn attrs(self) -> [Attribute; 4] {
        match self {
            Axis::Horizontal => [Attribute::Left, Attribute::Right, Attribute::CenterX, Attribute::Width],
            Axis::Vertical => [Attribute::Top, Attribute::Bottom, Attribute::CenterY, Attribute::Height],
        }
    }

    fn name(self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

/// Tunables for a single pruning call.
#[derive(Debug, Clone)]
pub struct PruneConfig {
    /// Enable the CEGIS refinement loop that rejects ambiguous placements.
    pub unambig: bool,
    /// Enable the "at most two of four anchors constrained" determinism
    /// clauses. Only meaningful alongside `unambig`.
    pub determinism: bool,
    /// Iteration cap for the CEGIS loop before giving up.
    pub ambiguity_iteration_cap: u32,
    /// `|b1 - b2| < tolerance` threshold used by the post-pass that folds a
    /// `<=`/`>=` pair on the same anchor into a single `=` constraint.
    pub combine_bounds_tolerance: Rational,
    /// Number of conformances sampled from the `(lo, hi)` range: 2
    /// (endpoints only) or 3 (endpoints + midpoint).
    pub conformance_samples: usize,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            unambig: false,
            determinism: true,
            ambiguity_iteration_cap: 32,
            combine_bounds_tolerance: Rational::new(BigInt::from(5), BigInt::from(1)),
            conformance_samples: 3,
        }
    }
}

/// A single pruning request: the candidates to choose among, the subtree
/// this call is responsible for (`focus` plus its direct children), and
/// the conformance range to solve over.
pub struct PruneRequest<'a> {
    /// Reference tree used only for its shape (parent/child relationships,
    /// view names). Any one of the isomorphic examples works.
    pub views: &'a Views,
    /// The view whose direct children are being placed.
    pub focus: ViewId,
    /// Candidates already filtered to only mention anchors of `focus` or
    /// its direct children.
    pub candidates: &'a [Candidate],
    /// Conformance at the low end of the sampled range.
    pub lo: Conformance,
    /// Conformance at the high end of the sampled range.
    pub hi: Conformance,
}

/// Result of pruning one subtree: the selected constraints plus the
/// anchor valuations observed at the low/high conformances.
#[derive(Debug, Clone, Default)]
pub struct PruneOutput {
    /// The pruned, jointly satisfiable constraint subset.
    pub selected: Vec<Constraint>,
    /// `"view.attr"` -> value at the low conformance.
    pub min_vals: BTreeMap<String, Rational>,
    /// `"view.attr"` -> value at the high conformance.
    pub max_vals: BTreeMap<String, Rational>,
}

/// Runs the Max-SMT pruner on one subtree, splitting horizontal and
/// vertical candidates into two independent instances.
pub fn prune(request: &PruneRequest, config: &PruneConfig) -> Result<PruneOutput> {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for candidate in request.candidates {
        match constraint_axis(&candidate.constraint)? {
            Axis::Horizontal => horizontal.push(candidate),
            Axis::Vertical => vertical.push(candidate),
        }
    }

    let h_out = solve_axis(Axis::Horizontal, &horizontal, request, config)?;
    let v_out = solve_axis(Axis::Vertical, &vertical, request, config)?;

    let mut selected = h_out.selected;
    selected.extend(v_out.selected);
    selected = combine_bounds(&selected, &config.combine_bounds_tolerance);

    let mut min_vals = h_out.min_vals;
    min_vals.extend(v_out.min_vals);
    let mut max_vals = h_out.max_vals;
    max_vals.extend(v_out.max_vals);

    Ok(PruneOutput { selected, min_vals, max_vals })
}

fn constraint_axis(c: &Constraint) -> Result<Axis> {
    let y_h = c.y().attribute.is_horizontal();
    if let Some(x) = c.x() {
        if x.attribute.is_horizontal() != y_h {
            return Err(Error::geometry(
                "mixed_axis_constraint",
                format!("constraint on '{}' mixes horizontal and vertical anchors", c.y()),
            ));
        }
    }
    Ok(if y_h { Axis::Horizontal } else { Axis::Vertical })
}

fn sample_conformances(lo: &Conformance, hi: &Conformance, count: usize) -> Vec<Conformance> {
    if count <= 1 {
        return vec![lo.clone()];
    }
    if count == 2 {
        return vec![lo.clone(), hi.clone()];
    }
    let two = Rational::new(BigInt::from(2), BigInt::from(1));
    let mid = Conformance::new(
        (&lo.w + &hi.w) / &two,
        (&lo.h + &hi.h) / &two,
        (&lo.x + &hi.x) / &two,
        (&lo.y + &hi.y) / &two,
    );
    vec![lo.clone(), mid, hi.clone()]
}

fn rational_to_real<'ctx>(ctx: &'ctx Context, r: &Rational) -> Real<'ctx> {
    Real::from_real_str(ctx, &r.numer().to_string(), &r.denom().to_string())
        .expect("rational numerator/denominator must be valid integer literals")
}

fn real_to_rational(value: &Real<'_>) -> Option<Rational> {
    let (num, den) = value.as_real()?;
    Some(Rational::new(BigInt::from(num), BigInt::from(den)))
}

type VarKey = (String, Attribute, usize);

struct AxisVars<'ctx> {
    vars: HashMap<VarKey, Real<'ctx>>,
}

impl<'ctx> AxisVars<'ctx> {
    fn get(&self, view: &str, attr: Attribute, idx: usize) -> &Real<'ctx> {
        self.vars
            .get(&(view.to_string(), attr, idx))
            .unwrap_or_else(|| panic!("no variable for {view}.{attr}#{idx}"))
    }
}

fn build_vars<'ctx>(ctx: &'ctx Context, views: &[String], axis: Axis, n_conformances: usize) -> AxisVars<'ctx> {
    let mut vars = HashMap::new();
    for view in views {
        for attr in axis.attrs() {
            for idx in 0..n_conformances {
                let name = format!("{view}.{attr}#{idx}");
                vars.insert((view.clone(), attr, idx), Real::new_const(ctx, name));
            }
        }
    }
    AxisVars { vars }
}

fn assert_axioms<'ctx>(ctx: &'ctx Context, opt: &Optimize<'ctx>, vars: &AxisVars<'ctx>, view: &str, axis: Axis, n: usize) {
    let two = rational_to_real(ctx, &Rational::new(BigInt::from(2), BigInt::from(1)));
    let zero = rational_to_real(ctx, &Rational::new(BigInt::from(0), BigInt::from(1)));
    for idx in 0..n {
        match axis {
            Axis::Horizontal => {
                let left = vars.get(view, Attribute::Left, idx);
                let right = vars.get(view, Attribute::Right, idx);
                let center = vars.get(view, Attribute::CenterX, idx);
                let width = vars.get(view, Attribute::Width, idx);
                opt.assert(&width._eq(&Real::sub(ctx, &[right, left])));
                opt.assert(&Real::mul(ctx, &[center, &two])._eq(&Real::add(ctx, &[left, right])));
                opt.assert(&left.ge(&zero));
                opt.assert(&right.ge(&zero));
            }
            Axis::Vertical => {
                let top = vars.get(view, Attribute::Top, idx);
                let bottom = vars.get(view, Attribute::Bottom, idx);
                let center = vars.get(view, Attribute::CenterY, idx);
                let height = vars.get(view, Attribute::Height, idx);
                opt.assert(&height._eq(&Real::sub(ctx, &[bottom, top])));
                opt.assert(&Real::mul(ctx, &[center, &two])._eq(&Real::add(ctx, &[top, bottom])));
                opt.assert(&top.ge(&zero));
                opt.assert(&bottom.ge(&zero));
            }
        }
    }
}

fn assert_containment<'ctx>(opt: &Optimize<'ctx>, vars: &AxisVars<'ctx>, parent: &str, child: &str, axis: Axis, n: usize) {
    for idx in 0..n {
        match axis {
            Axis::Horizontal => {
                let p_left = vars.get(parent, Attribute::Left, idx);
                let p_right = vars.get(parent, Attribute::Right, idx);
                let c_left = vars.get(child, Attribute::Left, idx);
                let c_right = vars.get(child, Attribute::Right, idx);
                opt.assert(&p_left.le(c_left));
                opt.assert(&c_right.le(p_right));
            }
            Axis::Vertical => {
                let p_top = vars.get(parent, Attribute::Top, idx);
                let p_bottom = vars.get(parent, Attribute::Bottom, idx);
                let c_top = vars.get(child, Attribute::Top, idx);
                let c_bottom = vars.get(child, Attribute::Bottom, idx);
                opt.assert(&p_top.le(c_top));
                opt.assert(&c_bottom.le(p_bottom));
            }
        }
    }
}

fn pin_focus<'ctx>(ctx: &'ctx Context, opt: &Optimize<'ctx>, vars: &AxisVars<'ctx>, focus: &str, axis: Axis, conformances: &[Conformance]) {
    for (idx, conformance) in conformances.iter().enumerate() {
        match axis {
            Axis::Horizontal => {
                let x = rational_to_real(ctx, &conformance.x);
                let w = rational_to_real(ctx, &conformance.w);
                opt.assert(&vars.get(focus, Attribute::Left, idx)._eq(&x));
                opt.assert(&vars.get(focus, Attribute::Right, idx)._eq(&Real::add(ctx, &[&x, &w])));
            }
            Axis::Vertical => {
                let y = rational_to_real(ctx, &conformance.y);
                let h = rational_to_real(ctx, &conformance.h);
                opt.assert(&vars.get(focus, Attribute::Top, idx)._eq(&y));
                opt.assert(&vars.get(focus, Attribute::Bottom, idx)._eq(&Real::add(ctx, &[&y, &h])));
            }
        }
    }
}

fn constraint_equation<'ctx>(ctx: &'ctx Context, vars: &AxisVars<'ctx>, constraint: &Constraint, idx: usize) -> Bool<'ctx> {
    let op = constraint.op();
    match constraint {
        Constraint::Constant { y, b, .. } => {
            let b = b.as_ref().expect("constant candidate must be concretized before solving");
            let lhs = vars.get(&y.view_name, y.attribute, idx);
            let rhs = rational_to_real(ctx, b);
            compare(op, lhs, &rhs)
        }
        Constraint::Linear { y, x, a, b, .. } => {
            let a = a.clone().unwrap_or_else(num_traits::One::one);
            let b = b.clone().unwrap_or_else(num_traits::Zero::zero);
            let lhs = vars.get(&y.view_name, y.attribute, idx);
            let x_var = vars.get(&x.view_name, x.attribute, idx);
            let a_real = rational_to_real(ctx, &a);
            let b_real = rational_to_real(ctx, &b);
            let rhs = Real::add(ctx, &[&Real::mul(ctx, &[&a_real, x_var]), &b_real]);
            compare(op, lhs, &rhs)
        }
    }
}

fn compare<'ctx>(op: ComparisonOp, lhs: &Real<'ctx>, rhs: &Real<'ctx>) -> Bool<'ctx> {
    match op {
        ComparisonOp::Eq => lhs._eq(rhs),
        ComparisonOp::Le => lhs.le(rhs),
        ComparisonOp::Ge => lhs.ge(rhs),
    }
}

fn is_parent_relative(constraint: &Constraint, focus_name: &str) -> bool {
    match constraint.kind() {
        ConstraintKind::SizeRatio => true,
        ConstraintKind::PosLtrbOffset => constraint.x().map(|x| x.view_name == focus_name).unwrap_or(false),
        _ => false,
    }
}

fn priority_multiplier(priority: Priority) -> f64 {
    match priority {
        Priority::Weak => 1.0,
        Priority::Medium => 2.0,
        Priority::Strong => 5.0,
        Priority::Required => 50.0,
    }
}

fn soft_weight(candidates: &[&Candidate], index: usize, focus_name: &str, unambig: bool) -> f64 {
    let s_min = candidates.iter().map(|c| c.score).fold(f64::MAX, f64::min).max(1e-6);
    let candidate = candidates[index];
    let mut weight = candidate.score / s_min + 1e-3;
    weight *= priority_multiplier(candidate.constraint.priority());
    if unambig && is_parent_relative(&candidate.constraint, focus_name) {
        weight *= 10.0;
    }
    weight
}

/// Bool indicator that is true iff any of `selectors` at `indices` is true.
fn at_most_two<'ctx>(ctx: &'ctx Context, opt: &Optimize<'ctx>, groups: &[Vec<Bool<'ctx>>]) {
    let zero = rational_to_real(ctx, &Rational::new(BigInt::from(0), BigInt::from(1)));
    let one = rational_to_real(ctx, &Rational::new(BigInt::from(1), BigInt::from(1)));
    let two = rational_to_real(ctx, &Rational::new(BigInt::from(2), BigInt::from(1)));
    let mut terms = Vec::new();
    for group in groups {
        if group.is_empty() {
            continue;
        }
        let any = if group.len() == 1 {
            group[0].clone()
        } else {
            Bool::or(ctx, &group.iter().collect::<Vec<_>>())
        };
        terms.push(any.ite(&one, &zero));
    }
    if terms.is_empty() {
        return;
    }
    let refs: Vec<&Real> = terms.iter().collect();
    opt.assert(&Real::add(ctx, &refs).le(&two));
}

fn at_most_one<'ctx>(ctx: &'ctx Context, opt: &Optimize<'ctx>, selectors: &[Bool<'ctx>]) {
    if selectors.len() < 2 {
        return;
    }
    let zero = rational_to_real(ctx, &Rational::new(BigInt::from(0), BigInt::from(1)));
    let one = rational_to_real(ctx, &Rational::new(BigInt::from(1), BigInt::from(1)));
    let terms: Vec<Real> = selectors.iter().map(|b| b.ite(&one, &zero)).collect();
    let refs: Vec<&Real> = terms.iter().collect();
    opt.assert(&Real::add(ctx, &refs).le(&one));
}

struct AxisOutput {
    selected: Vec<Constraint>,
    min_vals: BTreeMap<String, Rational>,
    max_vals: BTreeMap<String, Rational>,
}

fn solve_axis(axis: Axis, candidates: &[&Candidate], request: &PruneRequest, config: &PruneConfig) -> Result<AxisOutput> {
    let focus_name = request.views.name(request.focus).to_string();
    let children: Vec<String> = request
        .views
        .children(request.focus)
        .iter()
        .map(|&c| request.views.name(c).to_string())
        .collect();
    let all_views: Vec<String> = std::iter::once(focus_name.clone()).chain(children.iter().cloned()).collect();

    let conformances = sample_conformances(&request.lo, &request.hi, config.conformance_samples);
    let n = conformances.len();

    log::debug!(
        "solving {} axis for focus '{}' with {} candidates over {} conformances",
        axis.name(),
        focus_name,
        candidates.len(),
        n
    );

    if candidates.is_empty() && children.is_empty() {
        return Ok(AxisOutput { selected: Vec::new(), min_vals: BTreeMap::new(), max_vals: BTreeMap::new() });
    }

    let z3_config = Config::new();
    let ctx = Context::new(&z3_config);
    let opt = Optimize::new(&ctx);
    let vars = build_vars(&ctx, &all_views, axis, n);

    for view in &all_views {
        assert_axioms(&ctx, &opt, &vars, view, axis, n);
    }
    for child in &children {
        assert_containment(&opt, &vars, &focus_name, child, axis, n);
    }
    pin_focus(&ctx, &opt, &vars, &focus_name, axis, &conformances);

    let mut selectors: Vec<Bool> = Vec::with_capacity(candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let selector = Bool::new_const(&ctx, format!("sel_{}_{i}", axis.name()));
        for idx in 0..n {
            let equation = constraint_equation(&ctx, &vars, &candidate.constraint, idx);
            opt.assert(&selector.implies(&equation));
        }
        if candidate.constraint.priority() == Priority::Required {
            opt.assert(&selector);
        }
        let weight = soft_weight(candidates, i, &focus_name, config.unambig);
        opt.assert_soft(&selector, weight, None);
        selectors.push(selector);
    }

    if config.determinism {
        for child in &children {
            let mut by_attr: Vec<Vec<Bool>> = axis
                .attrs()
                .iter()
                .map(|&attr| {
                    selectors
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| candidates[*i].constraint.y().view_name == *child && candidates[*i].constraint.y().attribute == attr)
                        .map(|(_, s)| s.clone())
                        .collect()
                })
                .collect();
            at_most_two(&ctx, &opt, &by_attr);
            for group in by_attr.drain(..) {
                at_most_one(&ctx, &opt, &group);
            }
        }
    }

    match opt.check(&[]) {
        SatResult::Unsat => {
            log::warn!("{} axis is infeasible for focus '{}'; dumping conflict", axis.name(), focus_name);
            return Err(Error::Infeasible(
                lss_core::ErrorInfo::new("smt_infeasible", format!("no jointly satisfiable subset for the {} axis", axis.name()))
                    .with_context("focus_view", &focus_name),
                ConflictReport {
                    focus_view: focus_name.clone(),
                    axis: axis.name().to_string(),
                    conflicting_constraints: candidates.iter().map(|c| format!("{:?}", c.constraint)).collect(),
                },
            ));
        }
        SatResult::Unknown => {
            log::warn!("z3 returned unknown on the {} axis for focus '{}'", axis.name(), focus_name);
            return Err(Error::Solver(lss_core::ErrorInfo::new(
                "smt_unknown",
                format!("z3 returned unknown on the {} axis", axis.name()),
            )));
        }
        SatResult::Sat => {}
    }

    let assignment = if config.unambig {
        cegis_refine(&ctx, &opt, &vars, &selectors, candidates, &focus_name, &children, axis, &conformances, config.ambiguity_iteration_cap)?
    } else {
        let model = opt.get_model().expect("sat check must produce a model");
        read_assignment(&model, &selectors)
    };

    let model = opt.get_model().expect("final check must produce a model");
    let selected: Vec<Constraint> = candidates
        .iter()
        .zip(assignment.iter())
        .filter(|(_, &on)| on)
        .map(|(c, _)| c.constraint.clone())
        .collect();

    let min_vals = read_anchor_values(&model, &vars, &all_views, axis, 0);
    let max_vals = read_anchor_values(&model, &vars, &all_views, axis, n - 1);

    Ok(AxisOutput { selected, min_vals, max_vals })
}

fn read_assignment(model: &Model<'_>, selectors: &[Bool]) -> Vec<bool> {
    selectors
        .iter()
        .map(|s| model.eval(s, true).and_then(|v| v.as_bool()).unwrap_or(false))
        .collect()
}

fn read_anchor_values(model: &Model<'_>, vars: &AxisVars<'_>, views: &[String], axis: Axis, idx: usize) -> BTreeMap<String, Rational> {
    let mut out = BTreeMap::new();
    for view in views {
        for attr in axis.attrs() {
            let var = vars.get(view, attr, idx);
            if let Some(value) = model.eval(var, true).as_ref().and_then(real_to_rational) {
                out.insert(format!("{view}.{attr}"), value);
            }
        }
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn cegis_refine<'ctx>(
    ctx: &'ctx Context,
    opt: &Optimize<'ctx>,
    vars: &AxisVars<'ctx>,
    selectors: &[Bool<'ctx>],
    candidates: &[&Candidate],
    focus_name: &str,
    children: &[String],
    axis: Axis,
    conformances: &[Conformance],
    iteration_cap: u32,
) -> Result<Vec<bool>> {
    let mid_idx = conformances.len() / 2;
    let mut iterations = 0;

    loop {
        let model = opt.get_model().expect("sat check must produce a model");
        let assignment = read_assignment(&model, selectors);

        let unique = probe_uniqueness(ctx, vars, candidates, &assignment, focus_name, children, axis, &conformances[mid_idx], mid_idx);
        if unique {
            return Ok(assignment);
        }

        iterations += 1;
        log::debug!(
            "CEGIS iteration {} on the {} axis for focus '{}' was ambiguous; adding a blocking clause",
            iterations,
            axis.name(),
            focus_name
        );
        if iterations > iteration_cap {
            log::warn!(
                "CEGIS did not converge within {} iterations on the {} axis for focus '{}'",
                iteration_cap,
                axis.name(),
                focus_name
            );
            return Err(Error::AmbiguityLimit(lss_core::ErrorInfo::new(
                "ambiguity_limit_exceeded",
                format!("CEGIS did not converge within {iteration_cap} iterations on the {} axis", axis.name()),
            )));
        }

        let true_selectors: Vec<&Bool> = selectors.iter().zip(assignment.iter()).filter(|(_, &on)| on).map(|(s, _)| s).collect();
        if true_selectors.is_empty() {
            // No candidates selected at all: nothing to block, and no way
            // to converge further.
            return Ok(assignment);
        }
        let conjunction = Bool::and(ctx, &true_selectors);
        opt.assert(&conjunction.not());

        match opt.check(&[]) {
            SatResult::Sat => continue,
            SatResult::Unsat => {
                log::warn!(
                    "{} axis for focus '{}' became infeasible after blocking ambiguous selections",
                    axis.name(),
                    focus_name
                );
                return Err(Error::Infeasible(
                    lss_core::ErrorInfo::new("smt_infeasible_after_blocking", "no satisfiable assignment remains after blocking ambiguous selections")
                        .with_context("focus_view", focus_name),
                    ConflictReport {
                        focus_view: focus_name.to_string(),
                        axis: axis.name().to_string(),
                        conflicting_constraints: candidates.iter().map(|c| format!("{:?}", c.constraint)).collect(),
                    },
                ));
            }
            SatResult::Unknown => {
                log::warn!("z3 returned unknown during CEGIS refinement on the {} axis for focus '{}'", axis.name(), focus_name);
                return Err(Error::Solver(lss_core::ErrorInfo::new("smt_unknown", "z3 returned unknown during CEGIS refinement")));
            }
        }
    }
}

/// `true` iff the selected constraint subset pins every child anchor to a
/// unique rational value at `conformance`: builds a fresh solver asserting
/// the selected equations plus the negation of the current model's
/// assignment, and checks it is unsatisfiable.
#[allow(clippy::too_many_arguments)]
fn probe_uniqueness<'ctx>(
    ctx: &'ctx Context,
    vars: &AxisVars<'ctx>,
    candidates: &[&Candidate],
    assignment: &[bool],
    focus_name: &str,
    children: &[String],
    axis: Axis,
    conformance: &Conformance,
    idx: usize,
) -> bool {
    let probe = Optimize::new(ctx);
    for view in std::iter::once(&focus_name.to_string()).chain(children.iter()) {
        assert_axioms(ctx, &probe, vars, view, axis, idx + 1);
    }
    for child in children {
        assert_containment(&probe, vars, focus_name, child, axis, idx + 1);
    }
    pin_focus(ctx, &probe, vars, focus_name, axis, std::slice::from_ref(conformance));

    let mut reference_values: Vec<Real> = Vec::new();
    for (candidate, &on) in candidates.iter().zip(assignment.iter()) {
        if on {
            probe.assert(&constraint_equation(ctx, vars, &candidate.constraint, idx));
        }
    }

    for child in children {
        for attr in axis.attrs() {
            if attr.is_size() || matches!(attr, Attribute::CenterX | Attribute::CenterY) {
                // Derived attributes follow from the axioms; only the two
                // independent coordinates need an explicit difference check.
                continue;
            }
            reference_values.push(vars.get(child, attr, idx).clone());
        }
    }

    let model = match probe.check(&[]) {
        SatResult::Sat => probe.get_model(),
        _ => return true,
    };
    let Some(model) = model else { return true };

    let mut disjuncts = Vec::new();
    for var in &reference_values {
        if let Some(value) = model.eval(var, true).as_ref().and_then(real_to_rational) {
            let literal = rational_to_real(ctx, &value);
            disjuncts.push(var._eq(&literal).not());
        }
    }
    if disjuncts.is_empty() {
        return true;
    }
    let refs: Vec<&Bool> = disjuncts.iter().collect();
    probe.assert(&Bool::or(ctx, &refs));

    !matches!(probe.check(&[]), SatResult::Sat)
}

/// Folds a `<=`/`>=` pair on the same anchor (and, for linear constraints,
/// the same `x`) whose bounds differ by less than `tolerance` into a single
/// `=` constraint.
pub fn combine_bounds(constraints: &[Constraint], tolerance: &Rational) -> Vec<Constraint> {
    let mut out = Vec::with_capacity(constraints.len());
    let mut consumed = vec![false; constraints.len()];

    for i in 0..constraints.len() {
        if consumed[i] {
            continue;
        }
        let mut merged = false;
        for j in (i + 1)..constraints.len() {
            if consumed[j] {
                continue;
            }
            if let Some(combined) = try_combine(&constraints[i], &constraints[j], tolerance) {
                out.push(combined);
                consumed[i] = true;
                consumed[j] = true;
                merged = true;
                break;
            }
        }
        if !merged {
            out.push(constraints[i].clone());
        }
    }
    out
}

fn try_combine(a: &Constraint, b: &Constraint, tolerance: &Rational) -> Option<Constraint> {
    if a.y() != b.y() || a.x() != b.x() || a.kind() != b.kind() {
        return None;
    }
    let (le, ge) = match (a.op(), b.op()) {
        (ComparisonOp::Le, ComparisonOp::Ge) => (a, b),
        (ComparisonOp::Ge, ComparisonOp::Le) => (b, a),
        _ => return None,
    };
    let b1 = bound_of(le)?;
    let b2 = bound_of(ge)?;
    if (&b1 - &b2).abs() >= *tolerance {
        return None;
    }
    let mid = (&b1 + &b2) / Rational::new(BigInt::from(2), BigInt::from(1));
    Some(match le {
        Constraint::Constant { kind, y, priority, sample_count, is_falsified, .. } => Constraint::Constant {
            kind: *kind,
            y: y.clone(),
            b: Some(mid),
            op: ComparisonOp::Eq,
            priority: *priority,
            sample_count: *sample_count,
            is_falsified: *is_falsified,
        },
        Constraint::Linear { kind, y, x, a, priority, sample_count, is_falsified, .. } => Constraint::Linear {
            kind: *kind,
            y: y.clone(),
            x: x.clone(),
            a: a.clone(),
            b: Some(mid),
            op: ComparisonOp::Eq,
            priority: *priority,
            sample_count: *sample_count,
            is_falsified: *is_falsified,
        },
    })
}

fn bound_of(c: &Constraint) -> Option<Rational> {
    match c {
        Constraint::Constant { b, .. } => b.clone(),
        Constraint::Linear { b, .. } => b.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lss_core::{AnchorId, Rect, ViewSpec};
    use num_bigint::BigInt as BI;

    fn r(n: i64) -> Rational {
        Rational::from_integer(BI::from(n))
    }

    fn rect(l: i64, t: i64, rr: i64, b: i64) -> Rect {
        Rect::new(r(l), r(t), r(rr), r(b))
    }

    fn fixed_child_tree() -> Views {
        Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 100, 100),
            children: vec![ViewSpec {
                name: "child".into(),
                rect: rect(10, 10, 60, 60),
                children: vec![],
            }],
        })
        .unwrap()
    }

    fn const_candidate(view: &str, attr: Attribute, b: i64, score: f64) -> Candidate {
        Candidate::new(
            Constraint::Constant {
                kind: ConstraintKind::SizeConstant,
                y: AnchorId::new(view, attr),
                b: Some(r(b)),
                op: ComparisonOp::Eq,
                priority: Priority::Medium,
                sample_count: 2,
                is_falsified: false,
            },
            score,
        )
    }

    fn offset_candidate(y: (&str, Attribute), x: (&str, Attribute), b: i64, score: f64) -> Candidate {
        Candidate::new(
            Constraint::Linear {
                kind: ConstraintKind::PosLtrbOffset,
                y: AnchorId::new(y.0, y.1),
                x: AnchorId::new(x.0, x.1),
                a: Some(r(1)),
                b: Some(r(b)),
                op: ComparisonOp::Eq,
                priority: Priority::Medium,
                sample_count: 2,
                is_falsified: false,
            },
            score,
        )
    }

    #[test]
    fn solves_fixed_child_and_keeps_it_contained() {
        let views = fixed_child_tree();
        let candidates = vec![
            const_candidate("child", Attribute::Width, 50, 1.0),
            const_candidate("child", Attribute::Height, 50, 1.0),
            offset_candidate(("child", Attribute::Left), ("root", Attribute::Left), 10, 1.0),
            offset_candidate(("child", Attribute::Top), ("root", Attribute::Top), 10, 1.0),
        ];
        let request = PruneRequest {
            views: &views,
            focus: views.root(),
            candidates: &candidates,
            lo: Conformance::new(r(100), r(100), r(0), r(0)),
            hi: Conformance::new(r(300), r(100), r(0), r(0)),
        };
        let config = PruneConfig { unambig: false, ..Default::default() };
        let output = prune(&request, &config).unwrap();
        assert_eq!(output.selected.len(), 4);

        let left = &output.min_vals["child.left"];
        let right = &output.min_vals["child.right"];
        assert_eq!(*left, r(10));
        assert_eq!(*right, r(60));
    }

    #[test]
    fn infeasible_input_raises_infeasible_error() {
        let views = fixed_child_tree();
        let candidates = vec![
            const_candidate("child", Attribute::Width, 50, 1.0),
            const_candidate("child", Attribute::Width, 9999, 1.0),
        ];
        // Both constraints are required, so nothing may be pruned away and
        // the two conflicting widths cannot both hold.
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .map(|c| Candidate::new(c.constraint.with_priority(Priority::Required), c.score))
            .collect();
        let request = PruneRequest {
            views: &views,
            focus: views.root(),
            candidates: &candidates,
            lo: Conformance::new(r(100), r(100), r(0), r(0)),
            hi: Conformance::new(r(100), r(100), r(0), r(0)),
        };
        let result = prune(&request, &PruneConfig::default());
        assert!(matches!(result, Err(Error::Infeasible(..))));
    }

    #[test]
    fn combine_bounds_folds_close_inequality_pair() {
        let le = Constraint::Constant {
            kind: ConstraintKind::SizeConstant,
            y: AnchorId::new("child", Attribute::Width),
            b: Some(r(52)),
            op: ComparisonOp::Le,
            priority: Priority::Medium,
            sample_count: 1,
            is_falsified: false,
        };
        let ge = Constraint::Constant {
            kind: ConstraintKind::SizeConstant,
            y: AnchorId::new("child", Attribute::Width),
            b: Some(r(48)),
            op: ComparisonOp::Ge,
            priority: Priority::Medium,
            sample_count: 1,
            is_falsified: false,
        };
        let combined = combine_bounds(&[le, ge], &r(5));
        assert_eq!(combined.len(), 1);
        match &combined[0] {
            Constraint::Constant { op, b, .. } => {
                assert_eq!(*op, ComparisonOp::Eq);
                assert_eq!(*b, Some(r(50)));
            }
            _ => panic!("expected Constant"),
        }
    }
}
