#![deny(missing_docs)]
#![doc = "Geometry, view tree, and constraint algebra shared across the layout synthesizer crates."]

/// The eight anchorable rect quantities and their axis/size partitions.
pub mod attribute;
/// Constraint value type, taxonomy, and template/concrete distinction.
pub mod constraint;
/// Structured error types shared across synthesizer crates.
pub mod errors;
/// Exact rational arithmetic helpers.
pub mod rational;
/// Axis-aligned rectangles in exact rational coordinates.
pub mod rect;
/// Immutable view hierarchy with anchor and edge accessors.
pub mod view;

pub use attribute::Attribute;
pub use constraint::{ComparisonOp, Constraint, ConstraintKind, ConstraintWire, Priority};
pub use errors::{ConflictReport, Error, ErrorInfo, Result};
pub use rational::Rational;
pub use rect::Rect;
pub use view::{AnchorId, Edge, ViewId, ViewSpec, Views};

/// A concretized constraint paired with a score, ordered lexicographically
/// by score for tie-breaks.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The concrete constraint.
    pub constraint: Constraint,
    /// Non-negative preference score; higher is better.
    pub score: f64,
}

impl Candidate {
    /// Builds a new candidate.
    pub fn new(constraint: Constraint, score: f64) -> Self {
        debug_assert!(score >= 0.0, "candidate scores must be non-negative");
        Self { constraint, score }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.score.partial_cmp(&other.score)
    }
}

/// The outer-rectangle size context sampled during SMT solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conformance {
    /// Outer width.
    pub w: Rational,
    /// Outer height.
    pub h: Rational,
    /// Outer left (x) position.
    pub x: Rational,
    /// Outer top (y) position.
    pub y: Rational,
}

impl Conformance {
    /// Builds a new conformance tuple.
    pub fn new(w: Rational, h: Rational, x: Rational, y: Rational) -> Self {
        Self { w, h, x, y }
    }
}
