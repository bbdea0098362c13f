//! Continued-fraction / Stern-Brocot / Farey helpers used to prefer simple
//! rationals over complex ones when several candidates fit the observed
//! data equally well.

use lss_core::Rational;
use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Continued-fraction expansion of `|r|`'s coefficients.
pub fn continued_fraction(r: &Rational) -> Vec<BigInt> {
    let mut n = r.numer().abs();
    let mut d = r.denom().abs();
    let mut terms = Vec::new();
    while !d.is_zero() {
        let term = &n / &d;
        let rem = &n - &term * &d;
        terms.push(term);
        n = d;
        d = rem;
    }
    terms
}

/// Length of the continued-fraction expansion: how many terms it takes to
/// describe `r` exactly. Rationals with long expansions "feel" more
/// arbitrary as a constraint parameter.
pub fn irrationality(r: &Rational) -> usize {
    continued_fraction(r).len()
}

/// Sum of continued-fraction coefficients: the Stern-Brocot tree depth of
/// `r`. Low-depth rationals (`1`, `1/2`, `2`, `3/4`, ...) sit near the root
/// of the tree and make for more plausible design-time ratios than e.g.
/// `17/23`.
pub fn sb_depth(r: &Rational) -> BigInt {
    continued_fraction(r)
        .into_iter()
        .fold(BigInt::zero(), |acc, term| acc + term)
}

/// The Farey sequence of order `n`: every reduced fraction in `[0, 1]` with
/// denominator at most `n`, ascending.
pub fn farey(n: u64) -> Vec<Rational> {
    use std::collections::BTreeSet;
    let mut set = BTreeSet::new();
    for k in 1..=n {
        for m in 0..=k {
            set.insert(Rational::new(BigInt::from(m), BigInt::from(k)));
        }
    }
    set.into_iter().collect()
}

/// [`farey`] extended past `1` by appending the reversed reciprocals of its
/// interior terms, covering every reduced fraction with denominator at most
/// `n` up to value `n` itself.
pub fn ext_farey(n: u64) -> Vec<Rational> {
    let f = farey(n);
    let mut out = f.clone();
    if f.len() > 2 {
        for term in f[1..f.len() - 1].iter().rev() {
            out.push(Rational::one() / term);
        }
    }
    out
}

/// Integers in the half-open window `[ceil(center - radius), floor(center + radius))`.
pub fn z_ball(center: f64, radius: f64) -> Vec<i64> {
    let lo = (center - radius).ceil() as i64;
    let hi = (center + radius).floor() as i64;
    (lo..hi).collect()
}

/// Finds the simplest rational inside the closed interval `[lo, hi]`
/// (the Stern-Brocot mediant search). Panics if `lo > hi`.
pub fn simplest_rational_in_range(lo: &Rational, hi: &Rational) -> Rational {
    assert!(lo <= hi, "simplest_rational_in_range requires lo <= hi");
    if lo.is_negative() && hi.is_positive() {
        return Rational::zero();
    }
    if lo.is_zero() || hi.is_zero() {
        return Rational::zero();
    }
    if hi.is_negative() {
        return -simplest_positive(&(-hi), &(-lo));
    }
    simplest_positive(lo, hi)
}

fn simplest_positive(lo: &Rational, hi: &Rational) -> Rational {
    let fl_lo = lo.floor();
    let fl_hi = hi.floor();
    if fl_lo < fl_hi {
        return fl_lo + Rational::one();
    }
    if lo == &fl_lo {
        return fl_lo;
    }
    let frac_lo = lo - &fl_lo;
    let frac_hi = hi - &fl_lo;
    let inner = simplest_positive(&(Rational::one() / frac_hi), &(Rational::one() / frac_lo));
    fl_lo + Rational::one() / inner
}

/// Returns the element of [`ext_farey`]`(max_denominator)` nearest to
/// `target`, mirrored onto negative targets. Used by the heuristic learner
/// to clamp a freshly fit ratio down to a "round" design value.
pub fn nearest_in_farey(target: &Rational, max_denominator: u64) -> Rational {
    if target.is_negative() {
        return -nearest_in_farey(&-target.clone(), max_denominator);
    }
    let candidates = ext_farey(max_denominator.max(1));
    candidates
        .into_iter()
        .min_by(|a, b| {
            let da = (a - target).abs();
            let db = (b - target).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or_else(Rational::zero)
}

/// `r` as an `f64`, used only for scoring (never for correctness-bearing
/// comparisons).
pub fn to_f64_lossy(r: &Rational) -> f64 {
    r.numer().to_f64().unwrap_or(0.0) / r.denom().to_f64().unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt as BI;

    fn r(n: i64, d: i64) -> Rational {
        Rational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn continued_fraction_of_simple_ratio() {
        let terms = continued_fraction(&r(4, 3));
        assert_eq!(terms, vec![BI::from(1), BI::from(3)]);
        assert_eq!(irrationality(&r(4, 3)), 2);
        assert_eq!(sb_depth(&r(4, 3)), BI::from(4));
    }

    #[test]
    fn farey_order_two_has_expected_members() {
        let f = farey(2);
        assert!(f.contains(&r(0, 1)));
        assert!(f.contains(&r(1, 2)));
        assert!(f.contains(&r(1, 1)));
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn ext_farey_covers_values_above_one() {
        let f = ext_farey(2);
        assert!(f.contains(&r(2, 1)));
    }

    #[test]
    fn simplest_in_range_prefers_low_depth() {
        let lo = r(13, 10);
        let hi = r(14, 10);
        let simplest = simplest_rational_in_range(&lo, &hi);
        assert_eq!(simplest, r(4, 3));
    }

    #[test]
    fn simplest_in_range_returns_integer_when_spanned() {
        let lo = r(9, 10);
        let hi = r(21, 10);
        assert_eq!(simplest_rational_in_range(&lo, &hi), r(1, 1));
    }

    #[test]
    fn z_ball_window_is_half_open() {
        assert_eq!(z_ball(5.0, 2.0), vec![3, 4, 5, 6]);
    }
}
