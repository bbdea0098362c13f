//! Exact rational arithmetic helpers.
//!
//! Per the "dynamic numeric dispatch" design note, every coordinate and
//! constraint parameter is standardized internally on an arbitrary-precision
//! rational; conversions to/from other numeric representations only happen
//! at the JSON boundary (`lss-io`).

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// The canonical exact-rational type used throughout the workspace.
pub type Rational = BigRational;

/// Parses a JSON-style number literal (integer or decimal, optionally
/// signed) into an exact [`Rational`].
///
/// Decimals are "exactified": `"12.5"` becomes `25/2`, never an
/// approximate float.
pub fn parse_decimal(s: &str) -> Option<Rational> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut parts = rest.splitn(2, '.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();

    let int_digits = if int_part.is_empty() { "0" } else { int_part };
    if !int_digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut numer = int_digits.parse::<BigInt>().ok()?;
    let mut denom = BigInt::one();

    if let Some(frac) = frac_part {
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !frac.is_empty() {
            let scale = BigInt::from(10u32).pow(frac.len() as u32);
            let frac_digits: BigInt = frac.parse().ok()?;
            numer = numer * &scale + frac_digits;
            denom = scale;
        }
    }

    let mut value = Rational::new(numer, denom);
    if sign < 0 {
        value = -value;
    }
    Some(value)
}

/// Formats a rational as `"a/b"` (or `"a"` when the denominator is one), the
/// wire format used by the output JSON's `a`/`b` fields.
pub fn to_rational_string(value: &Rational) -> String {
    if value.denom().is_one() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

/// Parses the `"a/b"` wire format back into a [`Rational`].
pub fn from_rational_string(s: &str) -> Option<Rational> {
    let s = s.trim();
    if let Some((n, d)) = s.split_once('/') {
        let numer: BigInt = n.trim().parse().ok()?;
        let denom: BigInt = d.trim().parse().ok()?;
        if denom.is_zero() {
            return None;
        }
        Some(Rational::new(numer, denom))
    } else {
        let numer: BigInt = s.parse().ok()?;
        Some(Rational::new(numer, BigInt::one()))
    }
}

/// Returns `true` iff `a` and `b` differ by less than `tolerance` in
/// absolute value.
pub fn within_tolerance(a: &Rational, b: &Rational, tolerance: &Rational) -> bool {
    (a - b).abs() <= tolerance.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integers_and_decimals() {
        assert_eq!(parse_decimal("5").unwrap(), Rational::from_integer(5.into()));
        assert_eq!(
            parse_decimal("12.5").unwrap(),
            Rational::new(25.into(), 2.into())
        );
        assert_eq!(
            parse_decimal("-0.25").unwrap(),
            Rational::new((-1).into(), 4.into())
        );
    }

    #[test]
    fn round_trips_wire_format() {
        let r = Rational::new(3.into(), 4.into());
        let s = to_rational_string(&r);
        assert_eq!(s, "3/4");
        assert_eq!(from_rational_string(&s).unwrap(), r);

        let whole = Rational::from_integer(5.into());
        assert_eq!(to_rational_string(&whole), "5");
        assert_eq!(from_rational_string("5").unwrap(), whole);
    }

    #[test]
    fn tolerance_check() {
        let tol = Rational::new(1.into(), 1000.into());
        let a = Rational::new(1.into(), 2.into());
        let b = Rational::new(501.into(), 1000.into());
        assert!(within_tolerance(&a, &b, &tol));
        let c = Rational::new(6.into(), 10.into());
        assert!(!within_tolerance(&a, &c, &tol));
    }
}
