//! Input JSON decoding: the `default` and `bench` formats, exact-rational
//! number parsing, and the cross-example isomorphism check.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use serde_json::Value;

use lss_core::rational::parse_decimal;
use lss_core::{Error, Rational, Rect, Result, ViewSpec, Views};

use crate::options::{InputFormat, NumericType};

#[derive(Debug, Deserialize)]
struct DefaultDocument {
    examples: Vec<DefaultViewWire>,
}

#[derive(Debug, Deserialize)]
struct DefaultViewWire {
    name: String,
    rect: Vec<Value>,
    #[serde(default)]
    children: Vec<DefaultViewWire>,
}

#[derive(Debug, Deserialize)]
struct BenchDocument {
    train: Vec<BenchViewWire>,
}

#[derive(Debug, Deserialize)]
struct BenchViewWire {
    name: String,
    left: Value,
    top: Value,
    width: Value,
    height: Value,
    #[serde(default)]
    children: Vec<BenchViewWire>,
}

/// Decodes a JSON number or numeric string into an exact [`Rational`],
/// never routing through `f64`.
fn decode_number(value: &Value) -> Result<Rational> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(Error::input(
                "bad_number",
                format!("expected a number or numeric string, found {other}"),
            ))
        }
    };
    parse_decimal(&text).ok_or_else(|| {
        Error::input("bad_number", format!("'{text}' is not a valid number literal"))
    })
}

fn decode_default_view(wire: DefaultViewWire, numeric_type: NumericType) -> Result<ViewSpec> {
    if wire.rect.len() != 4 {
        return Err(Error::input(
            "bad_rect",
            format!("view '{}' has a rect with {} elements, expected 4", wire.name, wire.rect.len()),
        ));
    }
    let mut coords = Vec::with_capacity(4);
    for raw in &wire.rect {
        let value = decode_number(raw)?;
        numeric_type.validate(&value)?;
        coords.push(value);
    }
    let (l, t, r, b) = (coords[0].clone(), coords[1].clone(), coords[2].clone(), coords[3].clone());
    if l > r || t > b {
        return Err(Error::input(
            "inverted_rect",
            format!("view '{}' has an inverted rect", wire.name),
        ));
    }
    let rect = Rect::new(l, t, r, b);
    let children = wire
        .children
        .into_iter()
        .map(|child| decode_default_view(child, numeric_type))
        .collect::<Result<Vec<_>>>()?;
    Ok(ViewSpec { name: wire.name, rect, children })
}

fn decode_bench_view(wire: BenchViewWire, numeric_type: NumericType) -> Result<ViewSpec> {
    let left = decode_number(&wire.left)?;
    let top = decode_number(&wire.top)?;
    let width = decode_number(&wire.width)?;
    let height = decode_number(&wire.height)?;
    for value in [&left, &top, &width, &height] {
        numeric_type.validate(value)?;
    }
    use num_traits::Signed;
    if width.is_negative() || height.is_negative() {
        return Err(Error::input(
            "negative_size",
            format!("view '{}' has a negative width or height", wire.name),
        ));
    }
    let rect = Rect::new(left.clone(), top.clone(), &left + &width, &top + &height);
    let children = wire
        .children
        .into_iter()
        .map(|child| decode_bench_view(child, numeric_type))
        .collect::<Result<Vec<_>>>()?;
    Ok(ViewSpec { name: wire.name, rect, children })
}

/// Parses an input JSON document (`default` or `bench` shape) into one
/// [`ViewSpec`] tree per example, decoding every coordinate as an exact
/// rational and validating it against `numeric_type`.
pub fn parse_examples(json: &str, format: InputFormat, numeric_type: NumericType) -> Result<Vec<ViewSpec>> {
    match format {
        InputFormat::Default => {
            let doc: DefaultDocument = serde_json::from_str(json)
                .map_err(|err| Error::input("bad_json", format!("failed to parse input: {err}")))?;
            doc.examples
                .into_iter()
                .map(|view| decode_default_view(view, numeric_type))
                .collect()
        }
        InputFormat::Bench => {
            let doc: BenchDocument = serde_json::from_str(json)
                .map_err(|err| Error::input("bad_json", format!("failed to parse input: {err}")))?;
            doc.train
                .into_iter()
                .map(|view| decode_bench_view(view, numeric_type))
                .collect()
        }
    }
}

/// Builds a [`Views`] arena from each parsed [`ViewSpec`] and checks that
/// every pair is isomorphic, naming the offending example on failure.
pub fn build_and_validate(specs: Vec<ViewSpec>) -> Result<Vec<Views>> {
    if specs.is_empty() {
        return Err(Error::input("no_examples", "at least one example is required"));
    }
    let trees = specs
        .into_iter()
        .map(Views::build)
        .collect::<Result<Vec<_>>>()?;

    for (idx, other) in trees.iter().enumerate().skip(1) {
        if !trees[0].is_isomorphic(other) {
            return Err(Error::input(
                "non_isomorphic_examples",
                format!("example {idx} is not isomorphic to example 0"),
            ));
        }
    }
    Ok(trees)
}

/// Adds uniform noise in `[-amount, amount]` to every rect coordinate of
/// `spec` and its descendants, reseeding sort order so `left <= right` and
/// `top <= bottom` are preserved. `seed` makes repeated runs reproducible;
/// this is a debug/robustness-testing feature, so the jitter magnitude is
/// computed in `f64` before being re-exactified — the one place in the
/// pipeline floats are allowed to touch a coordinate.
pub fn apply_debug_noise(spec: &mut ViewSpec, amount: &Rational, seed: u64) {
    use num_traits::ToPrimitive;
    let amount_f64 = amount.to_f64().unwrap_or(0.0);
    if amount_f64 == 0.0 {
        return;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    jitter_view(spec, amount_f64, &mut rng);
}

fn jitter_view(spec: &mut ViewSpec, amount_f64: f64, rng: &mut StdRng) {
    let l = spec.rect.left() + &jitter_delta(amount_f64, rng);
    let t = spec.rect.top() + &jitter_delta(amount_f64, rng);
    let r = spec.rect.right() + &jitter_delta(amount_f64, rng);
    let b = spec.rect.bottom() + &jitter_delta(amount_f64, rng);
    let (left, right) = if l <= r { (l, r) } else { (r, l) };
    let (top, bottom) = if t <= b { (t, b) } else { (b, t) };
    spec.rect = Rect::new(left, top, right, bottom);
    for child in &mut spec.children {
        jitter_view(child, amount_f64, rng);
    }
}

fn jitter_delta(amount_f64: f64, rng: &mut StdRng) -> Rational {
    let u: f64 = rng.gen_range(-1.0..=1.0);
    parse_decimal(&format!("{:.9}", u * amount_f64)).unwrap_or_else(|| Rational::from_integer(num_bigint::BigInt::from(0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_format() {
        let json = r#"{"examples": [{"name": "root", "rect": [0, 0, 100, 100], "children": [
            {"name": "child", "rect": ["10.5", 10, 60, 60], "children": []}
        ]}]}"#;
        let specs = parse_examples(json, InputFormat::Default, NumericType::R).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].children[0].rect.left(), &Rational::new(21.into(), 2.into()));
    }

    #[test]
    fn parses_bench_format_into_rect() {
        let json = r#"{"train": [{"name": "root", "left": 0, "top": 0, "width": 100, "height": 50, "children": []}]}"#;
        let specs = parse_examples(json, InputFormat::Bench, NumericType::R).unwrap();
        let rect = &specs[0].rect;
        assert_eq!(rect.right(), &Rational::from_integer(100.into()));
        assert_eq!(rect.bottom(), &Rational::from_integer(50.into()));
    }

    #[test]
    fn rejects_non_isomorphic_examples() {
        let json = r#"{"examples": [
            {"name": "root", "rect": [0,0,10,10], "children": []},
            {"name": "root", "rect": [0,0,10,10], "children": [{"name": "extra", "rect": [0,0,1,1], "children": []}]}
        ]}"#;
        let specs = parse_examples(json, InputFormat::Default, NumericType::R).unwrap();
        let err = build_and_validate(specs).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn rejects_duplicate_names_within_one_example() {
        let json = r#"{"examples": [
            {"name": "root", "rect": [0,0,10,10], "children": [{"name": "root", "rect": [0,0,1,1], "children": []}]}
        ]}"#;
        let specs = parse_examples(json, InputFormat::Default, NumericType::R).unwrap();
        let err = build_and_validate(specs).unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }
}
