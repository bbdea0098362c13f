//! The eight anchorable quantities on a [`crate::Rect`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight scalar quantities derivable from a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Left edge x-coordinate.
    Left,
    /// Top edge y-coordinate.
    Top,
    /// Right edge x-coordinate.
    Right,
    /// Bottom edge y-coordinate.
    Bottom,
    /// Horizontal center, `(left + right) / 2`.
    CenterX,
    /// Vertical center, `(top + bottom) / 2`.
    CenterY,
    /// `right - left`.
    Width,
    /// `bottom - top`.
    Height,
}

/// All eight attributes in the fixed order used for deterministic anchor
/// enumeration (view pre-order × this order).
pub const ALL: [Attribute; 8] = [
    Attribute::Left,
    Attribute::Top,
    Attribute::Right,
    Attribute::Bottom,
    Attribute::CenterX,
    Attribute::CenterY,
    Attribute::Width,
    Attribute::Height,
];

impl Attribute {
    /// `true` for `{left, right, center_x, width}`.
    pub fn is_horizontal(self) -> bool {
        matches!(
            self,
            Attribute::Left | Attribute::Right | Attribute::CenterX | Attribute::Width
        )
    }

    /// `true` for `{top, bottom, center_y, height}`.
    pub fn is_vertical(self) -> bool {
        !self.is_horizontal()
    }

    /// `true` for `{width, height}`.
    pub fn is_size(self) -> bool {
        matches!(self, Attribute::Width | Attribute::Height)
    }

    /// `true` for the six position attributes (everything but size).
    pub fn is_position(self) -> bool {
        !self.is_size()
    }

    /// Returns the dual of a position attribute: `right <-> left`,
    /// `bottom <-> top`. Returns `None` for center/size attributes, which
    /// have no dual.
    pub fn dual(self) -> Option<Attribute> {
        match self {
            Attribute::Left => Some(Attribute::Right),
            Attribute::Right => Some(Attribute::Left),
            Attribute::Top => Some(Attribute::Bottom),
            Attribute::Bottom => Some(Attribute::Top),
            _ => None,
        }
    }

    /// Lowercase wire name, used in anchor id strings (`"view.left"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Left => "left",
            Attribute::Top => "top",
            Attribute::Right => "right",
            Attribute::Bottom => "bottom",
            Attribute::CenterX => "center_x",
            Attribute::CenterY => "center_y",
            Attribute::Width => "width",
            Attribute::Height => "height",
        }
    }

    /// Parses the lowercase wire name back into an [`Attribute`].
    pub fn from_str_opt(s: &str) -> Option<Attribute> {
        Some(match s {
            "left" => Attribute::Left,
            "top" => Attribute::Top,
            "right" => Attribute::Right,
            "bottom" => Attribute::Bottom,
            "center_x" => Attribute::CenterX,
            "center_y" => Attribute::CenterY,
            "width" => Attribute::Width,
            "height" => Attribute::Height,
            _ => return None,
        })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unordered pair of attributes forms a "dual type" iff it is exactly
/// `{left, right}` or `{top, bottom}` — used by the offset-between-siblings
/// template rule.
pub fn is_dual_pair(a: Attribute, b: Attribute) -> bool {
    matches!(
        (a, b),
        (Attribute::Right, Attribute::Left) | (Attribute::Bottom, Attribute::Top)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        for attr in ALL {
            assert_ne!(attr.is_horizontal(), attr.is_vertical());
            assert_ne!(attr.is_size(), attr.is_position());
        }
    }

    #[test]
    fn dual_pairs_are_symmetric() {
        assert_eq!(Attribute::Left.dual(), Some(Attribute::Right));
        assert_eq!(Attribute::Right.dual(), Some(Attribute::Left));
        assert_eq!(Attribute::Top.dual(), Some(Attribute::Bottom));
        assert_eq!(Attribute::CenterX.dual(), None);
        assert!(is_dual_pair(Attribute::Right, Attribute::Left));
        assert!(is_dual_pair(Attribute::Bottom, Attribute::Top));
        assert!(!is_dual_pair(Attribute::Left, Attribute::Right));
    }

    #[test]
    fn wire_names_round_trip() {
        for attr in ALL {
            assert_eq!(Attribute::from_str_opt(attr.as_str()), Some(attr));
        }
    }
}
