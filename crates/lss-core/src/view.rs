//! Immutable view hierarchy with anchor and edge accessors.
//!
//! Views are built once from input and shared by reference; the tree never
//! mutates after construction. Parent links are non-owning indices into the
//! arena (see [`ViewId`]) — the builder wires them after children are built
//! and never touches them again, so no cycle can form.

use std::collections::BTreeMap;

use crate::errors::{Error, Result};
use crate::rational::Rational;
use crate::{attribute, Attribute, Rect};

/// Index of a view within a [`Views`] arena. Not meaningful across
/// different [`Views`] instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u32);

impl ViewId {
    fn as_usize(self) -> usize {
        self.0 as usize
    }
}

struct ViewNode {
    name: String,
    rect: Rect,
    parent: Option<ViewId>,
    children: Vec<ViewId>,
}

/// An immutable, arena-backed view hierarchy for a single example.
pub struct Views {
    nodes: Vec<ViewNode>,
    root: ViewId,
    by_name: BTreeMap<String, ViewId>,
}

/// Recursive, user-facing description of a view used to build a [`Views`]
/// arena. This is the shape the JSON loader (`lss-io`) produces.
#[derive(Debug, Clone)]
pub struct ViewSpec {
    /// Unique (within the tree) name of the view.
    pub name: String,
    /// Axis-aligned rectangle of the view.
    pub rect: Rect,
    /// Child view specs, in input order.
    pub children: Vec<ViewSpec>,
}

impl Views {
    /// Builds an arena from a recursive [`ViewSpec`], validating that every
    /// name is unique within the tree.
    pub fn build(spec: ViewSpec) -> Result<Self> {
        let mut nodes = Vec::new();
        let mut by_name = BTreeMap::new();
        let root = Self::build_node(spec, None, &mut nodes, &mut by_name)?;
        Ok(Self {
            nodes,
            root,
            by_name,
        })
    }

    fn build_node(
        spec: ViewSpec,
        parent: Option<ViewId>,
        nodes: &mut Vec<ViewNode>,
        by_name: &mut BTreeMap<String, ViewId>,
    ) -> Result<ViewId> {
        if by_name.contains_key(&spec.name) {
            return Err(Error::input(
                "duplicate_view_name",
                format!("view name '{}' is not unique within this example", spec.name),
            ));
        }
        let id = ViewId(nodes.len() as u32);
        nodes.push(ViewNode {
            name: spec.name.clone(),
            rect: spec.rect,
            parent,
            children: Vec::new(),
        });
        by_name.insert(spec.name, id);

        let mut child_ids = Vec::with_capacity(spec.children.len());
        for child_spec in spec.children {
            child_ids.push(Self::build_node(child_spec, Some(id), nodes, by_name)?);
        }
        nodes[id.as_usize()].children = child_ids;
        Ok(id)
    }

    /// Returns the root view's id.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Returns the name of a view.
    pub fn name(&self, id: ViewId) -> &str {
        &self.nodes[id.as_usize()].name
    }

    /// Returns the rectangle of a view.
    pub fn rect(&self, id: ViewId) -> &Rect {
        &self.nodes[id.as_usize()].rect
    }

    /// Returns the parent of a view, if any.
    pub fn parent(&self, id: ViewId) -> Option<ViewId> {
        self.nodes[id.as_usize()].parent
    }

    /// Returns the children of a view, in input order.
    pub fn children(&self, id: ViewId) -> &[ViewId] {
        &self.nodes[id.as_usize()].children
    }

    /// Looks up a view by name.
    pub fn find_by_name(&self, name: &str) -> Option<ViewId> {
        self.by_name.get(name).copied()
    }

    /// `true` iff `maybe_parent` is a (direct) parent of `id`.
    pub fn is_parent_of(&self, maybe_parent: ViewId, id: ViewId) -> bool {
        self.parent(id) == Some(maybe_parent)
    }

    /// `true` iff `a` and `b` are distinct views sharing a parent.
    pub fn is_sibling_of(&self, a: ViewId, b: ViewId) -> bool {
        a != b && self.parent(a).is_some() && self.parent(a) == self.parent(b)
    }

    /// Pre-order traversal of the whole tree starting at the root.
    pub fn pre_order(&self) -> Vec<ViewId> {
        self.pre_order_from(self.root)
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    pub fn pre_order_from(&self, start: ViewId) -> Vec<ViewId> {
        fn visit(views: &Views, id: ViewId, out: &mut Vec<ViewId>) {
            out.push(id);
            for &child in views.children(id) {
                visit(views, child, out);
            }
        }
        let mut out = Vec::new();
        visit(self, start, &mut out);
        out
    }

    /// All descendants of `root` excluding `root` itself, in pre-order.
    pub fn descendants(&self, root: ViewId) -> Vec<ViewId> {
        let mut all = self.pre_order_from(root);
        all.remove(0);
        all
    }

    /// Every anchor of every view in the subtree rooted at `start`, in
    /// pre-order-of-views × fixed-8-attribute-order. This is the
    /// deterministic "anchor array" every pipeline stage indexes against.
    pub fn anchors_in_subtree(&self, start: ViewId) -> Vec<AnchorId> {
        let mut out = Vec::new();
        for view in self.pre_order_from(start) {
            let name = self.name(view).to_string();
            for attr in attribute::ALL {
                out.push(AnchorId {
                    view_name: name.clone(),
                    attribute: attr,
                });
            }
        }
        out
    }

    /// Resolves an [`AnchorId`] to its scalar value in this tree.
    pub fn anchor_value(&self, id: &AnchorId) -> Option<Rational> {
        let view = self.find_by_name(&id.view_name)?;
        Some(self.rect(view).get(id.attribute))
    }

    /// `true` iff `self` and `other` share the same tree shape and view
    /// names in the same positions (order-sensitive structural equality).
    pub fn is_isomorphic(&self, other: &Views) -> bool {
        fn go(a: &Views, b: &Views, ia: ViewId, ib: ViewId) -> bool {
            if a.name(ia) != b.name(ib) {
                return false;
            }
            let ca = a.children(ia);
            let cb = b.children(ib);
            if ca.len() != cb.len() {
                return false;
            }
            ca.iter()
                .zip(cb.iter())
                .all(|(&x, &y)| go(a, b, x, y))
        }
        go(self, other, self.root, other.root)
    }
}

/// A (view, attribute) pair; the value type used to name anchors globally
/// and uniquely within one hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorId {
    /// Name of the view the anchor belongs to.
    pub view_name: String,
    /// Which scalar quantity of the view this anchor names.
    pub attribute: Attribute,
}

impl AnchorId {
    /// Builds an anchor id from a view name and attribute.
    pub fn new(view_name: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            view_name: view_name.into(),
            attribute,
        }
    }
}

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.view_name, self.attribute)
    }
}

impl std::str::FromStr for AnchorId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, attr) = s.rsplit_once('.').ok_or_else(|| {
            Error::input("bad_anchor_id", format!("'{s}' is not a valid anchor id"))
        })?;
        let attribute = Attribute::from_str_opt(attr).ok_or_else(|| {
            Error::input(
                "bad_anchor_id",
                format!("'{attr}' is not a valid attribute in '{s}'"),
            )
        })?;
        Ok(AnchorId::new(name, attribute))
    }
}

/// An edge: an anchor plus the two-point interval spanning the orthogonal
/// axis of its view's rect. Used only by the visibility engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// The anchor this edge represents.
    pub anchor: AnchorId,
    /// The `(low, high)` interval along the orthogonal axis. Invariant:
    /// `low <= high`.
    pub interval: (Rational, Rational),
}

impl Edge {
    /// Builds an edge, checking the interval invariant in debug builds.
    pub fn new(anchor: AnchorId, interval: (Rational, Rational)) -> Self {
        debug_assert!(interval.0 <= interval.1, "edge interval must be ordered");
        Self { anchor, interval }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn r(n: i64) -> Rational {
        Rational::from_integer(BigInt::from(n))
    }

    fn rect(l: i64, t: i64, rr: i64, b: i64) -> Rect {
        Rect::new(r(l), r(t), r(rr), r(b))
    }

    fn sample_tree() -> Views {
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

    #[test]
    fn builds_and_links_parent() {
        let views = sample_tree();
        let root = views.root();
        let child = views.find_by_name("child").unwrap();
        assert_eq!(views.parent(child), Some(root));
        assert!(views.is_parent_of(root, child));
        assert_eq!(views.children(root), &[child]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 10, 10),
            children: vec![ViewSpec {
                name: "root".into(),
                rect: rect(0, 0, 5, 5),
                children: vec![],
            }],
        });
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[test]
    fn anchor_array_is_pre_order_times_eight() {
        let views = sample_tree();
        let anchors = views.anchors_in_subtree(views.root());
        assert_eq!(anchors.len(), 16);
        assert_eq!(anchors[0].view_name, "root");
        assert_eq!(anchors[8].view_name, "child");
    }

    #[test]
    fn anchor_id_round_trips_through_display() {
        let id = AnchorId::new("child", Attribute::CenterX);
        let s = id.to_string();
        assert_eq!(s, "child.center_x");
        let parsed: AnchorId = s.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn isomorphism_checks_shape_and_names() {
        let a = sample_tree();
        let b = sample_tree();
        assert!(a.is_isomorphic(&b));

        let c = Views::build(ViewSpec {
            name: "root".into(),
            rect: rect(0, 0, 100, 100),
            children: vec![],
        })
        .unwrap();
        assert!(!a.is_isomorphic(&c));
    }
}
