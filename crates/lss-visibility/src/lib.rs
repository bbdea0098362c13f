#![deny(missing_docs)]
//! Sweep-line visibility engine.
//!
//! Two anchors are *visible* to one another iff a straight orthogonal scan
//! line can be cast from one to the other without crossing any sibling
//! view's interior. This crate computes that relation — unioned across all
//! examples — plus the view-level "alignment visibility" promotion the
//! template instantiator needs.

use std::collections::{HashMap, HashSet};

use lss_core::{AnchorId, Attribute, Rational, Result, ViewId, Views};

/// A hand-rolled interval index: entries sorted by their low endpoint,
/// queried by linear scan. Realistic trees have well under a thousand
/// views, so a linear scan stays fast without pulling in an interval-tree
/// dependency.
struct EdgeEntry {
    lo: Rational,
    hi: Rational,
    anchor: AnchorId,
    view: ViewId,
}

fn query<'a>(entries: &'a [EdgeEntry], at: &Rational) -> Vec<&'a EdgeEntry> {
    entries
        .iter()
        .filter(|e| &e.lo <= at && at <= &e.hi)
        .collect()
}

/// The anchor-level and view-level visibility relations computed over a
/// set of structurally isomorphic examples.
pub struct Visibility {
    anchors: Vec<AnchorId>,
    index: HashMap<AnchorId, usize>,
    matrix: Vec<bool>,
    view_names: Vec<String>,
    h_view: Vec<bool>,
    v_view: Vec<bool>,
}

impl Visibility {
    /// Computes the visibility relation over `examples`, using the first
    /// example's tree shape for anchor indexing (all examples are assumed
    /// isomorphic).
    pub fn compute(examples: &[Views]) -> Result<Self> {
        let reference = examples
            .first()
            .ok_or_else(|| lss_core::Error::input("no_examples", "visibility requires at least one example"))?;
        let anchors = reference.anchors_in_subtree(reference.root());
        let n = anchors.len();
        let index: HashMap<AnchorId, usize> = anchors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();

        let mut matrix = vec![false; n * n];
        for example in examples {
            mark_example(example, &index, &mut matrix, n);
        }

        let view_names: Vec<String> = reference
            .pre_order()
            .into_iter()
            .map(|v| reference.name(v).to_string())
            .collect();
        let n_views = view_names.len();
        let mut h_view = vec![false; n_views * n_views];
        let mut v_view = vec![false; n_views * n_views];
        for i in 0..n {
            for j in 0..n {
                if !matrix[i * n + j] {
                    continue;
                }
                let ai = anchors[i].attribute;
                let aj = anchors[j].attribute;
                let bi = i / 8;
                let bj = j / 8;
                if ai.is_horizontal() && aj.is_horizontal() {
                    h_view[bi * n_views + bj] = true;
                }
                if ai.is_vertical() && aj.is_vertical() {
                    v_view[bi * n_views + bj] = true;
                }
            }
        }

        Ok(Self {
            anchors,
            index,
            matrix,
            view_names,
            h_view,
            v_view,
        })
    }

    /// The reference anchor array, in pre-order-of-views × fixed-8-attribute
    /// order — the same indexing every pipeline stage uses.
    pub fn anchors(&self) -> &[AnchorId] {
        &self.anchors
    }

    /// Index of an anchor within [`Visibility::anchors`], if present.
    pub fn anchor_index(&self, id: &AnchorId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// `true` iff anchors at indices `i` and `j` are visible to each other.
    pub fn is_visible(&self, i: usize, j: usize) -> bool {
        self.matrix[i * self.anchors.len() + j]
    }

    /// `true` iff anchors `a` and `b` are visible to each other.
    pub fn is_visible_by_id(&self, a: &AnchorId, b: &AnchorId) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&i), Some(&j)) => self.is_visible(i, j),
            _ => false,
        }
    }

    fn view_index(&self, name: &str) -> Option<usize> {
        self.view_names.iter().position(|n| n == name)
    }

    /// `true` iff some horizontal anchor pair between `view_a` and
    /// `view_b` was deemed visible (the promotion used by the vertical
    /// alignment rule).
    pub fn is_view_visible_h(&self, view_a: &str, view_b: &str) -> bool {
        let n_views = self.view_names.len();
        match (self.view_index(view_a), self.view_index(view_b)) {
            (Some(i), Some(j)) => self.h_view[i * n_views + j],
            _ => false,
        }
    }

    /// `true` iff some vertical anchor pair between `view_a` and `view_b`
    /// was deemed visible (used by the horizontal alignment rule).
    pub fn is_view_visible_v(&self, view_a: &str, view_b: &str) -> bool {
        let n_views = self.view_names.len();
        match (self.view_index(view_a), self.view_index(view_b)) {
            (Some(i), Some(j)) => self.v_view[i * n_views + j],
            _ => false,
        }
    }
}

fn mark_example(views: &Views, index: &HashMap<AnchorId, usize>, matrix: &mut Vec<bool>, n: usize) {
    sweep_subtree(views, views.root(), index, matrix, n);
}

fn mark_pair(index: &HashMap<AnchorId, usize>, matrix: &mut Vec<bool>, n: usize, a: &AnchorId, b: &AnchorId) {
    if let (Some(&i), Some(&j)) = (index.get(a), index.get(b)) {
        matrix[i * n + j] = true;
        matrix[j * n + i] = true;
    }
}

fn sweep_subtree(views: &Views, focus: ViewId, index: &HashMap<AnchorId, usize>, matrix: &mut Vec<bool>, n: usize) {
    let children = views.children(focus).to_vec();
    let focus_rect = views.rect(focus);
    let focus_name = views.name(focus).to_string();

    let mut horizontal_edges = Vec::new();
    let mut vertical_edges = Vec::new();
    let mut x_events: HashSet<Rational> = HashSet::new();
    let mut y_events: HashSet<Rational> = HashSet::new();
    x_events.insert(focus_rect.left().clone());
    x_events.insert(focus_rect.right().clone());
    y_events.insert(focus_rect.top().clone());
    y_events.insert(focus_rect.bottom().clone());

    for &child in &children {
        let rect = views.rect(child);
        let name = views.name(child).to_string();
        horizontal_edges.push(EdgeEntry {
            lo: rect.left().clone(),
            hi: rect.right().clone(),
            anchor: AnchorId::new(name.clone(), Attribute::Top),
            view: child,
        });
        horizontal_edges.push(EdgeEntry {
            lo: rect.left().clone(),
            hi: rect.right().clone(),
            anchor: AnchorId::new(name.clone(), Attribute::Bottom),
            view: child,
        });
        vertical_edges.push(EdgeEntry {
            lo: rect.top().clone(),
            hi: rect.bottom().clone(),
            anchor: AnchorId::new(name.clone(), Attribute::Left),
            view: child,
        });
        vertical_edges.push(EdgeEntry {
            lo: rect.top().clone(),
            hi: rect.bottom().clone(),
            anchor: AnchorId::new(name.clone(), Attribute::Right),
            view: child,
        });
        x_events.insert(rect.left().clone());
        x_events.insert(rect.right().clone());
        y_events.insert(rect.top().clone());
        y_events.insert(rect.bottom().clone());
    }

    let sentinel_top = AnchorId::new(focus_name.clone(), Attribute::Top);
    let sentinel_bottom = AnchorId::new(focus_name.clone(), Attribute::Bottom);
    let sentinel_left = AnchorId::new(focus_name.clone(), Attribute::Left);
    let sentinel_right = AnchorId::new(focus_name.clone(), Attribute::Right);

    for x in &x_events {
        let mut hits = query(&horizontal_edges, x);
        hits.sort_by(|a, b| sweep_key(views, a).cmp(&sweep_key(views, b)));
        let mut sequence: Vec<(AnchorId, ViewId)> = Vec::with_capacity(hits.len() + 2);
        sequence.push((sentinel_top.clone(), focus));
        for e in hits.drain(..) {
            sequence.push((e.anchor.clone(), e.view));
        }
        sequence.push((sentinel_bottom.clone(), focus));

        for w in sequence.windows(2) {
            let (anchor_i, view_i) = &w[0];
            let (anchor_j, view_j) = &w[1];
            debug_assert!(anchor_i != anchor_j, "sweep produced a duplicate anchor; a bug in geometry");
            if view_i == view_j {
                continue;
            }
            mark_pair(index, matrix, n, anchor_i, anchor_j);
            let name_i = views.name(*view_i).to_string();
            let name_j = views.name(*view_j).to_string();
            mark_pair(
                index,
                matrix,
                n,
                &AnchorId::new(name_i, Attribute::CenterY),
                &AnchorId::new(name_j, Attribute::CenterY),
            );
        }
    }

    for y in &y_events {
        let mut hits = query(&vertical_edges, y);
        hits.sort_by(|a, b| sweep_key_vertical(views, a).cmp(&sweep_key_vertical(views, b)));
        let mut sequence: Vec<(AnchorId, ViewId)> = Vec::with_capacity(hits.len() + 2);
        sequence.push((sentinel_left.clone(), focus));
        for e in hits.drain(..) {
            sequence.push((e.anchor.clone(), e.view));
        }
        sequence.push((sentinel_right.clone(), focus));

        for w in sequence.windows(2) {
            let (anchor_i, view_i) = &w[0];
            let (anchor_j, view_j) = &w[1];
            debug_assert!(anchor_i != anchor_j, "sweep produced a duplicate anchor; a bug in geometry");
            if view_i == view_j {
                continue;
            }
            mark_pair(index, matrix, n, anchor_i, anchor_j);
            let name_i = views.name(*view_i).to_string();
            let name_j = views.name(*view_j).to_string();
            mark_pair(
                index,
                matrix,
                n,
                &AnchorId::new(name_i, Attribute::CenterX),
                &AnchorId::new(name_j, Attribute::CenterX),
            );
        }
    }

    for child in children {
        sweep_subtree(views, child, index, matrix, n);
    }
}

fn sweep_key(views: &Views, e: &EdgeEntry) -> (Rational, Rational) {
    let rect = views.rect(e.view);
    let position = match e.anchor.attribute {
        Attribute::Top => rect.top().clone(),
        Attribute::Bottom => rect.bottom().clone(),
        _ => unreachable!("horizontal edge anchors are always top/bottom"),
    };
    (rect.center_y(), position)
}

fn sweep_key_vertical(views: &Views, e: &EdgeEntry) -> (Rational, Rational) {
    let rect = views.rect(e.view);
    let position = match e.anchor.attribute {
        Attribute::Left => rect.left().clone(),
        Attribute::Right => rect.right().clone(),
        _ => unreachable!("vertical edge anchors are always left/right"),
    };
    (rect.center_x(), position)
}
