//! Region merging and reconciliation
//!
//! Two operations live here. `merge_until_stable` fuses boxes from a single
//! detector until no pair overlaps or touches any more. `reconcile` runs a
//! first-accepted-wins suppression across several sources.

use log::debug;

use crate::coordinate::BoundingBox;
use crate::detection::DetectedRegion;

/// Disjoint-set forest over box indices
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        DisjointSet {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }
}

/// Merge boxes until a fixed point is reached
///
/// Two boxes are fused when they overlap by more than `overlap_threshold`
/// of the smaller area or lie within `margin` pixels of each other. Each
/// round unions every related pair and replaces each group with its union
/// rectangle; rounds repeat because a grown box may now touch a box neither
/// of its parts touched.
///
/// # Returns
/// The merged boxes ordered top-to-bottom, then left-to-right
pub fn merge_until_stable(boxes: Vec<BoundingBox>, overlap_threshold: f64, margin: u32) -> Vec<BoundingBox> {
    let mut current = boxes;
    let mut rounds = 0;

    loop {
        rounds += 1;
        let n = current.len();
        let mut sets = DisjointSet::new(n);
        let mut merged_any = false;

        for i in 0..n {
            for j in (i + 1)..n {
                let a = &current[i];
                let b = &current[j];
                if a.significant_overlap(b, overlap_threshold) || a.is_adjacent(b, margin) {
                    merged_any |= sets.union(i, j);
                }
            }
        }

        if !merged_any {
            break;
        }

        let mut groups: Vec<(usize, BoundingBox)> = Vec::new();
        for i in 0..n {
            let root = sets.find(i);
            match groups.iter_mut().find(|(r, _)| *r == root) {
                Some((_, bbox)) => *bbox = bbox.merge(&current[i]),
                None => groups.push((root, current[i])),
            }
        }
        current = groups.into_iter().map(|(_, bbox)| bbox).collect();
    }

    debug!("Merged into {} boxes after {} round(s)", current.len(), rounds);
    current.sort_by_key(|b| (b.y, b.x));
    current
}

/// Reconcile regions from several sources
///
/// Candidates are visited in source priority order (oracle first, then pixel
/// detectors; ties keep their input order) and a candidate is accepted only
/// if it does not significantly overlap an already accepted one. Confidence
/// values are normalized to [0, 1] on the way through.
pub fn reconcile(candidates: Vec<DetectedRegion>, threshold: f64) -> Vec<DetectedRegion> {
    let mut ordered = candidates;
    ordered.sort_by_key(|r| r.source.priority());

    let total = ordered.len();
    let mut accepted: Vec<DetectedRegion> = Vec::with_capacity(total);
    for mut candidate in ordered {
        let suppressed = accepted
            .iter()
            .any(|kept| kept.bbox.significant_overlap(&candidate.bbox, threshold));
        if suppressed {
            debug!("Suppressed {} region at ({}, {})", candidate.source, candidate.bbox.x, candidate.bbox.y);
            continue;
        }
        candidate.confidence = candidate.normalized_confidence();
        accepted.push(candidate);
    }

    debug!("Reconciled {} candidates into {} regions", total, accepted.len());
    accepted
}
