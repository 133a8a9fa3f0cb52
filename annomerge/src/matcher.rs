//! Graph-closure clustering: turns pairwise segment matches between source
//! pairs into item-level clusters, one annotation per source at most.

use std::collections::{HashMap, HashSet, VecDeque};

use annomerge_domain::{points_distance, polyline_distance, Segment};

use crate::config::Config;
use crate::identity::Handle;
use crate::model::{Annotation, Payload};
use crate::segment_matcher::{match_segments, Candidate};

fn to_segment(payload: &Payload) -> Option<Segment> {
    match payload {
        Payload::Bbox(b) => Some(Segment::Bbox(*b)),
        Payload::Polygon(p) => Some(Segment::Polygon(p.clone())),
        Payload::Mask(m) => Some(Segment::Mask(m.clone())),
        _ => None,
    }
}

/// Distance between two annotations of matching kind; lower means more
/// alike. `None` means the kind carries no defined distance (captions).
pub fn annotation_distance(a: &Annotation, b: &Annotation, cfg: &Config) -> Option<f64> {
    match (&a.payload, &b.payload) {
        (Payload::None, Payload::None) => Some(if a.label == b.label { 0.0 } else { 1.0 }),
        (Payload::Bbox(_), _) | (Payload::Polygon(_), _) | (Payload::Mask(_), _) => {
            let sa = to_segment(&a.payload)?;
            let sb = to_segment(&b.payload)?;
            Some(1.0 - sa.iou(&sb))
        }
        (Payload::Points(pa), Payload::Points(pb)) => {
            let bb_a = a.payload.bbox()?;
            let bb_b = b.payload.bbox()?;
            let sim = points_distance(pa, pb, &cfg.sigma, bb_a, bb_b);
            Some(1.0 - sim)
        }
        (Payload::Polyline(la), Payload::Polyline(lb)) => polyline_distance(la, lb).ok(),
        _ => None,
    }
}

/// A group of handles considered the same real-world annotation across
/// sources; at most one handle per source.
pub type Cluster = Vec<Handle>;

/// One source's annotations of a single kind on one aligned item, paired
/// with their handle.
pub type SourceMembers<'a> = Vec<(Handle, &'a Annotation)>;

/// Clusters shape-bearing annotations (anything with a defined pairwise
/// distance) across sources. Runs the segment matcher between every pair of
/// sources `i < j`, then takes connected components of the resulting match
/// graph, refusing to admit a node whose source is already present in the
/// component under construction.
pub fn cluster_annotations(
    members_by_source: &[SourceMembers<'_>],
    cfg: &Config,
) -> Vec<Cluster> {
    let all: Vec<Handle> = members_by_source
        .iter()
        .flat_map(|src| src.iter().map(|(h, _)| *h))
        .collect();
    let idx_of: HashMap<Handle, usize> =
        all.iter().enumerate().map(|(i, h)| (*h, i)).collect();
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); all.len()];

    let n_sources = members_by_source.len();
    for i in 0..n_sources {
        for j in (i + 1)..n_sources {
            let mut candidates = Vec::new();
            for (a_idx, (_, ann_a)) in members_by_source[i].iter().enumerate() {
                for (b_idx, (_, ann_b)) in members_by_source[j].iter().enumerate() {
                    if let Some(distance) = annotation_distance(ann_a, ann_b, cfg) {
                        candidates.push(Candidate {
                            a_idx,
                            b_idx,
                            score: ann_a.score().min(ann_b.score()),
                            distance,
                        });
                    }
                }
            }
            let matched = match_segments(candidates, cfg.pairwise_dist);
            for c in matched {
                let ha = members_by_source[i][c.a_idx].0;
                let hb = members_by_source[j][c.b_idx].0;
                let ia = idx_of[&ha];
                let ib = idx_of[&hb];
                adj[ia].push(ib);
                adj[ib].push(ia);
            }
        }
    }

    let mut visited = vec![false; all.len()];
    let mut clusters = Vec::new();
    for start in 0..all.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut comp_sources = HashSet::new();
        comp_sources.insert(all[start].source_idx);
        let mut comp = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(cur) = queue.pop_front() {
            for &next in &adj[cur] {
                if visited[next] || comp_sources.contains(&all[next].source_idx) {
                    continue;
                }
                visited[next] = true;
                comp_sources.insert(all[next].source_idx);
                comp.push(next);
                queue.push_back(next);
            }
        }
        clusters.push(comp.into_iter().map(|i| all[i]).collect());
    }
    clusters
}

/// Clusters plain `Label` annotations: exact label-index equality, one
/// annotation per source per cluster.
pub fn cluster_labels(members_by_source: &[SourceMembers<'_>]) -> Vec<Cluster> {
    let mut clusters: Vec<(Option<usize>, HashSet<usize>, Cluster)> = Vec::new();
    for src in members_by_source {
        for (handle, ann) in src {
            let slot = clusters
                .iter_mut()
                .find(|(label, sources, _)| *label == ann.label && !sources.contains(&handle.source_idx));
            match slot {
                Some((_, sources, members)) => {
                    sources.insert(handle.source_idx);
                    members.push(*handle);
                }
                None => {
                    let mut sources = HashSet::new();
                    sources.insert(handle.source_idx);
                    clusters.push((ann.label, sources, vec![*handle]));
                }
            }
        }
    }
    clusters.into_iter().map(|(_, _, members)| members).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Annotation;
    use annomerge_domain::BbF;

    fn bbox_ann(x: f64, y: f64) -> Annotation {
        Annotation::new(Payload::Bbox(BbF::from_arr(&[x, y, 4.0, 4.0])), Some(0))
    }

    #[test]
    fn test_cluster_two_sources_match() {
        let cfg = Config::default();
        let a0 = bbox_ann(0.0, 0.0);
        let b0 = bbox_ann(0.2, 0.2);
        let src0 = vec![(Handle::new(0, 0, 0), &a0)];
        let src1 = vec![(Handle::new(1, 0, 0), &b0)];
        let clusters = cluster_annotations(&[src0, src1], &cfg);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn test_cluster_disjoint_sources_kept_apart() {
        let cfg = Config::default();
        let a0 = bbox_ann(0.0, 0.0);
        let a1 = bbox_ann(100.0, 100.0);
        let src0 = vec![(Handle::new(0, 0, 0), &a0), (Handle::new(0, 0, 1), &a1)];
        let clusters = cluster_annotations(&[src0], &cfg);
        assert_eq!(clusters.len(), 2);
        for c in &clusters {
            assert_eq!(c.len(), 1);
        }
    }

    #[test]
    fn test_cluster_labels_groups_by_label() {
        let l0 = Annotation::new(Payload::None, Some(2));
        let l1 = Annotation::new(Payload::None, Some(2));
        let l2 = Annotation::new(Payload::None, Some(5));
        let src0 = vec![(Handle::new(0, 0, 0), &l0)];
        let src1 = vec![(Handle::new(1, 0, 0), &l1), (Handle::new(1, 0, 1), &l2)];
        let clusters = cluster_labels(&[src0, src1]);
        assert_eq!(clusters.len(), 2);
    }
}
