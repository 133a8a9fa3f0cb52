//! Turns a matched cluster of source annotations into one merged annotation.

use std::collections::HashMap;

use annomerge_domain::{mean_bbox, BbF};

use crate::config::Config;
use crate::error::MergeIssue;
use crate::identity::{Handle, IdentityMap};
use crate::model::{Annotation, AttrValue, Attributes, ItemId, Payload};

/// Majority vote over `values`, breaking ties towards the value that
/// appeared first. Returns the winner and its vote count.
fn majority_vote<T: Clone + PartialEq>(values: &[T]) -> Option<(T, u32)> {
    let mut counts: Vec<(T, u32)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(existing, _)| existing == v) {
            Some((_, c)) => *c += 1,
            None => counts.push((v.clone(), 1)),
        }
    }
    counts.into_iter().max_by_key(|(_, c)| *c)
}

fn vote_label(
    members: &[&Annotation],
    quorum: u32,
    item: &ItemId,
) -> Result<Option<usize>, MergeIssue> {
    let labels: Vec<Option<usize>> = members.iter().map(|a| a.label).collect();
    match majority_vote(&labels) {
        Some((winner, count)) if count >= quorum.max(1) => Ok(winner),
        Some(_) | None => {
            let mut candidates: HashMap<String, u32> = HashMap::new();
            for l in &labels {
                *candidates.entry(format!("{l:?}")).or_insert(0) += 1;
            }
            Err(MergeIssue::FailedLabelVoting {
                item: item.clone(),
                candidates: candidates.into_iter().collect(),
            })
        }
    }
}

/// Votes each non-ignored attribute independently; attributes that fail
/// quorum are reported but do not block the rest of the merge.
fn vote_attributes(
    members: &[&Annotation],
    cfg: &Config,
    item: &ItemId,
) -> (Attributes, Vec<MergeIssue>) {
    let mut names: Vec<&str> = Vec::new();
    for a in members {
        for name in a.attributes.names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    let mut merged = Attributes::new();
    let mut issues = Vec::new();
    for name in names {
        if cfg.ignored_attributes.contains(name) {
            continue;
        }
        let values: Vec<AttrValue> = members
            .iter()
            .filter_map(|a| a.attributes.get(name).cloned())
            .collect();
        match majority_vote(&values) {
            Some((winner, count)) if count >= cfg.quorum.max(1) => {
                merged.insert(name.to_string(), winner);
            }
            _ => issues.push(MergeIssue::FailedAttrVoting {
                item: item.clone(),
                attribute: name.to_string(),
            }),
        }
    }
    (merged, issues)
}

fn mean_score(members: &[&Annotation]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|a| a.score()).sum::<f64>() / members.len() as f64
}

/// Picks the cluster member whose bounding box center is nearest the mean
/// bounding box of the whole cluster.
fn nearest_to_mean<'a>(members: &[&'a Annotation]) -> Option<&'a Annotation> {
    let boxes: Vec<BbF> = members.iter().filter_map(|a| a.payload.bbox()).collect();
    let mean = mean_bbox(&boxes)?;
    let (mcx, mcy) = mean.center_f();
    let sqdist = |bb: BbF| -> f64 {
        let (cx, cy) = bb.center_f();
        (cx - mcx).powi(2) + (cy - mcy).powi(2)
    };
    members
        .iter()
        .filter(|a| a.payload.bbox().is_some())
        .min_by(|a, b| {
            let da = sqdist(a.payload.bbox().unwrap());
            let db = sqdist(b.payload.bbox().unwrap());
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .copied()
}

/// Merges a cluster of plain `Label` annotations into one.
pub fn merge_labels(
    members: &[Handle],
    identity: &IdentityMap<'_>,
    cfg: &Config,
    item: &ItemId,
) -> Result<(Annotation, Vec<MergeIssue>), MergeIssue> {
    let anns: Vec<&Annotation> = members.iter().map(|h| identity.annotation(*h)).collect();
    let label = vote_label(&anns, cfg.quorum, item)?;
    let (attributes, issues) = vote_attributes(&anns, cfg, item);
    let mut merged = Annotation::new(Payload::None, label);
    merged.attributes = attributes;
    merged.attributes.set_score(mean_score(&anns));
    Ok((merged, issues))
}

/// Merges a cluster of shape-bearing annotations (Bbox/Polygon/Mask/Points/
/// Polyline) into one, choosing a representative shape for anything that
/// isn't a plain box.
pub fn merge_shapes(
    members: &[Handle],
    identity: &IdentityMap<'_>,
    cfg: &Config,
    item: &ItemId,
) -> Result<(Annotation, Vec<MergeIssue>), MergeIssue> {
    let anns: Vec<&Annotation> = members.iter().map(|h| identity.annotation(*h)).collect();
    let label = vote_label(&anns, cfg.quorum, item)?;
    let (attributes, issues) = vote_attributes(&anns, cfg, item);

    let all_boxes = anns
        .iter()
        .all(|a| matches!(a.payload, Payload::Bbox(_)));
    let payload = if all_boxes {
        let boxes: Vec<BbF> = anns
            .iter()
            .filter_map(|a| match &a.payload {
                Payload::Bbox(b) => Some(*b),
                _ => None,
            })
            .collect();
        Payload::Bbox(mean_bbox(&boxes).expect("non-empty cluster"))
    } else {
        nearest_to_mean(&anns)
            .map(|a| a.payload.clone())
            .unwrap_or(Payload::None)
    };

    let mut merged = Annotation::new(payload, label);
    merged.attributes = attributes;
    merged.attributes.set_score(mean_score(&anns));
    Ok((merged, issues))
}
