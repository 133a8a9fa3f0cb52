//! `IntersectMerge`: aligns items across sources by id, clusters and merges
//! their annotations, discovers cross-cluster groups, and validates them.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::dataset::Source;
use crate::error::{MergeFatalError, MergeIssue, MergeResult};
use crate::identity::{Handle, IdentityMap};
use crate::matcher::{annotation_distance, cluster_annotations, cluster_labels, SourceMembers};
use crate::merger::{merge_labels, merge_shapes};
use crate::model::{Annotation, AnnotationType, Categories, Item, ItemId, MergedItem};

/// Annotation kinds the merge supports, in the fixed order every stage
/// iterates them — this is what makes two runs over the same input produce
/// byte-identical output regardless of incidental `HashMap` ordering
/// elsewhere.
const ANNOTATION_ORDER: [AnnotationType; 6] = [
    AnnotationType::Label,
    AnnotationType::Bbox,
    AnnotationType::Polygon,
    AnnotationType::Mask,
    AnnotationType::Polyline,
    AnnotationType::Points,
];

pub struct MergeReport {
    pub items: Vec<MergedItem>,
    pub categories: Categories,
    pub issues: Vec<MergeIssue>,
}

pub struct IntersectMerge<'a> {
    config: &'a Config,
}

impl<'a> IntersectMerge<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn merge(&self, sources: &[&dyn Source]) -> MergeResult<MergeReport> {
        let categories = self.check_categories(sources)?;
        self.validate_group_specs(&categories)?;
        if sources
            .iter()
            .flat_map(|s| s.items().iter())
            .flat_map(|it| it.annotations.iter())
            .any(|a| a.ann_type() == AnnotationType::Caption)
        {
            return Err(MergeFatalError::UnsupportedAnnotationType {
                ann_type: AnnotationType::Caption,
            });
        }

        let item_slices: Vec<&[Item]> = sources.iter().map(|s| s.items()).collect();
        let identity = IdentityMap::new(&item_slices);
        let aligned = align_items(&item_slices);

        let mut issues = Vec::new();
        let mut merged_items = Vec::new();

        for (item_id, per_source) in &aligned {
            for (src_idx, slot) in per_source.iter().enumerate() {
                if slot.is_none() {
                    issues.push(MergeIssue::NoMatchingItem {
                        item: item_id.clone(),
                        source_idx: src_idx,
                    });
                }
            }
            let (merged_item, mut item_issues) =
                self.merge_item(item_id, per_source, &identity, &categories);
            issues.append(&mut item_issues);
            merged_items.push(merged_item);
        }

        let before = merged_items.iter().map(|it| it.annotations.len()).sum::<usize>();
        for item in &mut merged_items {
            item.annotations
                .retain(|a| a.score() >= self.config.output_conf_thresh);
        }
        let after = merged_items.iter().map(|it| it.annotations.len()).sum::<usize>();
        if after < before {
            tracing::debug!(
                dropped = before - after,
                threshold = self.config.output_conf_thresh,
                "score filter dropped low-confidence merged annotations"
            );
        }

        Ok(MergeReport {
            items: merged_items,
            categories,
            issues,
        })
    }

    fn check_categories(&self, sources: &[&dyn Source]) -> MergeResult<Categories> {
        let all: Vec<Categories> = sources.iter().map(|s| s.categories().clone()).collect();
        Categories::merge(&all).map_err(|(ann_type, left, right)| MergeFatalError::CategoryMismatch {
            ann_type,
            left: left.labels,
            right: right.labels,
        })
    }

    fn validate_group_specs(&self, categories: &Categories) -> MergeResult<()> {
        let known: HashSet<&str> = categories
            .0
            .values()
            .flat_map(|bundle| bundle.labels.iter().map(|l| l.as_str()))
            .collect();
        for group in &self.config.groups {
            for spec in group {
                if !known.contains(spec.label_name.as_str()) {
                    return Err(MergeFatalError::UnknownGroupLabel {
                        label_name: spec.label_name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Clusters and merges every annotation kind on one aligned item,
    /// discovers cross-cluster groups, validates them, and checks the
    /// merged annotations aren't suspiciously close to one another.
    fn merge_item(
        &self,
        item_id: &ItemId,
        per_source: &[Option<usize>],
        identity: &IdentityMap<'_>,
        categories: &Categories,
    ) -> (MergedItem, Vec<MergeIssue>) {
        let mut issues = Vec::new();
        // (merged annotation, its handles, the original non-zero group ids seen among its members)
        let mut clusters_out: Vec<(Annotation, Vec<Handle>, Vec<u32>)> = Vec::new();

        for &ann_type in &ANNOTATION_ORDER {
            let members_by_source: Vec<SourceMembers<'_>> = per_source
                .iter()
                .enumerate()
                .map(|(src_idx, item_idx)| match item_idx {
                    Some(item_idx) => identity
                        .item_at(src_idx, *item_idx)
                        .annotations
                        .iter()
                        .enumerate()
                        .filter(|(_, a)| a.ann_type() == ann_type)
                        .map(|(ann_idx, a)| (Handle::new(src_idx, *item_idx, ann_idx), a))
                        .collect(),
                    None => Vec::new(),
                })
                .collect();

            if members_by_source.iter().all(|s| s.is_empty()) {
                continue;
            }

            let clusters = if ann_type == AnnotationType::Label {
                cluster_labels(&members_by_source)
            } else {
                cluster_annotations(&members_by_source, self.config)
            };

            let present_sources: HashSet<usize> = per_source
                .iter()
                .enumerate()
                .filter(|(_, idx)| idx.is_some())
                .map(|(src_idx, _)| src_idx)
                .collect();

            for cluster in &clusters {
                let covered: HashSet<usize> = cluster.iter().map(|h| h.source_idx).collect();
                for src_idx in present_sources.difference(&covered) {
                    issues.push(MergeIssue::NoMatchingAnn {
                        item: item_id.clone(),
                        source_idx: *src_idx,
                        ann_type,
                    });
                }

                let result = if ann_type == AnnotationType::Label {
                    merge_labels(cluster, identity, self.config, item_id)
                } else {
                    merge_shapes(cluster, identity, self.config, item_id)
                };
                match result {
                    Ok((merged_ann, mut cluster_issues)) => {
                        issues.append(&mut cluster_issues);
                        let groups: Vec<u32> = cluster
                            .iter()
                            .map(|h| identity.annotation(*h).group)
                            .filter(|g| *g != 0)
                            .collect();
                        clusters_out.push((merged_ann, cluster.clone(), groups));
                    }
                    Err(issue) => issues.push(issue),
                }
            }
        }

        let new_groups = discover_groups(&clusters_out.iter().map(|(_, _, g)| g.clone()).collect::<Vec<_>>());
        for ((ann, _, _), new_group) in clusters_out.iter_mut().zip(new_groups.iter()) {
            ann.group = *new_group;
        }

        issues.extend(self.validate_groups(item_id, &clusters_out, categories));

        let mut annotations: Vec<Annotation> =
            clusters_out.into_iter().map(|(ann, _, _)| ann).collect();
        issues.extend(self.check_proximity(item_id, &mut annotations));

        (
            MergedItem {
                id: item_id.0.clone(),
                subset: item_id.1.clone(),
                annotations,
                image: None,
            },
            issues,
        )
    }

    fn validate_groups(
        &self,
        item_id: &ItemId,
        clusters: &[(Annotation, Vec<Handle>, Vec<u32>)],
        categories: &Categories,
    ) -> Vec<MergeIssue> {
        let mut by_group: HashMap<u32, Vec<String>> = HashMap::new();
        for (ann, _, _) in clusters {
            if ann.group == 0 {
                continue;
            }
            if let Some(label) = self.label_name_of(ann, categories) {
                by_group.entry(ann.group).or_default().push(label);
            }
        }
        let mut issues = Vec::new();
        for (group_id, labels) in &by_group {
            let matches_any = self.config.groups.iter().any(|spec| {
                spec.iter()
                    .all(|member| member.optional || labels.contains(&member.label_name))
            });
            if !matches_any && !self.config.groups.is_empty() {
                issues.push(MergeIssue::WrongGroup {
                    item: item_id.clone(),
                    new_group: *group_id,
                    found_labels: labels.clone(),
                });
            }
        }
        issues
    }

    fn label_name_of(&self, ann: &Annotation, categories: &Categories) -> Option<String> {
        let bundle = categories.0.get(&ann.ann_type())?;
        let idx = ann.label?;
        bundle.labels.get(idx).cloned()
    }

    fn check_proximity(
        &self,
        item_id: &ItemId,
        annotations: &mut [Annotation],
    ) -> Vec<MergeIssue> {
        let mut issues = Vec::new();
        for i in 0..annotations.len() {
            for j in (i + 1)..annotations.len() {
                if let Some(distance) = annotation_distance(&annotations[i], &annotations[j], self.config) {
                    if distance < self.config.close_distance {
                        issues.push(MergeIssue::TooClose {
                            item: item_id.clone(),
                            a_idx: i,
                            b_idx: j,
                            distance,
                        });
                    }
                }
            }
        }
        issues
    }
}

/// Sorts every item id seen across sources ascending, then records, for
/// each source, which of its items (if any) carries that id.
fn align_items(sources: &[&[Item]]) -> Vec<(ItemId, Vec<Option<usize>>)> {
    let mut ids: Vec<ItemId> = Vec::new();
    for src in sources {
        for item in src.iter() {
            let id = item.item_id();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
    ids.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    ids.into_iter()
        .map(|id| {
            let per_source = sources
                .iter()
                .map(|src| src.iter().position(|it| it.item_id() == id))
                .collect();
            (id, per_source)
        })
        .collect()
}

/// Transitive closure over non-zero original group ids: two clusters end up
/// in the same new group if they share any original group id, directly or
/// through a chain of other clusters. New ids are assigned in the order
/// groups are first discovered, starting at 1; ungrouped clusters get 0.
fn discover_groups(original_groups: &[Vec<u32>]) -> Vec<u32> {
    let n = original_groups.len();
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }
    let mut first_seen: HashMap<u32, usize> = HashMap::new();
    for (idx, groups) in original_groups.iter().enumerate() {
        for &g in groups {
            match first_seen.get(&g) {
                Some(&other) => {
                    let ra = find(&mut parent, idx);
                    let rb = find(&mut parent, other);
                    if ra != rb {
                        parent[ra] = rb;
                    }
                }
                None => {
                    first_seen.insert(g, idx);
                }
            }
        }
    }
    let mut new_id_of_root: HashMap<usize, u32> = HashMap::new();
    let mut next_id = 1u32;
    let mut result = vec![0u32; n];
    for idx in 0..n {
        if original_groups[idx].is_empty() {
            continue;
        }
        let root = find(&mut parent, idx);
        let new_id = *new_id_of_root.entry(root).or_insert_with(|| {
            let id = next_id;
            next_id += 1;
            id
        });
        result[idx] = new_id;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_groups_links_transitively() {
        let groups = vec![vec![1u32], vec![1, 2], vec![2], vec![]];
        let new_groups = discover_groups(&groups);
        assert_eq!(new_groups[0], new_groups[1]);
        assert_eq!(new_groups[1], new_groups[2]);
        assert_eq!(new_groups[3], 0);
        assert_eq!(new_groups[0], 1);
    }

    #[test]
    fn test_discover_groups_separate_components_get_distinct_ids() {
        let groups = vec![vec![1u32], vec![2u32]];
        let new_groups = discover_groups(&groups);
        assert_ne!(new_groups[0], new_groups[1]);
        assert_eq!(new_groups[0], 1);
        assert_eq!(new_groups[1], 2);
    }

    #[test]
    fn test_align_items_sorts_ascending_and_flags_missing() {
        use crate::model::Item;
        let a = vec![
            Item { id: "b".into(), subset: None, annotations: vec![], image: None },
            Item { id: "a".into(), subset: None, annotations: vec![], image: None },
        ];
        let b = vec![Item { id: "a".into(), subset: None, annotations: vec![], image: None }];
        let sources: Vec<&[Item]> = vec![&a, &b];
        let aligned = align_items(&sources);
        assert_eq!(aligned[0].0 .0, "a");
        assert_eq!(aligned[1].0 .0, "b");
        assert_eq!(aligned[1].1[1], None);
    }
}
