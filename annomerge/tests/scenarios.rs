use std::collections::BTreeMap;

use annomerge::config::{Config, GroupLabelSpec};
use annomerge::dataset::{InMemorySource, Source};
use annomerge::error::{MergeFatalError, MergeIssue};
use annomerge::model::{
    Annotation, AnnotationType, Categories, CategoryBundle, Item, Payload,
};
use annomerge::orchestrator::IntersectMerge;
use annomerge_domain::BbF;

fn categories_with(ann_type: AnnotationType, labels: &[&str]) -> Categories {
    let mut map = BTreeMap::new();
    map.insert(
        ann_type,
        CategoryBundle {
            labels: labels.iter().map(|s| s.to_string()).collect(),
        },
    );
    Categories(map)
}

fn bbox_item(id: &str, x: f64, y: f64, label: usize) -> Item {
    Item {
        id: id.to_string(),
        subset: None,
        annotations: vec![Annotation::new(
            Payload::Bbox(BbF::from_arr(&[x, y, 4.0, 4.0])),
            Some(label),
        )],
        image: None,
    }
}

/// S1: two near-identical bboxes from two sources merge into one annotation.
#[test]
fn two_identical_bboxes_merge_into_one() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let src_a = InMemorySource {
        items: vec![bbox_item("img1", 0.0, 0.0, 0)],
        categories: cats.clone(),
    };
    let src_b = InMemorySource {
        items: vec![bbox_item("img1", 0.1, 0.1, 0)],
        categories: cats,
    };
    let cfg = Config::default();
    let report = IntersectMerge::new(&cfg)
        .merge(&[&src_a as &dyn Source, &src_b as &dyn Source])
        .unwrap();
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].annotations.len(), 1);
    assert!(report.issues.is_empty());
}

/// S2: an item present in only one source reports a missing annotation for
/// the other, but still produces a merged item.
#[test]
fn missing_annotation_in_one_source_is_reported() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let src_a = InMemorySource {
        items: vec![bbox_item("img1", 0.0, 0.0, 0)],
        categories: cats.clone(),
    };
    let src_b = InMemorySource {
        items: vec![Item {
            id: "img1".into(),
            subset: None,
            annotations: vec![],
            image: None,
        }],
        categories: cats,
    };
    let cfg = Config::default();
    let report = IntersectMerge::new(&cfg)
        .merge(&[&src_a as &dyn Source, &src_b as &dyn Source])
        .unwrap();
    assert_eq!(report.items.len(), 1);
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, MergeIssue::NoMatchingAnn { .. })));
}

/// S3: three sources disagree on the label of an otherwise matching bbox;
/// with quorum 3 the label vote fails and is reported.
#[test]
fn label_vote_failing_quorum_is_reported() {
    let cats = categories_with(AnnotationType::Bbox, &["car", "truck", "van"]);
    let src_a = InMemorySource { items: vec![bbox_item("img1", 0.0, 0.0, 0)], categories: cats.clone() };
    let src_b = InMemorySource { items: vec![bbox_item("img1", 0.1, 0.1, 1)], categories: cats.clone() };
    let src_c = InMemorySource { items: vec![bbox_item("img1", 0.1, 0.0, 2)], categories: cats };
    let cfg = Config {
        quorum: 3,
        ..Config::default()
    };
    let report = IntersectMerge::new(&cfg)
        .merge(&[&src_a as &dyn Source, &src_b as &dyn Source, &src_c as &dyn Source])
        .unwrap();
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, MergeIssue::FailedLabelVoting { .. })));
}

/// S4: a shape cluster ends up closer than `close_distance` to another
/// merged annotation on the same item, triggering a proximity report.
#[test]
fn near_duplicate_shapes_trigger_too_close() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let item = Item {
        id: "img1".into(),
        subset: None,
        annotations: vec![
            Annotation::new(Payload::Bbox(BbF::from_arr(&[0.0, 0.0, 4.0, 4.0])), Some(0)),
            Annotation::new(Payload::Bbox(BbF::from_arr(&[0.0, 0.0, 4.0, 4.0])), Some(0)),
        ],
        image: None,
    };
    let src = InMemorySource { items: vec![item], categories: cats };
    let cfg = Config {
        close_distance: 1.0,
        ..Config::default()
    };
    let report = IntersectMerge::new(&cfg).merge(&[&src as &dyn Source]).unwrap();
    assert!(report
        .issues
        .iter()
        .any(|issue| matches!(issue, MergeIssue::TooClose { .. })));
}

/// S5: a group spec naming an unknown label fails the merge before any
/// item is processed.
#[test]
fn unknown_group_label_is_a_fatal_configuration_error() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let src = InMemorySource { items: vec![bbox_item("img1", 0.0, 0.0, 0)], categories: cats };
    let cfg = Config {
        groups: vec![vec![GroupLabelSpec::required("does-not-exist")]],
        ..Config::default()
    };
    let result = IntersectMerge::new(&cfg).merge(&[&src as &dyn Source]);
    assert!(matches!(result, Err(MergeFatalError::UnknownGroupLabel { .. })));
}

/// S6: two disjoint sources for the same item id both contribute one
/// bbox each; with a loose threshold they should still cluster together.
#[test]
fn disjoint_sources_contribute_at_most_one_member_per_cluster() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let item = Item {
        id: "img1".into(),
        subset: None,
        annotations: vec![
            Annotation::new(Payload::Bbox(BbF::from_arr(&[0.0, 0.0, 4.0, 4.0])), Some(0)),
            Annotation::new(Payload::Bbox(BbF::from_arr(&[100.0, 100.0, 4.0, 4.0])), Some(0)),
        ],
        image: None,
    };
    let src = InMemorySource { items: vec![item], categories: cats };
    let cfg = Config::default();
    let report = IntersectMerge::new(&cfg).merge(&[&src as &dyn Source]).unwrap();
    assert_eq!(report.items[0].annotations.len(), 2);
}
