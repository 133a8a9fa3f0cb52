use std::collections::BTreeMap;

use annomerge::config::Config;
use annomerge::dataset::{InMemorySource, Source};
use annomerge::model::{Annotation, AnnotationType, Categories, CategoryBundle, Item, Payload};
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

fn single_bbox_source(id: &str, x: f64, y: f64, label: usize, cats: Categories) -> InMemorySource {
    InMemorySource {
        items: vec![Item {
            id: id.to_string(),
            subset: None,
            annotations: vec![Annotation::new(
                Payload::Bbox(BbF::from_arr(&[x, y, 4.0, 4.0])),
                Some(label),
            )],
            image: None,
        }],
        categories: cats,
    }
}

/// Every merged annotation's score lands in `[output_conf_thresh, 1]`.
#[test]
fn merged_scores_respect_threshold_and_upper_bound() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let a = single_bbox_source("img1", 0.0, 0.0, 0, cats.clone());
    let b = single_bbox_source("img1", 0.2, 0.2, 0, cats);
    let cfg = Config {
        output_conf_thresh: 0.1,
        ..Config::default()
    };
    let report = IntersectMerge::new(&cfg)
        .merge(&[&a as &dyn Source, &b as &dyn Source])
        .unwrap();
    for item in &report.items {
        for ann in &item.annotations {
            assert!(ann.score() >= cfg.output_conf_thresh);
            assert!(ann.score() <= 1.0 + 1e-9);
        }
    }
}

/// Merging a source against itself ([D, D]) is idempotent: every annotation
/// matches its own twin and the merged item carries the same count.
#[test]
fn merging_a_source_with_itself_is_idempotent() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let src = InMemorySource {
        items: vec![Item {
            id: "img1".into(),
            subset: None,
            annotations: vec![
                Annotation::new(Payload::Bbox(BbF::from_arr(&[0.0, 0.0, 4.0, 4.0])), Some(0)),
                Annotation::new(Payload::Bbox(BbF::from_arr(&[50.0, 50.0, 4.0, 4.0])), Some(0)),
            ],
            image: None,
        }],
        categories: cats,
    };
    let cfg = Config::default();
    let report = IntersectMerge::new(&cfg)
        .merge(&[&src as &dyn Source, &src as &dyn Source])
        .unwrap();
    assert_eq!(report.items.len(), 1);
    assert_eq!(report.items[0].annotations.len(), 2);
}

/// Reordering sources doesn't change how many merged annotations an item
/// ends up with.
#[test]
fn source_order_does_not_change_merged_annotation_count() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let a = single_bbox_source("img1", 0.0, 0.0, 0, cats.clone());
    let b = single_bbox_source("img1", 0.1, 0.1, 0, cats);
    let cfg = Config::default();
    let forward = IntersectMerge::new(&cfg)
        .merge(&[&a as &dyn Source, &b as &dyn Source])
        .unwrap();
    let backward = IntersectMerge::new(&cfg)
        .merge(&[&b as &dyn Source, &a as &dyn Source])
        .unwrap();
    assert_eq!(
        forward.items[0].annotations.len(),
        backward.items[0].annotations.len()
    );
}

/// A cluster never contains two handles from the same source (checked
/// indirectly: merging two same-source annotations that are near-identical
/// never collapses them into one).
#[test]
fn same_source_annotations_never_merge_with_each_other() {
    let cats = categories_with(AnnotationType::Bbox, &["car"]);
    let src = InMemorySource {
        items: vec![Item {
            id: "img1".into(),
            subset: None,
            annotations: vec![
                Annotation::new(Payload::Bbox(BbF::from_arr(&[0.0, 0.0, 4.0, 4.0])), Some(0)),
                Annotation::new(Payload::Bbox(BbF::from_arr(&[0.05, 0.05, 4.0, 4.0])), Some(0)),
            ],
            image: None,
        }],
        categories: cats,
    };
    let cfg = Config::default();
    let report = IntersectMerge::new(&cfg).merge(&[&src as &dyn Source]).unwrap();
    assert_eq!(report.items[0].annotations.len(), 2);
}
