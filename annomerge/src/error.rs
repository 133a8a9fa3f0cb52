use crate::identity::Handle;
use crate::model::{AnnotationType, ItemId};

/// A non-fatal issue discovered while merging one item. These are
/// accumulated and returned alongside the merged dataset rather than
/// aborting the run.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeIssue {
    /// Two merged annotations on the same item ended up closer together
    /// than the configured threshold after merging. Indices are positions
    /// into the merged item's own annotation list, not source handles.
    TooClose {
        item: ItemId,
        a_idx: usize,
        b_idx: usize,
        distance: f64,
    },
    /// A cluster's group membership didn't match any configured group spec.
    WrongGroup {
        item: ItemId,
        new_group: u32,
        found_labels: Vec<String>,
    },
    /// A source item participating in this merge round had no counterpart
    /// in another source for the aligned item id.
    NoMatchingItem { item: ItemId, source_idx: usize },
    /// A source present for this item contributed no annotation of the
    /// given kind to any cluster.
    NoMatchingAnn {
        item: ItemId,
        source_idx: usize,
        ann_type: AnnotationType,
    },
    /// A cluster's label vote did not reach quorum.
    FailedLabelVoting {
        item: ItemId,
        candidates: Vec<(String, u32)>,
    },
    /// A cluster's attribute vote did not reach quorum for a given name.
    FailedAttrVoting { item: ItemId, attribute: String },
}

impl std::fmt::Display for MergeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeIssue::TooClose { item, distance, .. } => {
                write!(f, "item {item:?}: merged annotations {distance:.4} apart, below threshold")
            }
            MergeIssue::WrongGroup { item, new_group, found_labels } => {
                write!(f, "item {item:?}: group {new_group} labels {found_labels:?} match no configured group")
            }
            MergeIssue::NoMatchingItem { item, source_idx } => {
                write!(f, "item {item:?}: source {source_idx} has no matching item")
            }
            MergeIssue::NoMatchingAnn { item, source_idx, ann_type } => {
                write!(f, "item {item:?}: source {source_idx} contributed no {ann_type} annotation to any cluster")
            }
            MergeIssue::FailedLabelVoting { item, candidates } => {
                write!(f, "item {item:?}: label vote failed quorum, candidates {candidates:?}")
            }
            MergeIssue::FailedAttrVoting { item, attribute } => {
                write!(f, "item {item:?}: attribute '{attribute}' vote failed quorum")
            }
        }
    }
}

/// A configuration-level problem that aborts the whole merge: nothing in
/// the input made this recoverable on a per-item basis.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeFatalError {
    CategoryMismatch {
        ann_type: AnnotationType,
        left: Vec<String>,
        right: Vec<String>,
    },
    UnknownGroupLabel { label_name: String },
    UnsupportedAnnotationType { ann_type: AnnotationType },
    Message(String),
}

impl std::fmt::Display for MergeFatalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeFatalError::CategoryMismatch { ann_type, left, right } => write!(
                f,
                "category catalogs disagree for {ann_type}: {left:?} vs {right:?}"
            ),
            MergeFatalError::UnknownGroupLabel { label_name } => {
                write!(f, "group spec references unknown label '{label_name}'")
            }
            MergeFatalError::UnsupportedAnnotationType { ann_type } => {
                write!(f, "annotation type {ann_type} is not supported by the merge")
            }
            MergeFatalError::Message(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for MergeFatalError {}

#[macro_export]
macro_rules! mergeerr {
    ($($arg:tt)*) => {
        $crate::error::MergeFatalError::Message(format!($($arg)*))
    };
}

pub type MergeResult<T> = Result<T, MergeFatalError>;
