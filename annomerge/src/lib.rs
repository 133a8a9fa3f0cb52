pub mod config;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod matcher;
pub mod merger;
pub mod model;
pub mod orchestrator;
pub mod result;
pub mod segment_matcher;
pub mod stats;
pub mod tracing_setup;

pub use config::{Config, GroupLabelSpec, GroupSpec};
pub use dataset::{InMemorySource, Source};
pub use error::{MergeFatalError, MergeIssue, MergeResult};
pub use model::{
    Annotation, AnnotationType, Attributes, AttrValue, Categories, CategoryBundle, Item, ItemId,
    MergedItem, Payload, SCORE_ATTR,
};
pub use orchestrator::{IntersectMerge, MergeReport};
