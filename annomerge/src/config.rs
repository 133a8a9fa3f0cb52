use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One member of a required-group specification: a label name, and whether
/// that label is optional within the group (groups may omit optional
/// members without failing validation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupLabelSpec {
    pub label_name: String,
    #[serde(default)]
    pub optional: bool,
}

impl GroupLabelSpec {
    pub fn required(label_name: impl Into<String>) -> Self {
        Self {
            label_name: label_name.into(),
            optional: false,
        }
    }

    pub fn optional(label_name: impl Into<String>) -> Self {
        Self {
            label_name: label_name.into(),
            optional: true,
        }
    }
}

/// A required cross-cluster group: a set of label specs that, once any
/// cluster in the group carries a given label, every non-optional label in
/// the set must be present somewhere in the group.
pub type GroupSpec = Vec<GroupLabelSpec>;

/// Tunables controlling the merge. Mirrors what a caller would load from a
/// project's merge configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum center-to-center distance (in the unit the caller's
    /// distance function returns) two segments may be apart and still be
    /// considered a candidate match.
    pub pairwise_dist: f64,
    /// Per-keypoint OKS sigmas, indexed by keypoint position; a shorter
    /// list than the point count falls back to a default sigma per point.
    pub sigma: Vec<f64>,
    /// Score threshold: merged annotations below this score are dropped in
    /// the final score-filter stage.
    pub output_conf_thresh: f64,
    /// Minimum number of sources a label vote or attribute vote needs to
    /// win; `0` means unanimity is not required, just a plurality.
    pub quorum: u32,
    /// Attribute names excluded from per-attribute majority voting (carried
    /// through unmodified from whichever source contributes the winning
    /// shape instead).
    pub ignored_attributes: HashSet<String>,
    /// Required cross-cluster label groups.
    pub groups: Vec<GroupSpec>,
    /// Distance below which two already-merged annotations in the same
    /// item are considered near-duplicates and reported as too close.
    pub close_distance: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pairwise_dist: 0.5,
            sigma: Vec::new(),
            output_conf_thresh: 0.0,
            quorum: 0,
            ignored_attributes: HashSet::new(),
            groups: Vec::new(),
            close_distance: 0.75,
        }
    }
}
