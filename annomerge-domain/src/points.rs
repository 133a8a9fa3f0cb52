use serde::{Deserialize, Serialize};

use crate::{
    bb::{bbox_iou, mean_bbox, BbF},
    core::PtF,
};

/// A fixed-order set of keypoints, optionally with per-point visibility.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Points {
    pub points: Vec<PtF>,
    pub visibility: Vec<bool>,
}

impl Points {
    pub fn new(points: Vec<PtF>) -> Self {
        let n = points.len();
        Self {
            points,
            visibility: vec![true; n],
        }
    }

    pub fn bbox(&self) -> Option<BbF> {
        if self.points.is_empty() {
            None
        } else {
            BbF::from_vec(&self.points).ok()
        }
    }
}

/// Object Keypoint Similarity between two same-length keypoint sets, scaled
/// by `scale_bbox`'s area and a per-keypoint `sigma` vector (OKS constant
/// falls back to `0.1` per keypoint when `sigma` is shorter than the point
/// count — mirrors COCO's default behavior for unconfigured keypoints).
pub fn oks(a: &Points, b: &Points, sigma: &[f64], scale_bbox: BbF) -> f64 {
    let n = a.points.len().min(b.points.len());
    if n == 0 {
        return 0.0;
    }
    let area = scale_bbox.area();
    if area <= 0.0 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..n {
        let vis_a = a.visibility.get(i).copied().unwrap_or(true);
        let vis_b = b.visibility.get(i).copied().unwrap_or(true);
        if !vis_a || !vis_b {
            continue;
        }
        let s = sigma.get(i).copied().unwrap_or(0.1);
        let d2 = a.points[i].dist_square(&b.points[i]);
        let denom = 2.0 * area * (2.0 * s) * (2.0 * s);
        sum += (-d2 / denom.max(1e-12)).exp();
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Points matcher distance per the engine's shape-distance contract: zero
/// when the instance boxes don't overlap, otherwise OKS scaled by the mean
/// of the two instance boxes.
pub fn points_distance(
    a: &Points,
    b: &Points,
    sigma: &[f64],
    instance_bbox_a: BbF,
    instance_bbox_b: BbF,
) -> f64 {
    if bbox_iou(&instance_bbox_a, &instance_bbox_b) <= 0.0 {
        return 0.0;
    }
    let scale = mean_bbox(&[instance_bbox_a, instance_bbox_b]).unwrap_or(instance_bbox_a);
    oks(a, b, sigma, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oks_identical() {
        let pts = Points::new(vec![PtF { x: 1.0, y: 1.0 }, PtF { x: 5.0, y: 5.0 }]);
        let bbox = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        assert!((oks(&pts, &pts, &[], bbox) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_oks_far_apart() {
        let a = Points::new(vec![PtF { x: 0.0, y: 0.0 }]);
        let b = Points::new(vec![PtF { x: 100.0, y: 100.0 }]);
        let bbox = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        assert!(oks(&a, &b, &[], bbox) < 0.01);
    }

    #[test]
    fn test_points_distance_no_overlap_is_zero() {
        let a = Points::new(vec![PtF { x: 1.0, y: 1.0 }]);
        let b = Points::new(vec![PtF { x: 1.0, y: 1.0 }]);
        let bbox_a = BbF::from_arr(&[0.0, 0.0, 5.0, 5.0]);
        let bbox_b = BbF::from_arr(&[100.0, 100.0, 5.0, 5.0]);
        assert_eq!(points_distance(&a, &b, &[], bbox_a, bbox_b), 0.0);
    }
}
