use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{
    bb::{max_bbox, BbF},
    core::{max_from_partial, Point, PtF},
    geomerr,
    result::GeomResult,
};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Line {
    pub points: Vec<PtF>,
}

impl Line {
    pub fn push(&mut self, p: PtF) {
        self.points.push(p);
    }
    #[must_use]
    pub fn new() -> Self {
        Self { points: vec![] }
    }
    #[allow(clippy::needless_lifetimes)]
    pub fn points_iter<'a>(&'a self) -> impl Iterator<Item = PtF> + 'a + Clone {
        self.points.iter().copied()
    }
    #[must_use]
    pub fn last_point(&self) -> Option<PtF> {
        self.points.last().copied()
    }
    pub fn dist_to_point(&self, p: PtF, nan_warn: Option<impl Fn(&str)>) -> Option<f64> {
        match self.points.len().cmp(&1) {
            Ordering::Greater => (0..(self.points.len() - 1))
                .map(|i| {
                    let ls: (PtF, PtF) = (self.points[i], self.points[i + 1]);
                    crate::core::dist_lineseg_point(&ls, p)
                })
                .min_by(|x, y| {
                    if let Some(o) = x.partial_cmp(y) {
                        o
                    } else {
                        if let Some(nan_warn) = &nan_warn {
                            nan_warn("NaN appeared in distance to line computation.");
                        }
                        std::cmp::Ordering::Greater
                    }
                }),
            Ordering::Equal => Some(p.dist_square(&self.points[0]).sqrt()),
            Ordering::Less => None,
        }
    }
    pub fn max_dist_squared(&self) -> Option<f64> {
        (0..self.points.len())
            .filter_map(|i| {
                (0..self.points.len())
                    .map(|j| self.points[i].dist_square(&self.points[j]))
                    .max_by(max_from_partial)
            })
            .max_by(max_from_partial)
    }
    #[must_use]
    pub fn mean(&self) -> Option<PtF> {
        let n_points = self.points.len() as u32;
        if n_points == 0 {
            None
        } else {
            Some(
                PtF::from(
                    self.points_iter()
                        .fold(Point { x: 0.0, y: 0.0 }, |p1, p2| p1 + p2),
                ) / f64::from(n_points),
            )
        }
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        (0..self.points.len() - 1)
            .map(|i| (self.points[i + 1] - self.points[i]).len_square().sqrt())
            .sum()
    }

    pub fn bbox(&self) -> GeomResult<BbF> {
        BbF::from_vec(&self.points)
    }

    /// Resample to exactly `n` evenly spaced points along the polyline's arc
    /// length (n >= 2); single-point or degenerate lines repeat the point.
    pub fn smooth(&self, n: usize) -> Line {
        if self.points.is_empty() {
            return Line::new();
        }
        if self.points.len() == 1 || n <= 1 {
            return Line {
                points: vec![self.points[0]; n.max(1)],
            };
        }
        let total_len = self.length();
        if total_len < 1e-12 {
            return Line {
                points: vec![self.points[0]; n],
            };
        }
        let step = total_len / (n as f64 - 1.0);
        let mut out = Vec::with_capacity(n);
        let mut seg_idx = 0usize;
        let mut seg_start_dist = 0.0_f64;
        let mut seg_len = (self.points[1] - self.points[0]).len_square().sqrt();
        for i in 0..n {
            let target = (i as f64) * step;
            while seg_idx < self.points.len() - 2 && seg_start_dist + seg_len < target {
                seg_start_dist += seg_len;
                seg_idx += 1;
                seg_len = (self.points[seg_idx + 1] - self.points[seg_idx])
                    .len_square()
                    .sqrt();
            }
            let local = if seg_len > 1e-12 {
                ((target - seg_start_dist) / seg_len).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let p0 = self.points[seg_idx];
            let p1 = self.points[seg_idx + 1];
            out.push(p0 + (p1 - p0) * local);
        }
        Line { points: out }
    }
}
impl From<PtF> for Line {
    fn from(p: PtF) -> Self {
        Self { points: vec![p] }
    }
}

/// Resample-and-compare distance between two polylines, mapped to a
/// similarity in `[0,1]` analogous to IoU (higher = more similar).
///
/// Both lines are resampled to `point_count = max(5, max(|a|,|b|)/2)` evenly
/// spaced points, per-point Euclidean distances are averaged, and the sum is
/// normalized by the shared bounding-box area weighted by the two lines'
/// total arc lengths.
pub fn polyline_distance(a: &Line, b: &Line) -> GeomResult<f64> {
    let bbox_a = a.bbox()?;
    let bbox_b = b.bbox()?;
    let bbox = max_bbox(&[bbox_a, bbox_b]).ok_or_else(|| geomerr!("empty polyline pair"))?;
    let area = bbox.area();
    if area <= 0.0 {
        return Ok(1.0);
    }
    let point_count = (a.points.len() / 2).max(b.points.len() / 2).max(5);
    let sa = a.smooth(point_count);
    let sb = b.smooth(point_count);
    let dists: Vec<f64> = sa
        .points
        .iter()
        .zip(sb.points.iter())
        .map(|(pa, pb)| (*pa - *pb).len_square().sqrt())
        .collect();
    let sum_dist: f64 = dists.iter().sum();
    let len_a = a.length();
    let len_b = b.length();
    let s = sum_dist * 0.5 * (len_a + len_b) / area;
    Ok((1.0 - s).abs().min(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CoordinateBox;

    fn line(pts: &[(f64, f64)]) -> Line {
        Line {
            points: pts.iter().map(|&(x, y)| PtF { x, y }).collect(),
        }
    }

    #[test]
    fn test_length() {
        let l = line(&[(0.0, 0.0), (3.0, 4.0)]);
        assert!((l.length() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_endpoints_preserved() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0)]);
        let s = l.smooth(5);
        assert_eq!(s.points.len(), 5);
        assert!(s.points[0].is_close_to(PtF { x: 0.0, y: 0.0 }));
        assert!(s.points[4].is_close_to(PtF { x: 10.0, y: 0.0 }));
    }

    #[test]
    fn test_polyline_distance_identical() {
        let l = line(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let d = polyline_distance(&l, &l).unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }
}
