use serde::{Deserialize, Serialize};

use crate::{
    bb::{bbox_iou, BbF, BbI},
    core::{max_squaredist, PtF, PtI},
    geomerr,
    result::GeomResult,
};

fn intersect_y_axis_parallel(p: PtF, p1: PtF, p2: PtF) -> bool {
    ((p1.y > p.y) != (p2.y > p.y))
        && (p.x < (p2.x - p1.x) * (p.y - p1.y) / (p2.y - p1.y) + p1.x)
}

/// Closed polygon in image coordinates. `points` is never empty.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Polygon {
    points: Vec<PtF>,
    enclosing_bb: BbF,
}

impl Polygon {
    pub fn from_vec(points: Vec<PtF>) -> GeomResult<Self> {
        if points.is_empty() {
            return Err(geomerr!("polygon needs at least one point"));
        }
        let enclosing_bb = BbF::from_vec(&points)?;
        Ok(Self {
            points,
            enclosing_bb,
        })
    }

    pub fn points(&self) -> &[PtF] {
        &self.points
    }

    pub fn enclosing_bb(&self) -> BbF {
        self.enclosing_bb
    }

    #[allow(clippy::needless_lifetimes)]
    pub fn lineseg_iter<'a>(&'a self) -> impl Iterator<Item = (PtF, PtF)> + 'a {
        (0..self.points.len()).map(|i| {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % self.points.len()];
            (p1, p2)
        })
    }

    /// Even-odd (ray-casting) point-in-polygon test.
    pub fn contains(&self, p: PtF) -> bool {
        self.lineseg_iter()
            .filter(|(p1, p2)| intersect_y_axis_parallel(p, *p1, *p2))
            .count()
            % 2
            == 1
    }

    pub fn max_squaredist(&self) -> GeomResult<(PtF, PtF, f64)> {
        max_squaredist(self.points.iter().copied(), self.points.iter().copied())
    }

    /// Shoelace formula, absolute value.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut acc = 0.0;
        for i in 0..n {
            let p1 = self.points[i];
            let p2 = self.points[(i + 1) % n];
            acc += p1.x * p2.y - p2.x * p1.y;
        }
        (acc * 0.5).abs()
    }
}

impl From<BbF> for Polygon {
    fn from(bb: BbF) -> Self {
        Self {
            points: bb.points().to_vec(),
            enclosing_bb: bb,
        }
    }
}

/// Rasterize a polygon onto a pixel grid covering `bb` (image-relative box),
/// one byte per pixel, row-major, `1` for pixels whose center falls inside.
pub fn rasterize(poly: &Polygon, bb: BbI) -> Vec<u8> {
    let w = bb.w as usize;
    let h = bb.h as usize;
    let mut mask = vec![0u8; w * h];
    for row in 0..h {
        for col in 0..w {
            let p = PtF {
                x: bb.x as f64 + col as f64 + 0.5,
                y: bb.y as f64 + row as f64 + 0.5,
            };
            if poly.contains(p) {
                mask[row * w + col] = 1;
            }
        }
    }
    mask
}

/// IoU of two polygons, computed by rasterizing both onto their shared
/// bounding box and comparing pixel coverage (mirrors how `Bbox`/`Polygon`/
/// `Mask` share one `segment_iou` notion in the system this was modeled on).
pub fn polygon_iou(a: &Polygon, b: &Polygon) -> f64 {
    let union_bb_f = a.enclosing_bb().merge(b.enclosing_bb());
    if union_bb_f.area() <= 0.0 {
        return 0.0;
    }
    let union_bb: BbI = union_bb_f.into();
    if union_bb.w == 0 || union_bb.h == 0 {
        return 0.0;
    }
    let mask_a = rasterize(a, union_bb);
    let mask_b = rasterize(b, union_bb);
    let mut inter = 0u64;
    let mut union = 0u64;
    for (pa, pb) in mask_a.iter().zip(mask_b.iter()) {
        let a_on = *pa != 0;
        let b_on = *pb != 0;
        if a_on || b_on {
            union += 1;
        }
        if a_on && b_on {
            inter += 1;
        }
    }
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

/// Quick reject: polygon bounding boxes don't overlap at all.
pub fn bbox_hint(a: &Polygon, b: &Polygon) -> f64 {
    bbox_iou(&a.enclosing_bb(), &b.enclosing_bb())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, s: f64) -> Polygon {
        Polygon::from_vec(vec![
            PtF { x, y },
            PtF { x, y: y + s },
            PtF { x: x + s, y: y + s },
            PtF { x: x + s, y },
        ])
        .unwrap()
    }

    #[test]
    fn test_contains() {
        let poly = square(0.0, 0.0, 10.0);
        assert!(poly.contains(PtF { x: 5.0, y: 5.0 }));
        assert!(!poly.contains(PtF { x: 15.0, y: 15.0 }));
    }

    #[test]
    fn test_area() {
        let poly = square(0.0, 0.0, 10.0);
        assert!((poly.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_iou_identical() {
        let poly = square(0.0, 0.0, 10.0);
        assert!((polygon_iou(&poly, &poly) - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_polygon_iou_disjoint() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(100.0, 100.0, 10.0);
        assert_eq!(polygon_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_polygon_iou_half_overlap() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(5.0, 0.0, 10.0);
        let iou = polygon_iou(&a, &b);
        assert!((iou - (50.0 / 150.0)).abs() < 0.05);
    }
}
