use std::{fmt::Display, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{
    core::{max_from_partial, max_squaredist, min_from_partial, CoordinateBox, Max, Min, Shape},
    Calc, Point, PtF, PtI, TPtF, TPtI, TPtS,
};
use crate::{
    geomerr,
    result::{to_geom, GeomError, GeomResult},
    ShapeI,
};

pub type BbI = BB<TPtI>;
pub type BbS = BB<TPtS>;
pub type BbF = BB<TPtF>;

/// Axis-aligned bounding box, generic over an integer or float coordinate type.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BB<T> {
    pub x: T,
    pub y: T,
    pub w: T,
    pub h: T,
}

impl<T> BB<T>
where
    T: Calc + CoordinateBox,
{
    /// `[x, y, w, h]`
    pub fn from_arr(a: &[T; 4]) -> Self {
        BB {
            x: a[0],
            y: a[1],
            w: a[2],
            h: a[3],
        }
    }

    pub fn merge(&self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let x_max = self.x_max().max(other.x_max());
        let y_max = self.y_max().max(other.y_max());
        BB::from_points((x, y).into(), (x_max, y_max).into())
    }

    pub fn from_points_iter(points: impl Iterator<Item = Point<T>> + Clone) -> GeomResult<Self> {
        let x_iter = points.clone().map(|p| p.x);
        let y_iter = points.map(|p| p.y);
        let min_x = x_iter
            .clone()
            .min_by(min_from_partial)
            .ok_or_else(|| geomerr!("empty iterator"))?;
        let min_y = y_iter
            .clone()
            .min_by(min_from_partial)
            .ok_or_else(|| geomerr!("empty iterator"))?;
        let max_x = x_iter
            .max_by(max_from_partial)
            .ok_or_else(|| geomerr!("empty iterator"))?;
        let max_y = y_iter
            .max_by(max_from_partial)
            .ok_or_else(|| geomerr!("empty iterator"))?;
        Ok(BB::from_points(
            Point { x: min_x, y: min_y },
            Point { x: max_x, y: max_y },
        ))
    }
    pub fn from_vec(points: &[Point<T>]) -> GeomResult<Self> {
        Self::from_points_iter(points.iter().copied())
    }

    pub fn from_shape_int(shape: ShapeI) -> Self {
        BB {
            x: T::from(0),
            y: T::from(0),
            w: T::from(shape.w),
            h: T::from(shape.h),
        }
    }

    pub fn from_shape(shape: Shape<T>) -> Self {
        BB {
            x: T::from(0),
            y: T::from(0),
            w: shape.w,
            h: shape.h,
        }
    }

    pub fn y_max(&self) -> T {
        // y_max is still part of the box, hence the size addon correction
        self.y + self.h - T::size_addon()
    }

    pub fn x_max(&self) -> T {
        self.x + self.w - T::size_addon()
    }

    /// Area in coordinate units (pixel count for integer boxes).
    pub fn area(&self) -> T {
        self.w * self.h
    }

    pub fn intersect(self, other: BB<T>) -> BB<T> {
        BB::from_points(
            Point {
                x: self.x.max(other.x),
                y: self.y.max(other.y),
            },
            Point {
                x: self.x_max().min(other.x_max()),
                y: self.y_max().min(other.y_max()),
            },
        )
    }

    /// `None` if the boxes don't overlap at all.
    pub fn intersection_area(&self, other: &BB<T>) -> Option<T> {
        if !self.has_overlap(other) {
            return None;
        }
        let inter = self.intersect(*other);
        if inter.x_max() < inter.x || inter.y_max() < inter.y {
            None
        } else {
            Some(inter.area())
        }
    }

    pub fn points(&self) -> [Point<T>; 4] {
        [
            self.corner(0),
            self.corner(1),
            self.corner(2),
            self.corner(3),
        ]
    }

    /// Return points of greatest distance between self and other
    pub fn max_squaredist<'a>(
        &'a self,
        other: impl Iterator<Item = Point<T>> + 'a + Clone,
    ) -> GeomResult<(Point<T>, Point<T>, T)> {
        max_squaredist(self.points_iter(), other)
    }

    /// Iteration order of corners
    /// 0   3
    /// v   ^
    /// 1 > 2
    #[allow(clippy::needless_lifetimes)]
    pub fn points_iter<'a>(&'a self) -> impl Iterator<Item = Point<T>> + 'a + Clone {
        (0..4).map(|idx| self.corner(idx))
    }

    pub fn corner(&self, idx: usize) -> Point<T> {
        let (x, y, w, h) = (self.x, self.y, self.w, self.h);
        match idx {
            0 => Point { x, y },
            1 => Point {
                x,
                y: y + h - T::size_addon(),
            },
            2 => (x + w - T::size_addon(), y + h - T::size_addon()).into(),
            3 => (x + w - T::size_addon(), y).into(),
            _ => panic!("bounding boxes only have 4, {idx} is out of bounds"),
        }
    }

    pub fn shape(&self) -> Shape<T> {
        Shape {
            w: self.w,
            h: self.h,
        }
    }

    pub fn from_points(p1: Point<T>, p2: Point<T>) -> Self {
        let x_min = p1.x.min(p2.x);
        let y_min = p1.y.min(p2.y);
        let x_max = p1.x.max(p2.x);
        let y_max = p1.y.max(p2.y);
        Self {
            x: x_min,
            y: y_min,
            w: x_max - x_min + T::size_addon(), // x_min and x_max are both contained in the bb
            h: y_max - y_min + T::size_addon(),
        }
    }

    pub fn x_range(&self) -> Range<T> {
        self.x..(self.x + self.w)
    }

    pub fn y_range(&self) -> Range<T> {
        self.y..(self.y + self.h)
    }

    pub fn center_f(&self) -> (f64, f64)
    where
        T: Into<f64>,
    {
        (
            self.w.into() * 0.5 + self.x.into(),
            self.h.into() * 0.5 + self.y.into(),
        )
    }

    pub fn min(&self) -> Point<T> {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn max(&self) -> Point<T> {
        Point {
            x: self.x_max(),
            y: self.y_max(),
        }
    }

    pub fn covers_y(&self, y: T) -> bool {
        self.y_max() >= y && self.y <= y
    }
    pub fn covers_x(&self, x: T) -> bool {
        self.x_max() >= x && self.x <= x
    }

    pub fn contains<P>(&self, p: P) -> bool
    where
        P: Into<Point<T>>,
    {
        let p = p.into();
        self.covers_x(p.x) && self.covers_y(p.y)
    }

    pub fn contains_bb(&self, other: Self) -> bool {
        self.contains(other.min()) && self.contains(other.max())
    }

    pub fn is_contained_in_image(&self, shape: ShapeI) -> bool {
        self.x + self.w <= shape.w.into() && self.y + self.h <= shape.h.into()
    }

    pub fn has_overlap(&self, other: &Self) -> bool {
        if self.points_iter().any(|c| other.contains(c)) {
            true
        } else {
            other.points_iter().any(|c| self.contains(c))
        }
    }
}

/// Intersection-over-union of two boxes, zero for disjoint boxes.
pub fn bbox_iou(a: &BbF, b: &BbF) -> f64 {
    let inter = match a.intersection_area(b) {
        Some(area) => area,
        None => return 0.0,
    };
    let union = a.area() + b.area() - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Smallest box containing both inputs.
pub fn max_bbox(boxes: &[BbF]) -> Option<BbF> {
    boxes
        .iter()
        .copied()
        .reduce(|acc, b| acc.merge(b))
}

/// Unweighted mean box: mean of each corner coordinate.
pub fn mean_bbox(boxes: &[BbF]) -> Option<BbF> {
    if boxes.is_empty() {
        return None;
    }
    let n = boxes.len() as f64;
    let x = boxes.iter().map(|b| b.x).sum::<f64>() / n;
    let y = boxes.iter().map(|b| b.y).sum::<f64>() / n;
    let w = boxes.iter().map(|b| b.w).sum::<f64>() / n;
    let h = boxes.iter().map(|b| b.h).sum::<f64>() / n;
    Some(BbF { x, y, w, h })
}

impl From<BbF> for BbI {
    fn from(box_f: BbF) -> Self {
        let p_min: PtI = box_f.min().into();
        let p_max: PtI = box_f.max().into();
        let x = p_min.x;
        let y = p_min.y;
        let x_max = p_max.x - TPtI::size_addon();
        let y_max = p_max.y - TPtI::size_addon();
        BbI::from_points((x, y).into(), (x_max, y_max).into())
    }
}
impl From<BbI> for BbF {
    fn from(box_int: BbI) -> Self {
        let x = box_int.min().x;
        let y = box_int.min().y;
        let x_max = box_int.max().x + TPtI::size_addon();
        let y_max = box_int.max().y + TPtI::size_addon();
        BbF::from_points((x, y).into(), (x_max, y_max).into())
    }
}

impl From<BbI> for BbS {
    fn from(bb: BbI) -> Self {
        BbS::from_points(bb.min().into(), bb.max().into())
    }
}
impl From<BbS> for BbI {
    fn from(bb: BbS) -> Self {
        BbI::from_points(bb.min().into(), bb.max().into())
    }
}

impl BbI {
    pub fn expand(&self, x_expand: TPtI, y_expand: TPtI, shape: ShapeI) -> Self {
        let (x, y) = (
            self.x.saturating_sub(x_expand),
            self.y.saturating_sub(y_expand),
        );
        let (w, h) = (self.w + 2 * x_expand, self.h + 2 * y_expand);
        let (w, h) = (w.clamp(1, shape.w), h.clamp(1, shape.h));
        Self { x, y, w, h }
    }
}

impl<T> From<&[T; 4]> for BB<T>
where
    T: Calc + CoordinateBox,
{
    fn from(a: &[T; 4]) -> Self {
        Self::from_arr(a)
    }
}

impl Display for BbI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bb_str = format!("[{}, {}, {} ,{}]", self.x, self.y, self.w, self.h);
        f.write_str(bb_str.as_str())
    }
}
impl FromStr for BbI {
    type Err = GeomError;
    fn from_str(s: &str) -> GeomResult<Self> {
        let err_parse = geomerr!("could not parse '{}' into a bounding box", s);
        let mut int_iter = s[1..(s.len() - 1)]
            .split(',')
            .map(|cse| cse.trim().parse::<u32>().map_err(to_geom));
        let x = int_iter.next().ok_or_else(|| err_parse.clone())??;
        let y = int_iter.next().ok_or_else(|| err_parse.clone())??;
        let w = int_iter.next().ok_or_else(|| err_parse.clone())??;
        let h = int_iter.next().ok_or(err_parse)??;
        Ok(BbI { x, y, w, h })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand() {
        let bb = BbI::from_arr(&[0, 0, 10, 10]).expand(1, 1, Shape::new(10, 10));
        assert_eq!(bb, BbI::from_arr(&[0, 0, 10, 10]));

        let bb = BbI::from_arr(&[5, 5, 10, 10]).expand(1, 2, Shape::new(20, 20));
        assert_eq!(bb, BbI::from_arr(&[4, 3, 12, 14]));
    }

    #[test]
    fn test_has_overlap() {
        let a = BbI::from_arr(&[0, 0, 10, 10]);
        let b = BbI::from_arr(&[5, 5, 10, 10]);
        let c = BbI::from_arr(&[100, 100, 5, 5]);
        assert!(a.has_overlap(&b));
        assert!(!a.has_overlap(&c));
    }

    #[test]
    fn test_bbox_iou_identical() {
        let a = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        assert!((bbox_iou(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bbox_iou_disjoint() {
        let a = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        let b = BbF::from_arr(&[100.0, 100.0, 10.0, 10.0]);
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_half_overlap() {
        let a = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        let b = BbF::from_arr(&[5.0, 0.0, 10.0, 10.0]);
        // intersection 5x10=50, union 200-50=150
        assert!((bbox_iou(&a, &b) - (50.0 / 150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_mean_bbox() {
        let a = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        let b = BbF::from_arr(&[10.0, 10.0, 10.0, 10.0]);
        let m = mean_bbox(&[a, b]).unwrap();
        assert!((m.x - 5.0).abs() < 1e-9);
        assert!((m.y - 5.0).abs() < 1e-9);
    }
}
