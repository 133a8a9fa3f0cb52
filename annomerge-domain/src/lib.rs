mod bb;
pub mod core;
mod mask;
mod points;
mod polygon;
mod polyline;
pub mod result;
pub mod stats;

pub use bb::{bbox_iou, max_bbox, mean_bbox, BbF, BbI, BbS, BB};
pub use core::{
    max_from_partial, min_from_partial, Calc, Circle, CoordinateBox, Point, PtF, PtI, PtS, ShapeF,
    ShapeI, TPtF, TPtI, TPtS,
};
pub use mask::{
    access_bb_idx, access_mask_abs, mask_to_rle, rle_bb_to_image, rle_image_to_bb, rle_to_mask,
    Mask,
};
pub use points::{oks, points_distance, Points};
pub use polygon::{bbox_hint, polygon_iou, rasterize, Polygon};
pub use polyline::{polyline_distance, Line};
pub use result::{geomerr, to_geom, GeomError, GeomResult};

/// One pixel-space shape, dispatched to the right IoU/distance kernel by
/// variant — the shared notion behind the engine's "segment IoU" for
/// Bbox/Polygon/Mask annotations.
#[derive(Clone, Debug, PartialEq)]
pub enum Segment {
    Bbox(BbF),
    Polygon(Polygon),
    Mask(Mask),
}

impl Segment {
    pub fn enclosing_bbox(&self) -> BbF {
        match self {
            Segment::Bbox(bb) => *bb,
            Segment::Polygon(p) => p.enclosing_bb(),
            Segment::Mask(m) => m.bb.into(),
        }
    }

    /// IoU between two segments. Mixed-variant pairs are compared by
    /// rasterizing to the shared bounding box (matching how the engine this
    /// is modeled on groups `Bbox`/`Polygon`/`Mask` under one distance).
    pub fn iou(&self, other: &Segment) -> f64 {
        match (self, other) {
            (Segment::Bbox(a), Segment::Bbox(b)) => bbox_iou(a, b),
            (Segment::Polygon(a), Segment::Polygon(b)) => polygon_iou(a, b),
            (Segment::Mask(a), Segment::Mask(b)) => mask::mask_iou(a, b),
            (Segment::Bbox(a), Segment::Polygon(b)) | (Segment::Polygon(b), Segment::Bbox(a)) => {
                polygon_iou(&(*a).into(), b)
            }
            (Segment::Bbox(a), Segment::Mask(b)) | (Segment::Mask(b), Segment::Bbox(a)) => {
                let a_bb: BbI = (*a).into();
                mask::mask_iou(&Mask::from_box(a_bb), b)
            }
            (Segment::Polygon(a), Segment::Mask(b)) | (Segment::Mask(b), Segment::Polygon(a)) => {
                let bb: BbI = b.bb;
                let rasterized = polygon::rasterize(a, bb);
                mask::mask_iou(&Mask { mask: rasterized, bb }, b)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_from_bb() {
        let bb = BbF::from_arr(&[9.0, 9.0, 10.0, 10.0]);
        let poly = Polygon::from(bb);
        assert_eq!(poly.enclosing_bb(), bb);
    }

    #[test]
    fn test_bb_corners() {
        let bb = BbI {
            x: 10,
            y: 10,
            w: 10,
            h: 10,
        };
        assert!(!bb.contains((20u32, 20u32)));
        assert!(bb.contains((10u32, 10u32)));
        assert!(bb.corner(0).equals((10, 10)));
        assert!(bb.corner(1).equals((10, 19)));
        assert!(bb.corner(2).equals((19, 19)));
        assert!(bb.corner(3).equals((19, 10)));
        for (c, i) in bb.points_iter().zip(0..4) {
            assert_eq!(c, bb.corner(i));
        }
    }

    #[test]
    fn test_has_overlap() {
        let bb1 = BbI::from_arr(&[5, 5, 10, 10]);
        let bb2 = BbI::from_arr(&[5, 5, 10, 10]);
        assert!(bb1.has_overlap(&bb2) && bb2.has_overlap(&bb1));
        let bb2 = BbI::from_arr(&[0, 0, 10, 10]);
        assert!(bb1.has_overlap(&bb2) && bb2.has_overlap(&bb1));
        let bb2 = BbI::from_arr(&[17, 17, 112, 112]);
        assert!(!bb1.has_overlap(&bb2) && !bb2.has_overlap(&bb1));
    }

    #[test]
    fn test_max_corner_dist() {
        let bb1 = BbI::from_arr(&[5, 5, 11, 11]);
        let bb2 = BbI::from_arr(&[5, 5, 11, 11]);
        assert_eq!(
            bb1.max_squaredist(bb2.points_iter()).unwrap(),
            ((15, 5).into(), (5, 15).into(), 200)
        );
    }

    #[test]
    fn test_intersect() {
        let bb = BbI::from_arr(&[10, 15, 20, 10]);
        assert_eq!(bb.intersect(bb), bb);
        assert_eq!(
            bb.intersect(BbI::from_arr(&[5, 7, 10, 10])),
            BbI::from_arr(&[10, 15, 5, 2])
        );
    }

    #[test]
    fn test_into() {
        let pt: PtI = (10, 20).into();
        assert_eq!(pt, PtI { x: 10, y: 20 });
        let box_int = BbI::from_arr(&[1, 2, 5, 6]);
        let box_f: BbF = box_int.into();
        assert_eq!(box_int, box_f.into());
    }

    #[test]
    fn test_segment_iou_mixed_variants_agree_with_bbox() {
        let bb = BbF::from_arr(&[0.0, 0.0, 10.0, 10.0]);
        let seg_bb = Segment::Bbox(bb);
        let seg_poly = Segment::Polygon(Polygon::from(bb));
        let iou = seg_bb.iou(&seg_poly);
        assert!((iou - 1.0).abs() < 0.02);
    }
}
