use serde::{ser::SerializeStruct, Deserialize, Serialize};

use crate::{
    bb::BbI,
    core::PtI,
    geomerr,
    result::GeomResult,
    ShapeI,
};

#[must_use]
pub fn mask_to_rle(mask: &[u8], mask_w: u32, mask_h: u32) -> Vec<u32> {
    let mut rle = Vec::new();
    let mut current_run = 0;
    let mut current_value = 0;
    for y in 0..mask_h {
        for x in 0..mask_w {
            let value = mask[(y * mask_w + x) as usize];
            if value == current_value {
                current_run += 1;
            } else {
                rle.push(current_run);
                current_run = 1;
                current_value = value;
            }
        }
    }
    rle.push(current_run);
    rle
}

pub fn rle_to_mask_inplace(rle: &[u32], mask: &mut [u8], w: u32) {
    for (i, &run) in rle.iter().enumerate() {
        let value = i % 2;
        let start = rle.iter().take(i).sum::<u32>();
        for idx in start..(start + run) {
            let x = idx % w;
            let y = idx / w;
            let idx = (y * w + x) as usize;
            if idx < mask.len() {
                mask[idx] = value as u8;
            }
        }
    }
}

#[must_use]
pub fn rle_to_mask(rle: &[u32], w: u32, h: u32) -> Vec<u8> {
    let mut mask = vec![0; (w * h) as usize];
    rle_to_mask_inplace(rle, &mut mask, w);
    mask
}

fn idx_bb_to_pixim(idx_bb: u32, bb: BbI) -> PtI {
    PtI {
        y: idx_bb / bb.w,
        x: idx_bb % bb.w,
    } + bb.min()
}

fn idx_bb_to_im(idx_bb: u32, bb: BbI, w_im: u32) -> u32 {
    let p_im = idx_bb_to_pixim(idx_bb, bb);
    p_im.y * w_im + p_im.x
}

fn idx_im_to_bb(idx_im: u32, bb: BbI, w_im: u32) -> Option<u32> {
    let p_im = PtI {
        x: idx_im % w_im,
        y: idx_im / w_im,
    };
    if bb.contains(p_im) {
        let p = p_im - bb.min();
        Some(p.y * bb.w + p.x)
    } else {
        None
    }
}

/// The input rle is computed with respect to the bounding box coordinates,
/// the result is with respect to image coordinates.
pub fn rle_bb_to_image(rle_bb: &[u32], bb: BbI, shape_im: ShapeI) -> GeomResult<Vec<u32>> {
    if !bb.is_contained_in_image(shape_im) {
        Err(geomerr!(
            "bounding box {:?} is not contained in image with shape {:?}",
            bb,
            shape_im
        ))
    } else {
        if rle_bb.len() == 1 {
            return Ok(vec![shape_im.w * shape_im.h]);
        }
        let n_zero_rows = rle_bb[0] / bb.w;
        let bb = BbI::from_arr(&[bb.x, bb.y + n_zero_rows, bb.w, bb.h - n_zero_rows]);
        let rle_0_correction = n_zero_rows * bb.w;
        let n_zero_rows = if rle_bb.len() % 2 == 1 {
            rle_bb.iter().last().unwrap() / bb.w
        } else {
            0
        };
        let bb = BbI::from_arr(&[bb.x, bb.y, bb.w, bb.h - n_zero_rows]);
        let rle_1_correction = n_zero_rows * bb.w;

        let mut rle_im = vec![];
        let offset = idx_bb_to_im(0, bb, shape_im.w);
        rle_im.push(offset + rle_bb[0] - rle_0_correction);
        let mut prev_idx = rle_im[0] - 1;
        for i in 1..rle_bb.len() {
            let sum_correction = rle_0_correction
                + if i == rle_bb.len() - 1 {
                    rle_1_correction
                } else {
                    0
                };
            let im_idx = idx_bb_to_im(
                rle_bb[..=i].iter().sum::<u32>() - 1 - sum_correction,
                bb,
                shape_im.w,
            );
            let p = PtI {
                x: im_idx % shape_im.w,
                y: im_idx / shape_im.w,
            };
            let p_prev = PtI {
                x: prev_idx % shape_im.w,
                y: prev_idx / shape_im.w,
            };
            let is_foreground_run = i % 2 == 1;
            let row_span = p.y - p_prev.y;
            if is_foreground_run {
                if row_span == 0 {
                    rle_im.push(p.x - p_prev.x);
                } else {
                    let n_elts = bb.max().x - p_prev.x;
                    if n_elts > 0 {
                        rle_im.push(n_elts);
                        for _ in 0..(row_span - 1) {
                            rle_im.push(shape_im.w - bb.w);
                            rle_im.push(bb.w);
                        }
                        rle_im.push(shape_im.w - bb.w);
                    }
                    rle_im.push(p.x + 1 - bb.x);
                }
                if i == rle_bb.len() - 1 {
                    rle_im.push(
                        bb.x + bb.w - 1 - p.x + shape_im.w * (shape_im.h - p.y - 1) + shape_im.w
                            - (bb.w + bb.x),
                    );
                }
            } else {
                let n_elts = if row_span == 0 {
                    p.x - p_prev.x
                } else {
                    bb.x_max() + 1 - p_prev.x + (row_span - 1) * shape_im.w + shape_im.w - bb.w
                        + p.x
                        - bb.x
                };
                let n_elts = if p.x == bb.x_max() && i < rle_bb.len() - 1 {
                    n_elts + shape_im.w - bb.w
                } else {
                    n_elts
                };
                let n_elts = if i == rle_bb.len() - 1 {
                    n_elts + shape_im.w - (bb.w + bb.x) + shape_im.w * (shape_im.h - p.y - 1)
                } else {
                    n_elts
                };
                rle_im.push(n_elts);
            }
            prev_idx = im_idx;
        }
        Ok(rle_im)
    }
}

/// The input rle is computed with respect to the image coordinates,
/// the result is with respect to bounding box coordinates.
pub fn rle_image_to_bb(rle_im: &[u32], bb: BbI, shape_im: ShapeI) -> GeomResult<Vec<u32>> {
    if !bb.is_contained_in_image(shape_im) {
        Err(geomerr!(
            "bounding box {:?} is not contained in image with shape {:?}",
            bb,
            shape_im
        ))
    } else {
        if rle_im.len() == 1 {
            return Ok(vec![bb.w * bb.h]);
        }
        let mut mask = vec![0; (bb.w * bb.h) as usize];
        for (i, run) in rle_im.iter().enumerate() {
            let is_foreground_run = i % 2 == 1;
            if is_foreground_run {
                let start = rle_im.iter().take(i).sum::<u32>();
                for idx in start..(start + run) {
                    if let Some(idx_bb) = idx_im_to_bb(idx, bb, shape_im.w) {
                        mask[idx_bb as usize] = 1;
                    }
                }
            }
        }
        Ok(mask_to_rle(&mask, bb.w, bb.h))
    }
}

/// 1d-index inside a bounding box from image coordinates.
pub fn access_bb_idx(bb: BbI, p: PtI) -> usize {
    if bb.contains(p) {
        ((p.y - bb.y) * bb.w + p.x - bb.x) as usize
    } else {
        0
    }
}

#[must_use]
pub fn access_mask_abs(mask: &[u8], bb: BbI, p: PtI) -> u8 {
    if bb.contains(p) {
        mask[access_bb_idx(bb, p)]
    } else {
        0
    }
}

/// A binary segmentation mask confined to a bounding box, kept run-length
/// encoded on the wire (see `Serialize`/`Deserialize` below) so large masks
/// stay cheap to move between clusters during merge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mask {
    pub mask: Vec<u8>,
    pub bb: BbI,
}

impl Mask {
    pub fn from_box(bb: BbI) -> Self {
        Self {
            bb,
            mask: vec![1; (bb.w * bb.h) as usize],
        }
    }

    pub fn from_rle(rle: &[u32], bb: BbI) -> Self {
        Self {
            mask: rle_to_mask(rle, bb.w, bb.h),
            bb,
        }
    }

    pub fn rle(&self) -> Vec<u32> {
        mask_to_rle(&self.mask, self.bb.w, self.bb.h)
    }

    pub fn area(&self) -> u64 {
        self.mask.iter().filter(|&&v| v != 0).count() as u64
    }

    /// Bounding-box union of `self` and `other`, foreground taken as the
    /// pixel-wise max (i.e. logical OR) of the two masks.
    #[must_use]
    pub fn merge(mut self, other: &Mask) -> Self {
        let old_self_bb = self.bb;
        self.bb = self.bb.merge(other.bb);
        self.mask.resize((self.bb.w * self.bb.h) as usize, 0);
        for y in (0..old_self_bb.h).rev() {
            for x in (0..old_self_bb.w).rev() {
                let p = PtI { x, y } + old_self_bb.min();
                let old_idx = (y * old_self_bb.w + x) as usize;
                let new_idx = access_bb_idx(self.bb, p);
                let val = self.mask[old_idx];
                self.mask[old_idx] = 0;
                self.mask[new_idx] = val;
            }
        }
        for y in 0..other.bb.h {
            for x in 0..other.bb.w {
                let p = PtI { x, y } + other.bb.min();
                let val_self = access_mask_abs(&self.mask, self.bb, p);
                let val_other = other.mask[(y * other.bb.w + x) as usize];
                let val = val_self.max(val_other);
                self.mask[((p.y - self.bb.y) * self.bb.w + (p.x - self.bb.x)) as usize] = val;
            }
        }
        self
    }
}

/// IoU of two masks, computed over the union of their bounding boxes.
pub fn mask_iou(a: &Mask, b: &Mask) -> f64 {
    let union_bb = a.bb.merge(b.bb);
    let mut inter = 0u64;
    let mut union = 0u64;
    for y in union_bb.y_range() {
        for x in union_bb.x_range() {
            let p = PtI { x, y };
            let a_on = access_mask_abs(&a.mask, a.bb, p) != 0;
            let b_on = access_mask_abs(&b.mask, b.bb, p) != 0;
            if a_on || b_on {
                union += 1;
            }
            if a_on && b_on {
                inter += 1;
            }
        }
    }
    if union == 0 {
        0.0
    } else {
        inter as f64 / union as f64
    }
}

impl Serialize for Mask {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Mask", 2)?;
        state.serialize_field("rle", &mask_to_rle(&self.mask, self.bb.w, self.bb.h))?;
        state.serialize_field("bb", &self.bb)?;
        state.end()
    }
}
impl<'de> Deserialize<'de> for Mask {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct MaskDe {
            rle: Vec<u32>,
            bb: BbI,
        }
        let read = MaskDe::deserialize(deserializer)?;
        let mask = rle_to_mask(&read.rle, read.bb.w, read.bb.h);
        Ok(Self { mask, bb: read.bb })
    }
}
