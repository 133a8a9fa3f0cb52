//! Dataset-level numeric summaries built on top of the pairwise-combinable
//! [`Stats`] accumulator.

use annomerge_domain::stats::Stats;

use crate::model::{Annotation, Item};

/// Splits a combined `Stats` into `(mean, std)` per channel/dimension.
pub fn mean_std(stats: &Stats) -> (Vec<f64>, Vec<f64>) {
    let std = stats.var.iter().map(|v| v.max(0.0).sqrt()).collect();
    (stats.mean.clone(), std)
}

fn channel_stats(data: &[u8], channels: u32) -> Vec<Stats> {
    let channels = channels.max(1) as usize;
    let mut per_channel: Vec<Vec<f64>> = vec![Vec::new(); channels];
    for (i, &byte) in data.iter().enumerate() {
        per_channel[i % channels].push(byte as f64);
    }
    per_channel
        .into_iter()
        .map(|values| {
            let count = values.len() as u64;
            if count == 0 {
                return Stats::new(0, vec![0.0], vec![0.0]);
            }
            let mean = values.iter().sum::<f64>() / count as f64;
            let var = if count > 1 {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count as f64 - 1.0)
            } else {
                0.0
            };
            Stats::new(count, vec![mean], vec![var])
        })
        .collect()
}

/// Per-channel pixel mean/variance across every item that carries decoded
/// image data, combined pairwise so the result is independent of item
/// traversal order.
pub fn compute_image_statistics<'a>(items: impl Iterator<Item = &'a Item>) -> Option<Stats> {
    let per_channel_batches: Vec<Vec<Stats>> = items
        .filter_map(|item| item.image.as_ref())
        .filter_map(|image| image.data.as_ref().map(|data| channel_stats(data, image.channels)))
        .collect();
    let n_channels = per_channel_batches.iter().map(|b| b.len()).max()?;
    let mut combined_mean = Vec::with_capacity(n_channels);
    let mut combined_var = Vec::with_capacity(n_channels);
    let mut combined_count = 0u64;
    for c in 0..n_channels {
        let batches: Vec<Stats> = per_channel_batches
            .iter()
            .filter_map(|b| b.get(c).cloned())
            .collect();
        let combined = Stats::compute(&batches)?;
        combined_count = combined.count;
        combined_mean.push(combined.mean[0]);
        combined_var.push(combined.var[0]);
    }
    Some(Stats::new(combined_count, combined_mean, combined_var))
}

/// Mean/variance of a scalar extracted from every annotation for which
/// `extractor` returns `Some`, combined pairwise across the whole dataset.
pub fn compute_ann_statistics<'a>(
    items: impl Iterator<Item = &'a Item>,
    extractor: impl Fn(&Annotation) -> Option<f64>,
) -> Option<Stats> {
    let batches: Vec<Stats> = items
        .flat_map(|item| item.annotations.iter())
        .filter_map(|ann| extractor(ann).map(|v| Stats::new(1, vec![v], vec![0.0])))
        .collect();
    Stats::compute(&batches)
}
