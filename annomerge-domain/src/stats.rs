/// Numerically stable running statistics over a stream of same-shaped
/// per-item observation vectors (e.g. per-channel image mean/std), combined
/// pairwise in O(log N) rather than folded left-to-right, per Chan et al.'s
/// parallel variance algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: u64,
    pub mean: Vec<f64>,
    pub var: Vec<f64>,
}

impl Stats {
    pub fn new(count: u64, mean: Vec<f64>, var: Vec<f64>) -> Self {
        Self { count, mean, var }
    }

    /// Combine two disjoint observation batches into one.
    ///
    /// The combined mean is the *count-weighted* mean
    /// `(mean_a*count_a + mean_b*count_b) / (count_a+count_b)`, which is the
    /// mathematically correct combination of two batches (the original this
    /// was modeled on used an unweighted `mean_a*0.5 + mean_b*0.5`, which only
    /// coincides with this formula when `count_a == count_b`).
    pub fn pairwise(a: &Stats, b: &Stats) -> Stats {
        if a.count == 0 {
            return b.clone();
        }
        if b.count == 0 {
            return a.clone();
        }
        let count = a.count + b.count;
        let n = a.mean.len().max(b.mean.len());
        let mut mean = Vec::with_capacity(n);
        let mut var = Vec::with_capacity(n);
        for i in 0..n {
            let mean_a = a.mean.get(i).copied().unwrap_or(0.0);
            let mean_b = b.mean.get(i).copied().unwrap_or(0.0);
            let var_a = a.var.get(i).copied().unwrap_or(0.0);
            let var_b = b.var.get(i).copied().unwrap_or(0.0);
            let delta = mean_b - mean_a;
            let m_a = var_a * (a.count as f64 - 1.0).max(0.0);
            let m_b = var_b * (b.count as f64 - 1.0).max(0.0);
            let m2 = m_a + m_b + delta * delta * (a.count as f64) * (b.count as f64) / count as f64;
            let combined_mean = (mean_a * a.count as f64 + mean_b * b.count as f64) / count as f64;
            let combined_var = if count > 1 {
                m2 / (count as f64 - 1.0)
            } else {
                0.0
            };
            mean.push(combined_mean);
            var.push(combined_var);
        }
        Stats { count, mean, var }
    }

    /// Recursive halving combinator: O(log N) depth instead of a left fold.
    pub fn compute(batches: &[Stats]) -> Option<Stats> {
        match batches.len() {
            0 => None,
            1 => Some(batches[0].clone()),
            2 => Some(Stats::pairwise(&batches[0], &batches[1])),
            n => {
                let mid = n / 2;
                let left = Stats::compute(&batches[..mid])?;
                let right = Stats::compute(&batches[mid..])?;
                Some(Stats::pairwise(&left, &right))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairwise_equal_counts() {
        let a = Stats::new(10, vec![1.0], vec![0.0]);
        let b = Stats::new(10, vec![3.0], vec![0.0]);
        let combined = Stats::pairwise(&a, &b);
        assert!((combined.mean[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_pairwise_weighted_by_count() {
        let a = Stats::new(1, vec![0.0], vec![0.0]);
        let b = Stats::new(9, vec![10.0], vec![0.0]);
        let combined = Stats::pairwise(&a, &b);
        assert!((combined.mean[0] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_matches_left_fold_for_small_n() {
        let batches = vec![
            Stats::new(4, vec![2.0], vec![1.0]),
            Stats::new(4, vec![4.0], vec![1.0]),
            Stats::new(4, vec![6.0], vec![1.0]),
        ];
        let combined = Stats::compute(&batches).unwrap();
        assert_eq!(combined.count, 12);
        assert!((combined.mean[0] - 4.0).abs() < 1e-9);
    }
}
