//! Pixel statistics
//!
//! NaN pixels are ignored everywhere. Statistics of an empty selection are
//! NaN, which fails every `<` comparison downstream.

use crate::frame::MaskPlanes;

/// Robust initial width from the interquartile range of a normal distribution
const IQR_TO_SIGMA: f64 = 0.741;

/// Clipping and masking parameters for [`clipped_stats`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsControl {
    pub num_sigma_clip: f64,
    pub num_iter: usize,
    /// Pixels with any of these planes set are excluded
    pub and_mask: MaskPlanes,
}

impl StatisticsControl {
    pub fn new(num_sigma_clip: f64, num_iter: usize) -> Self {
        Self {
            num_sigma_clip,
            num_iter,
            and_mask: MaskPlanes::empty(),
        }
    }

    pub fn with_and_mask(mut self, and_mask: MaskPlanes) -> Self {
        self.and_mask = and_mask;
        self
    }
}

impl Default for StatisticsControl {
    fn default() -> Self {
        Self::new(3.0, 3)
    }
}

/// Result of iterative sigma clipping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedStats {
    pub mean: f64,
    pub stddev: f64,
    /// Pixels surviving the final iteration
    pub count: usize,
}

fn without_nan(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean
pub fn mean(values: &[f64]) -> f64 {
    let valid = without_nan(values);
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.iter().sum::<f64>() / valid.len() as f64
}

/// Sample standard deviation (N-1 denominator); NaN below two pixels
pub fn stddev(values: &[f64]) -> f64 {
    let valid = without_nan(values);
    let n = valid.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = valid.iter().sum::<f64>() / n as f64;
    let variance = valid.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Median; the mean of the two middle values for even counts
pub fn median(values: &[f64]) -> f64 {
    let mut valid = without_nan(values);
    if valid.is_empty() {
        return f64::NAN;
    }
    valid.sort_by(f64::total_cmp);
    quantile_sorted(&valid, 0.5)
}

/// Linearly interpolated quantile of sorted, NaN-free data
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Pixels whose mask has none of the `and_mask` planes set
///
/// A pixel without a mask entry counts as unmasked.
pub fn select(pixels: &[f64], mask: &[u32], and_mask: MaskPlanes) -> Vec<f64> {
    pixels
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let bits = mask.get(*i).copied().unwrap_or(0);
            !MaskPlanes::from_bits_truncate(bits).intersects(and_mask)
        })
        .map(|(_, &v)| v)
        .filter(|v| !v.is_nan())
        .collect()
}

/// Iteratively sigma-clipped mean and standard deviation
///
/// The first pass is centered on the median with a width derived from the
/// interquartile range. Each later pass re-centers on the mean and standard
/// deviation of the surviving pixels, stopping after `num_iter` passes or
/// once no further pixels are rejected.
pub fn clipped_stats(pixels: &[f64], mask: &[u32], control: &StatisticsControl) -> ClippedStats {
    let data = select(pixels, mask, control.and_mask);
    if data.is_empty() {
        return ClippedStats {
            mean: f64::NAN,
            stddev: f64::NAN,
            count: 0,
        };
    }

    let mut sorted = data.clone();
    sorted.sort_by(f64::total_cmp);
    let mut center = quantile_sorted(&sorted, 0.5);
    let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);
    let mut sigma = IQR_TO_SIGMA * iqr;

    let mut kept = data.clone();
    for _ in 0..control.num_iter {
        let limit = control.num_sigma_clip * sigma;
        let next: Vec<f64> = data
            .iter()
            .copied()
            .filter(|v| (v - center).abs() <= limit)
            .collect();
        if next.is_empty() {
            break;
        }

        let converged = next.len() == kept.len();
        kept = next;
        center = mean(&kept);
        sigma = stddev(&kept);
        if converged {
            break;
        }
    }

    ClippedStats {
        mean: mean(&kept),
        stddev: stddev(&kept),
        count: kept.len(),
    }
}

/// Sigma-clipped standard deviation
pub fn clipped_stddev(pixels: &[f64], mask: &[u32], control: &StatisticsControl) -> f64 {
    clipped_stats(pixels, mask, control).stddev
}

/// Unclipped standard deviation of the unmasked pixels
pub fn masked_stddev(pixels: &[f64], mask: &[u32], and_mask: MaskPlanes) -> f64 {
    stddev(&select(pixels, mask, and_mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn test_mean_and_stddev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), 5.0);
        // sample variance 32 / 7
        assert!(close(stddev(&values), (32.0f64 / 7.0).sqrt(), 1e-12));
    }

    #[test]
    fn test_nan_ignored() {
        let values = [1.0, f64::NAN, 3.0];
        assert_eq!(mean(&values), 2.0);
        assert_eq!(median(&values), 2.0);
        assert!(close(stddev(&values), 2.0f64.sqrt(), 1e-12));
    }

    #[test]
    fn test_empty_is_nan() {
        assert!(mean(&[]).is_nan());
        assert!(median(&[f64::NAN]).is_nan());
        assert!(stddev(&[1.0]).is_nan());
        let stats = clipped_stats(&[], &[], &StatisticsControl::default());
        assert!(stats.stddev.is_nan());
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_select_honors_and_mask() {
        let pixels = [1.0, 2.0, 3.0, 4.0];
        let mask = [
            0,
            MaskPlanes::SAT.bits(),
            MaskPlanes::CR.bits(),
            MaskPlanes::DETECTED.bits(),
        ];
        let selected = select(&pixels, &mask, MaskPlanes::SAT | MaskPlanes::CR);
        assert_eq!(selected, vec![1.0, 4.0]);
        // missing mask entries are unmasked
        assert_eq!(select(&pixels, &[], MaskPlanes::all()), pixels.to_vec());
    }

    #[test]
    fn test_clipping_rejects_outliers() {
        let mut pixels: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { -1.0 } else { 1.0 }).collect();
        pixels.push(1000.0);
        pixels.push(-500.0);

        let unclipped = stddev(&pixels);
        let stats = clipped_stats(&pixels, &[], &StatisticsControl::new(5.0, 5));

        assert!(unclipped > 50.0);
        assert_eq!(stats.count, 200);
        assert!(close(stats.mean, 0.0, 1e-12));
        assert!(close(stats.stddev, 1.0, 0.01));
    }

    #[test]
    fn test_clipping_respects_mask() {
        let pixels = [0.0, 1.0, 0.0, 1.0, 50.0];
        let mask = [0, 0, 0, 0, MaskPlanes::BAD.bits()];
        let control = StatisticsControl::new(5.0, 5).with_and_mask(MaskPlanes::BAD);
        let stats = clipped_stats(&pixels, &mask, &control);
        assert_eq!(stats.count, 4);
        assert!(close(stats.mean, 0.5, 1e-12));
    }

    #[test]
    fn test_zero_iterations_is_plain_statistics() {
        let pixels = [1.0, 2.0, 3.0, 100.0];
        let stats = clipped_stats(&pixels, &[], &StatisticsControl::new(1.0, 0));
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, mean(&pixels));
    }
}
