//! Weighted hue and hue × saturation histograms built from RGBA buffers,
//! plus Gaussian smoothing that treats the hue axis as a ring.

use crate::color::rgb_to_hsl;
use crate::config::{ALPHA_CUTOFF, PixelFilter};

/// Lightness statistics for one hue × saturation bin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BinStats {
    pub sum_l: f64,
    pub count: u32,
}

/// Weighted saturation/lightness statistics for one hue bin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HueBinStats {
    pub sum_s: f64,
    pub sum_l: f64,
    pub weight: f64,
}

impl HueBinStats {
    fn add_scaled(&mut self, other: &HueBinStats, factor: f64) {
        self.sum_s += other.sum_s * factor;
        self.sum_l += other.sum_l * factor;
        self.weight += other.weight * factor;
    }
}

/// 2D histogram, row-major by hue: bin `(h, s)` lives at `h * sat_bins + s`.
#[derive(Clone, Debug)]
pub struct HueSatHistogram {
    pub hue_bins: usize,
    pub sat_bins: usize,
    pub bins: Vec<f64>,
    pub stats: Vec<BinStats>,
    pub total_weight: f64,
    /// Pixels that passed the filter.
    pub samples: usize,
}

impl HueSatHistogram {
    #[inline]
    pub fn index(&self, hue: usize, sat: usize) -> usize {
        hue * self.sat_bins + sat
    }
}

/// 1D hue histogram.
#[derive(Clone, Debug)]
pub struct HueHistogram {
    pub bins: Vec<f64>,
    pub stats: Vec<HueBinStats>,
    pub total_weight: f64,
    pub samples: usize,
}

impl HueHistogram {
    /// Accumulate mass and statistics over a circular inclusive range. Both
    /// boundary bins count for `edge_share` of their content.
    pub fn region_sums(&self, start: usize, end: usize, edge_share: f64) -> (f64, HueBinStats) {
        let n = self.bins.len();
        let len = (end + n - start) % n + 1;
        let mut mass = 0.0;
        let mut stats = HueBinStats::default();
        for step in 0..len {
            let i = (start + step) % n;
            let share = if step == 0 || step == len - 1 { edge_share } else { 1.0 };
            mass += self.bins[i] * share;
            stats.add_scaled(&self.stats[i], share);
        }
        (mass, stats)
    }
}

#[inline]
fn hue_bin(h: f64, hue_bins: usize) -> usize {
    ((h / 360.0) * hue_bins as f64).floor() as usize % hue_bins
}

/// Build the hue × saturation histogram. Each accepted pixel adds its
/// saturation as weight, so vivid pixels dominate.
pub fn build_hue_sat(pixels: &[u8], hue_bins: usize, sat_bins: usize, filter: &PixelFilter) -> HueSatHistogram {
    let mut hist = HueSatHistogram {
        hue_bins,
        sat_bins,
        bins: vec![0.0; hue_bins * sat_bins],
        stats: vec![BinStats::default(); hue_bins * sat_bins],
        total_weight: 0.0,
        samples: 0,
    };
    let sat_range = filter.saturation_range();

    for px in pixels.chunks_exact(4) {
        if px[3] < ALPHA_CUTOFF {
            continue;
        }
        let hsl = rgb_to_hsl(px[0], px[1], px[2]);
        if !filter.accepts(hsl.s, hsl.l) {
            continue;
        }

        let h = hue_bin(hsl.h, hue_bins);
        let s = if sat_range > 0.0 {
            (((hsl.s - filter.min_saturation) / sat_range * sat_bins as f64).floor() as usize).min(sat_bins - 1)
        } else {
            sat_bins - 1
        };
        let key = hist.index(h, s);

        hist.bins[key] += hsl.s;
        hist.total_weight += hsl.s;
        hist.stats[key].sum_l += hsl.l;
        hist.stats[key].count += 1;
        hist.samples += 1;
    }

    hist
}

/// Build the hue-only histogram. Weight is saturation scaled by how close
/// lightness sits to the midpoint.
pub fn build_hue(pixels: &[u8], hue_bins: usize, filter: &PixelFilter) -> HueHistogram {
    let mut hist = HueHistogram {
        bins: vec![0.0; hue_bins],
        stats: vec![HueBinStats::default(); hue_bins],
        total_weight: 0.0,
        samples: 0,
    };

    for px in pixels.chunks_exact(4) {
        if px[3] < ALPHA_CUTOFF {
            continue;
        }
        let hsl = rgb_to_hsl(px[0], px[1], px[2]);
        if !filter.accepts(hsl.s, hsl.l) {
            continue;
        }

        let weight = hsl.s * (1.0 - (2.0 * hsl.l - 1.0).abs());
        let h = hue_bin(hsl.h, hue_bins);

        hist.bins[h] += weight;
        hist.total_weight += weight;
        let stats = &mut hist.stats[h];
        stats.sum_s += hsl.s * weight;
        stats.sum_l += hsl.l * weight;
        stats.weight += weight;
        hist.samples += 1;
    }

    hist
}

#[inline]
fn gaussian(dist_sq: f64, radius: usize) -> f64 {
    let sigma = radius as f64 / 2.0;
    (-dist_sq / (2.0 * sigma * sigma)).exp()
}

/// Normalized `(2r+1) × (2r+1)` kernel, row-major by hue offset.
fn kernel_2d(radius: usize) -> Vec<f64> {
    let r = radius as i64;
    let mut weights = Vec::with_capacity((2 * radius + 1).pow(2));
    for dh in -r..=r {
        for ds in -r..=r {
            weights.push(gaussian((dh * dh + ds * ds) as f64, radius));
        }
    }
    let sum: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

fn kernel_1d(radius: usize) -> Vec<f64> {
    let r = radius as i64;
    let mut weights: Vec<f64> = (-r..=r).map(|d| gaussian((d * d) as f64, radius)).collect();
    let sum: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

/// Gaussian blur of a 2D histogram: hue wraps around, saturation clamps.
pub fn smooth_hue_sat(bins: &[f64], hue_bins: usize, sat_bins: usize, radius: usize) -> Vec<f64> {
    let kernel = kernel_2d(radius);
    let r = radius as i64;
    let width = 2 * radius + 1;
    let (hn, sn) = (hue_bins as i64, sat_bins as i64);
    let mut smoothed = vec![0.0; bins.len()];

    for h in 0..hn {
        for s in 0..sn {
            let mut sum = 0.0;
            for dh in -r..=r {
                let hi = (h + dh).rem_euclid(hn);
                for ds in -r..=r {
                    let si = (s + ds).clamp(0, sn - 1);
                    let w = kernel[(dh + r) as usize * width + (ds + r) as usize];
                    sum += bins[(hi * sn + si) as usize] * w;
                }
            }
            smoothed[(h * sn + s) as usize] = sum;
        }
    }

    smoothed
}

/// Gaussian blur of a circular 1D histogram.
pub fn smooth_hue(bins: &[f64], radius: usize) -> Vec<f64> {
    let kernel = kernel_1d(radius);
    let r = radius as i64;
    let n = bins.len() as i64;

    (0..n)
        .map(|i| {
            (-r..=r)
                .map(|d| bins[(i + d).rem_euclid(n) as usize] * kernel[(d + r) as usize])
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;

    fn rgba(pixels: &[(u8, u8, u8, u8)]) -> Vec<u8> {
        pixels.iter().flat_map(|&(r, g, b, a)| [r, g, b, a]).collect()
    }

    #[test]
    fn kernels_sum_to_one() {
        for radius in 1..5 {
            let k2: f64 = kernel_2d(radius).iter().sum();
            let k1: f64 = kernel_1d(radius).iter().sum();
            assert!((k2 - 1.0).abs() < 1e-12);
            assert!((k1 - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn skips_transparent_gray_and_extreme_pixels() {
        let filter = ExtractConfig::default().filter();
        let buf = rgba(&[
            (230, 26, 26, 255),
            (230, 26, 26, 10),
            (128, 128, 128, 255),
            (255, 250, 250, 255),
            (5, 0, 0, 255),
        ]);
        let hist = build_hue_sat(&buf, 36, 10, &filter);
        assert_eq!(hist.samples, 1);
        let red = hist.bins.iter().position(|&v| v > 0.0).unwrap();
        assert_eq!(red / 10, 0);
        assert_eq!(hist.stats[red].count, 1);
        assert!((hist.total_weight - hist.bins[red]).abs() < 1e-12);

        let hue = build_hue(&buf, 36, &filter);
        assert_eq!(hue.samples, 1);
        assert!(hue.bins[0] > 0.0);
    }

    #[test]
    fn hue_weight_prefers_mid_lightness() {
        let filter = ExtractConfig::default().filter();
        // same hue and saturation, different lightness
        let mid = build_hue(&rgba(&[(230, 26, 26, 255)]), 36, &filter);
        let dark = build_hue(&rgba(&[(115, 13, 13, 255)]), 36, &filter);
        assert!(mid.total_weight > dark.total_weight);
    }

    #[test]
    fn smoothing_wraps_hue_and_preserves_mass() {
        let mut bins = vec![0.0; 36];
        bins[0] = 1.0;
        let smoothed = smooth_hue(&bins, 2);
        assert!(smoothed[35] > 0.0);
        assert!((smoothed[1] - smoothed[35]).abs() < 1e-12);
        assert!((smoothed.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        let mut grid = vec![0.0; 36 * 10];
        grid[5] = 1.0; // hue 0, sat 5
        let smoothed = smooth_hue_sat(&grid, 36, 10, 1);
        assert!(smoothed[35 * 10 + 5] > 0.0);
        assert!((smoothed[35 * 10 + 5] - smoothed[10 + 5]).abs() < 1e-12);
        assert!((smoothed.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn region_sums_share_edges() {
        let hist = HueHistogram {
            bins: vec![1.0, 2.0, 3.0, 4.0],
            stats: vec![HueBinStats { sum_s: 1.0, sum_l: 1.0, weight: 1.0 }; 4],
            total_weight: 10.0,
            samples: 4,
        };
        let (mass, stats) = hist.region_sums(3, 1, 0.5);
        assert!((mass - (2.0 + 1.0 + 1.0)).abs() < 1e-12);
        assert!((stats.weight - 2.0).abs() < 1e-12);
        let (whole, _) = hist.region_sums(1, 0, 1.0);
        assert!((whole - 10.0).abs() < 1e-12);
    }
}
