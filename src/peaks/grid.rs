use serde::Serialize;

use crate::color::bin_distance;

/// Local maximum of the smoothed hue × saturation histogram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPeak {
    pub hue_index: usize,
    pub sat_index: usize,
    pub value: f64,
    /// Start angle of the hue bin, in degrees.
    pub hue: f64,
    /// Centre of the saturation bin as a fraction of the filtered range.
    pub saturation: f64,
}

fn is_local_max(hist: &[f64], hue_bins: usize, sat_bins: usize, h: usize, s: usize) -> bool {
    let curr = hist[h * sat_bins + s];
    for dh in [hue_bins - 1, 0, 1] {
        let hi = (h + dh) % hue_bins;
        for ds in [-1i64, 0, 1] {
            if dh == 0 && ds == 0 {
                continue;
            }
            let si = s as i64 + ds;
            if si < 0 || si >= sat_bins as i64 {
                continue;
            }
            if hist[hi * sat_bins + si as usize] > curr {
                return false;
            }
        }
    }
    true
}

/// Find 8-neighbour local maxima (hue wraps, saturation stops at the edges)
/// that reach `threshold` of the global maximum, then drop any peak lying
/// within both `min_hue_distance` and `min_sat_distance` (fractions of each
/// axis) of a stronger accepted peak.
pub fn find_grid_peaks(
    hist: &[f64],
    hue_bins: usize,
    sat_bins: usize,
    threshold: f64,
    min_hue_distance: f64,
    min_sat_distance: f64,
) -> Vec<GridPeak> {
    let max = hist.iter().copied().fold(0.0, f64::max);
    if max <= 0.0 {
        return Vec::new();
    }
    let floor = max * threshold;

    let mut candidates = Vec::new();
    for h in 0..hue_bins {
        for s in 0..sat_bins {
            let value = hist[h * sat_bins + s];
            if value < floor || !is_local_max(hist, hue_bins, sat_bins, h, s) {
                continue;
            }
            candidates.push(GridPeak {
                hue_index: h,
                sat_index: s,
                value,
                hue: h as f64 / hue_bins as f64 * 360.0,
                saturation: (s as f64 + 0.5) / sat_bins as f64,
            });
        }
    }

    // stable: equal values keep scan order
    candidates.sort_by(|a, b| b.value.total_cmp(&a.value));

    let min_hue_bins = (min_hue_distance * hue_bins as f64).round() as usize;
    let min_sat_bins = (min_sat_distance * sat_bins as f64).round() as usize;

    let mut accepted: Vec<GridPeak> = Vec::new();
    for peak in candidates {
        let too_close = accepted.iter().any(|kept| {
            bin_distance(peak.hue_index, kept.hue_index, hue_bins) < min_hue_bins
                && peak.sat_index.abs_diff(kept.sat_index) < min_sat_bins
        });
        if !too_close {
            accepted.push(peak);
        }
    }

    log::debug!("grid peaks: {} accepted of local maxima above {floor:.4}", accepted.len());
    accepted
}
