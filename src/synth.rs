//! Turning detected peaks into concrete colours.

use serde::Serialize;

use crate::color::{hsl_to_rgb, to_hex};
use crate::config::PixelFilter;
use crate::histogram::{HueHistogram, HueSatHistogram};
use crate::peaks::{GridPeak, LocalPeak};

/// A palette entry produced by the grid strategy.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtractedColor {
    pub hex: String,
    /// Share of the filtered histogram mass, `[0, 1]`.
    pub area: f64,
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl ExtractedColor {
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64, area: f64) -> Self {
        Self { hex: to_hex(hsl_to_rgb(hue, saturation, lightness)), area, hue, saturation, lightness }
    }
}

/// A palette entry produced by the valley strategy: a representative colour
/// plus the span of the hue ring it covers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HuePeak {
    pub peak_hue: f64,
    pub peak_index: usize,
    pub peak_value: f64,
    pub start_hue: f64,
    pub end_hue: f64,
    pub start_index: usize,
    pub end_index: usize,
    pub area: f64,
    pub hex: String,
    pub saturation: f64,
    pub lightness: f64,
    #[serde(skip)]
    pub bins: usize,
}

#[inline]
fn bin_hue(index: usize, bins: usize) -> f64 {
    index as f64 / bins as f64 * 360.0
}

/// One colour per grid peak: peak hue, the peak's saturation mapped back onto
/// the filtered range, and the average lightness of the surrounding window.
/// Peaks whose window holds no mass are dropped.
pub fn synthesize_grid(
    peaks: &[GridPeak],
    hist: &HueSatHistogram,
    peak_distance: f64,
    filter: &PixelFilter,
) -> Vec<ExtractedColor> {
    let (hue_bins, sat_bins) = (hist.hue_bins, hist.sat_bins);
    let h_radius = ((peak_distance * hue_bins as f64 * 0.5).round() as i64).max(1);
    // a window wider than the ring must not visit a bin twice
    let h_width = (2 * h_radius + 1).min(hue_bins as i64);
    let s_radius = ((peak_distance * sat_bins as f64).round() as i64).max(1);

    let mut colors = Vec::with_capacity(peaks.len());
    for peak in peaks {
        let mut mass = 0.0;
        let mut sum_l = 0.0;
        let mut count = 0u32;
        for step in 0..h_width {
            let h = (peak.hue_index as i64 - h_radius + step).rem_euclid(hue_bins as i64) as usize;
            for ds in -s_radius..=s_radius {
                let s = peak.sat_index as i64 + ds;
                if s < 0 || s >= sat_bins as i64 {
                    continue;
                }
                let key = hist.index(h, s as usize);
                mass += hist.bins[key];
                sum_l += hist.stats[key].sum_l;
                count += hist.stats[key].count;
            }
        }

        if mass == 0.0 {
            continue;
        }

        let lightness = if count > 0 { sum_l / count as f64 } else { 0.5 };
        let saturation = filter.min_saturation + peak.saturation * filter.saturation_range();
        colors.push(ExtractedColor::from_hsl(peak.hue, saturation, lightness, mass / hist.total_weight));
    }
    colors
}

/// One colour per valley-bounded region, averaged over the region's
/// statistics. Empty regions fall back to mid saturation and lightness.
pub fn synthesize_valley(peaks: &[LocalPeak], hist: &HueHistogram) -> Vec<HuePeak> {
    let bins = hist.bins.len();
    // valley bins are split between the two regions they bound
    let edge_share = if peaks.len() > 1 { 0.5 } else { 1.0 };

    peaks
        .iter()
        .map(|peak| {
            let (mass, stats) = hist.region_sums(peak.left_valley, peak.right_valley, edge_share);
            let (saturation, lightness) = if stats.weight > 0.0 {
                (stats.sum_s / stats.weight, stats.sum_l / stats.weight)
            } else {
                (0.5, 0.5)
            };
            let area = if hist.total_weight > 0.0 { mass / hist.total_weight } else { 0.0 };
            let peak_hue = bin_hue(peak.index, bins);

            HuePeak {
                peak_hue,
                peak_index: peak.index,
                peak_value: peak.value,
                start_hue: bin_hue(peak.left_valley, bins),
                end_hue: bin_hue(peak.right_valley, bins),
                start_index: peak.left_valley,
                end_index: peak.right_valley,
                area,
                hex: to_hex(hsl_to_rgb(peak_hue, saturation, lightness)),
                saturation,
                lightness,
                bins,
            }
        })
        .collect()
}
