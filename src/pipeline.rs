//! sample → histogram → smooth → peaks → colours → merge → rank.

use serde::Serialize;

use crate::config::{ExtractConfig, MergePass, PEAK_THRESHOLD, SAT_BINS, Strategy, smoothing_radius};
use crate::error::{ExtractError, Result};
use crate::histogram::{build_hue, build_hue_sat, smooth_hue, smooth_hue_sat};
use crate::merge::{Swatch, drop_low_weight, merge_linear, merge_perceptual};
use crate::peaks::{MAX_VALLEY_PEAKS, find_grid_peaks, find_valley_peaks};
use crate::synth::{ExtractedColor, HuePeak, synthesize_grid, synthesize_valley};

/// Most colours the grid strategy returns.
pub const MAX_GRID_COLORS: usize = 9;

/// Extraction result, shaped by the strategy that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "strategy", content = "colors", rename_all = "lowercase")]
pub enum Palette {
    Grid(Vec<ExtractedColor>),
    Valley(Vec<HuePeak>),
}

impl Palette {
    pub fn len(&self) -> usize {
        match self {
            Palette::Grid(c) => c.len(),
            Palette::Valley(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hexes(&self) -> Vec<String> {
        match self {
            Palette::Grid(c) => c.iter().map(|c| c.hex.clone()).collect(),
            Palette::Valley(c) => c.iter().map(|c| c.hex.clone()).collect(),
        }
    }

    pub fn areas(&self) -> Vec<f64> {
        match self {
            Palette::Grid(c) => c.iter().map(|c| c.area).collect(),
            Palette::Valley(c) => c.iter().map(|c| c.area).collect(),
        }
    }
}

/// Extract the dominant colours of a `width × height` RGBA buffer.
///
/// The buffer is used as-is; callers down-sample beforehand. Images whose
/// pixels are all filtered out yield an empty palette, not an error.
pub fn extract(pixels: &[u8], width: u32, height: u32, config: &ExtractConfig) -> Result<Palette> {
    config.validate()?;
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(ExtractError::BufferSize { expected, actual: pixels.len() });
    }

    let palette = match config.strategy {
        Strategy::Grid => Palette::Grid(extract_grid(pixels, config)),
        Strategy::Valley => Palette::Valley(extract_valley(pixels, config)),
    };
    log::debug!("extracted {} colours from {width}x{height} ({:?})", palette.len(), config.strategy);
    Ok(palette)
}

fn run_merge<S: Swatch>(colors: Vec<S>, config: &ExtractConfig) -> Vec<S> {
    match config.merge.resolve(config.strategy) {
        MergePass::Linear => merge_linear(colors, config.hue_merge_distance),
        MergePass::Perceptual => merge_perceptual(colors),
        MergePass::Off | MergePass::Auto => colors,
    }
}

fn extract_grid(pixels: &[u8], config: &ExtractConfig) -> Vec<ExtractedColor> {
    let hue_bins = config.hue_bins();
    let filter = config.filter();
    let hist = build_hue_sat(pixels, hue_bins, SAT_BINS, &filter);
    log::debug!("hue×sat histogram: {hue_bins}×{SAT_BINS} bins, {} samples, mass {:.3}", hist.samples, hist.total_weight);
    if hist.total_weight == 0.0 {
        return Vec::new();
    }

    let radius = smoothing_radius(hue_bins.min(SAT_BINS));
    let smoothed = smooth_hue_sat(&hist.bins, hue_bins, SAT_BINS, radius);
    let peaks = find_grid_peaks(
        &smoothed,
        hue_bins,
        SAT_BINS,
        PEAK_THRESHOLD,
        config.peak_distance,
        config.peak_distance * 2.0,
    );

    let mut colors = synthesize_grid(&peaks, &hist, config.peak_distance, &filter);
    rank_by_visual_power(&mut colors);
    let mut colors = run_merge(colors, config);
    colors.truncate(MAX_GRID_COLORS);
    colors
}

fn extract_valley(pixels: &[u8], config: &ExtractConfig) -> Vec<HuePeak> {
    let hue_bins = config.hue_bins();
    let filter = config.filter();
    let hist = build_hue(pixels, hue_bins, &filter);
    log::debug!("hue histogram: {hue_bins} bins, {} samples, mass {:.3}", hist.samples, hist.total_weight);
    if hist.total_weight == 0.0 {
        return Vec::new();
    }

    let smoothed = smooth_hue(&hist.bins, smoothing_radius(hue_bins));
    let peaks = find_valley_peaks(&smoothed, MAX_VALLEY_PEAKS);
    let colors = synthesize_valley(&peaks, &hist);

    let mut colors = drop_low_weight(run_merge(colors, config));
    colors.sort_by(|a, b| b.area.total_cmp(&a.area));
    colors
}

/// Vivid, mid-lightness colours that do not dominate the image score
/// highest.
pub fn visual_power(color: &ExtractedColor) -> f64 {
    let intensity = color.saturation * (1.0 - 2.0 * (color.lightness - 0.5).abs());
    (intensity + 0.1) * (0.9 - color.area)
}

pub fn rank_by_visual_power(colors: &mut [ExtractedColor]) {
    colors.sort_by(|a, b| visual_power(b).total_cmp(&visual_power(a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = extract(&[0; 12], 2, 2, &ExtractConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::BufferSize { expected: 16, actual: 12 }));
    }

    #[test]
    fn rejects_bad_config() {
        let cfg = ExtractConfig { min_saturation: 1.5, ..Default::default() };
        assert!(matches!(extract(&[0; 4], 1, 1, &cfg), Err(ExtractError::InvalidConfig { .. })));
    }

    #[test]
    fn empty_buffer_gives_empty_palette() {
        let palette = extract(&[], 0, 0, &ExtractConfig::default()).unwrap();
        assert_eq!(palette, Palette::Grid(Vec::new()));
        assert!(palette.is_empty());
    }

    #[test]
    fn vivid_small_colours_rank_first() {
        let mut colors = vec![
            ExtractedColor::from_hsl(30.0, 0.3, 0.5, 0.7),
            ExtractedColor::from_hsl(200.0, 0.9, 0.5, 0.1),
            ExtractedColor::from_hsl(100.0, 0.9, 0.9, 0.1),
        ];
        rank_by_visual_power(&mut colors);
        let hues: Vec<_> = colors.iter().map(|c| c.hue).collect();
        assert_eq!(hues, vec![200.0, 100.0, 30.0]);
    }
}
