use std::str::FromStr;

use serde::Serialize;

use crate::error::{ExtractError, Result};

/// Saturation axis resolution of the 2D histogram.
pub const SAT_BINS: usize = 10;
/// Pixels with alpha below this are ignored.
pub const ALPHA_CUTOFF: u8 = 128;
/// Grid peaks must reach this fraction of the global maximum.
pub const PEAK_THRESHOLD: f64 = 0.05;
/// Longest side the native entry point samples images down to.
pub const SAMPLE_SIZE: u32 = 256;

/// Peak detection strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Hue × saturation histogram with non-maximum suppression.
    #[default]
    Grid,
    /// Hue histogram split into regions at the valleys between peaks.
    Valley,
}

impl FromStr for Strategy {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "grid" | "2d" | "hue-sat" => Ok(Self::Grid),
            "valley" | "1d" | "hue" => Ok(Self::Valley),
            _ => Err(ExtractError::UnknownVariant { kind: "strategy", value: s.to_string() }),
        }
    }
}

/// Which merge pass runs on the synthesized colours.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePass {
    /// Linear for `Grid`, perceptual for `Valley`.
    #[default]
    Auto,
    Linear,
    Perceptual,
    Off,
}

impl MergePass {
    /// Resolve `Auto` against a strategy.
    pub fn resolve(self, strategy: Strategy) -> Self {
        match (self, strategy) {
            (Self::Auto, Strategy::Grid) => Self::Linear,
            (Self::Auto, Strategy::Valley) => Self::Perceptual,
            (pass, _) => pass,
        }
    }
}

impl FromStr for MergePass {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "linear" | "hue" => Ok(Self::Linear),
            "perceptual" | "ciede2000" | "de2000" => Ok(Self::Perceptual),
            "off" | "none" => Ok(Self::Off),
            _ => Err(ExtractError::UnknownVariant { kind: "merge pass", value: s.to_string() }),
        }
    }
}

/// Tuning dials for one extraction. All five dials live in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractConfig {
    /// Minimum spacing between peaks; larger values yield fewer colours.
    pub peak_distance: f64,
    /// 0 = 36 hue bins, 1 = 360 hue bins.
    pub hue_precision: f64,
    /// Filters out greyish pixels.
    pub min_saturation: f64,
    /// Filters out pixels close to black or white.
    pub lightness_margin: f64,
    /// Colours closer than this fraction of the hue circle are merged.
    pub hue_merge_distance: f64,
    pub strategy: Strategy,
    pub merge: MergePass,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            peak_distance: 0.08,
            hue_precision: 1.0,
            min_saturation: 0.2,
            lightness_margin: 0.2,
            hue_merge_distance: 0.08,
            strategy: Strategy::Grid,
            merge: MergePass::Auto,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<()> {
        let dials = [
            ("peakDistance", self.peak_distance),
            ("huePrecision", self.hue_precision),
            ("minSaturation", self.min_saturation),
            ("lightnessMargin", self.lightness_margin),
            ("hueMergeDistance", self.hue_merge_distance),
        ];
        for (field, value) in dials {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ExtractError::InvalidConfig { field, value });
            }
        }
        Ok(())
    }

    pub fn hue_bins(&self) -> usize {
        ((36.0 + self.hue_precision * 324.0).round() as usize).max(36)
    }

    pub fn filter(&self) -> PixelFilter {
        let margin = self.lightness_margin * 0.8;
        PixelFilter {
            min_saturation: self.min_saturation * 0.8,
            min_lightness: margin * 0.5,
            max_lightness: 1.0 - margin * 0.5,
        }
    }
}

/// Gaussian smoothing radius: about 8% of the shortest axis, at least one bin.
pub fn smoothing_radius(shortest_axis: usize) -> usize {
    ((shortest_axis as f64 * 0.08).round() as usize).max(1)
}

/// Saturation and lightness window a pixel must fall into to be counted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelFilter {
    pub min_saturation: f64,
    pub min_lightness: f64,
    pub max_lightness: f64,
}

impl PixelFilter {
    #[inline]
    pub fn accepts(&self, s: f64, l: f64) -> bool {
        s >= self.min_saturation && l >= self.min_lightness && l <= self.max_lightness
    }

    /// Width of the saturation range left after filtering.
    #[inline]
    pub fn saturation_range(&self) -> f64 {
        1.0 - self.min_saturation
    }
}
