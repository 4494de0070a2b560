//! Merge passes that collapse near-duplicate palette entries.

use crate::color::{Lab, delta_e_2000, hsl_to_rgb, hue_distance, normalize_hue, rgb_to_lab, to_hex};
use crate::synth::{ExtractedColor, HuePeak};

/// CIEDE2000 distance under which two entries are the same colour.
pub const PERCEPTUAL_THRESHOLD: f64 = 10.0;
/// Only entries within this many degrees of hue are compared perceptually.
pub const PERCEPTUAL_HUE_WINDOW: f64 = 30.0;
/// Entries below this share of the total merged area are dropped.
pub const MIN_AREA_SHARE: f64 = 0.01;

/// Common view over palette entries so both merge passes work on either
/// strategy's output.
pub trait Swatch: Clone {
    fn hue(&self) -> f64;
    fn saturation(&self) -> f64;
    fn lightness(&self) -> f64;
    fn area(&self) -> f64;
    fn hex(&self) -> &str;
    /// Ordering key for the perceptual pass; the stronger entry stays
    /// representative after a merge.
    fn prominence(&self) -> f64;
    /// Union of two entries with the given hue. Areas add up; saturation and
    /// lightness are area-weighted.
    fn combine(&self, other: &Self, hue: f64) -> Self;

    /// Lab of the displayed colour, i.e. the channels behind [`Swatch::hex`].
    fn lab(&self) -> Lab {
        let rgb = hsl_to_rgb(self.hue(), self.saturation(), self.lightness());
        rgb_to_lab(rgb.red, rgb.green, rgb.blue)
    }
}

fn area_weighted(a: f64, b: f64, wa: f64, wb: f64) -> f64 {
    let total = wa + wb;
    if total > 0.0 { (a * wa + b * wb) / total } else { (a + b) / 2.0 }
}

/// Weighted mean of two hues along the shorter arc.
pub fn weighted_hue_average(h1: f64, h2: f64, w1: f64, w2: f64) -> f64 {
    let total = w1 + w2;
    if total == 0.0 {
        return h1;
    }
    let mut diff = h2 - h1;
    if diff > 180.0 {
        diff -= 360.0;
    }
    if diff < -180.0 {
        diff += 360.0;
    }
    normalize_hue(h1 + diff * w2 / total)
}

impl Swatch for ExtractedColor {
    fn hue(&self) -> f64 {
        self.hue
    }
    fn saturation(&self) -> f64 {
        self.saturation
    }
    fn lightness(&self) -> f64 {
        self.lightness
    }
    fn area(&self) -> f64 {
        self.area
    }
    fn hex(&self) -> &str {
        &self.hex
    }
    fn prominence(&self) -> f64 {
        self.area
    }

    fn combine(&self, other: &Self, hue: f64) -> Self {
        ExtractedColor::from_hsl(
            hue,
            area_weighted(self.saturation, other.saturation, self.area, other.area),
            area_weighted(self.lightness, other.lightness, self.area, other.area),
            // synthesis windows may overlap
            (self.area + other.area).min(1.0),
        )
    }
}

/// Number of bins covered by the inclusive circular range `start..=end`.
fn span(start: usize, end: usize, bins: usize) -> usize {
    (end + bins - start) % bins + 1
}

fn contains(outer: (usize, usize), inner: (usize, usize), bins: usize) -> bool {
    let outer_span = span(outer.0, outer.1, bins);
    if outer_span == bins {
        return true;
    }
    let start = (inner.0 + bins - outer.0) % bins;
    let end = (inner.1 + bins - outer.0) % bins;
    span(inner.0, inner.1, bins) <= outer_span && start <= end && end < outer_span
}

/// Smallest circular range covering both inputs. When only the whole ring
/// does, it is expressed around `anchor` as `anchor + 1 ..= anchor`.
pub fn union_range(a: (usize, usize), b: (usize, usize), bins: usize, anchor: usize) -> (usize, usize) {
    let whole = ((anchor + 1) % bins, anchor);
    [a, b, (a.0, b.1), (b.0, a.1)]
        .into_iter()
        .filter(|&r| contains(r, a, bins) && contains(r, b, bins))
        .map(|r| (span(r.0, r.1, bins), r))
        .filter(|&(len, _)| len < bins)
        .min_by_key(|&(len, _)| len)
        .map_or(whole, |(_, r)| r)
}

impl Swatch for HuePeak {
    fn hue(&self) -> f64 {
        self.peak_hue
    }
    fn saturation(&self) -> f64 {
        self.saturation
    }
    fn lightness(&self) -> f64 {
        self.lightness
    }
    fn area(&self) -> f64 {
        self.area
    }
    fn hex(&self) -> &str {
        &self.hex
    }
    fn prominence(&self) -> f64 {
        self.peak_value
    }

    fn combine(&self, other: &Self, hue: f64) -> Self {
        let bins = self.bins.max(other.bins).max(1);
        let rep = if self.peak_value >= other.peak_value { self } else { other };
        let (start_index, end_index) =
            union_range((self.start_index, self.end_index), (other.start_index, other.end_index), bins, rep.peak_index);
        let saturation = area_weighted(self.saturation, other.saturation, self.area, other.area);
        let lightness = area_weighted(self.lightness, other.lightness, self.area, other.area);

        HuePeak {
            peak_hue: hue,
            peak_index: rep.peak_index,
            peak_value: rep.peak_value,
            start_hue: start_index as f64 / bins as f64 * 360.0,
            end_hue: end_index as f64 / bins as f64 * 360.0,
            start_index,
            end_index,
            area: self.area + other.area,
            hex: to_hex(hsl_to_rgb(hue, saturation, lightness)),
            saturation,
            lightness,
            bins,
        }
    }
}

/// Merge any pair whose hue distance is below `hue_merge_distance` of the
/// full circle, rescanning from the start after every merge.
pub fn merge_linear<S: Swatch>(colors: Vec<S>, hue_merge_distance: f64) -> Vec<S> {
    if colors.is_empty() || hue_merge_distance <= 0.0 {
        return colors;
    }
    let threshold = hue_merge_distance * 360.0;
    let mut merged = colors;

    let mut changed = true;
    while changed {
        changed = false;
        'scan: for i in 0..merged.len() {
            for j in i + 1..merged.len() {
                if hue_distance(merged[i].hue(), merged[j].hue()) >= threshold {
                    continue;
                }
                let (a, b) = (&merged[i], &merged[j]);
                let hue = weighted_hue_average(a.hue(), b.hue(), a.area(), b.area());
                log::trace!("linear merge {} + {} -> hue {hue:.1}", a.hex(), b.hex());
                merged[i] = a.combine(b, hue);
                merged.remove(j);
                changed = true;
                break 'scan;
            }
        }
    }

    merged
}

/// Visit entries strongest first and fold each into the first already kept
/// entry that is close in hue and within [`PERCEPTUAL_THRESHOLD`] CIEDE2000.
pub fn merge_perceptual<S: Swatch>(mut candidates: Vec<S>) -> Vec<S> {
    candidates.sort_by(|a, b| b.prominence().total_cmp(&a.prominence()));

    let mut merged: Vec<S> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let lab = candidate.lab();
        let target = merged.iter().position(|kept| {
            hue_distance(kept.hue(), candidate.hue()) <= PERCEPTUAL_HUE_WINDOW
                && delta_e_2000(&kept.lab(), &lab) < PERCEPTUAL_THRESHOLD
        });

        match target {
            Some(i) => {
                let kept = &merged[i];
                let hue = if kept.prominence() >= candidate.prominence() { kept.hue() } else { candidate.hue() };
                log::trace!("perceptual merge {} + {}", kept.hex(), candidate.hex());
                merged[i] = kept.combine(&candidate, hue);
            }
            None => merged.push(candidate),
        }
    }

    merged
}

/// Drop entries carrying less than [`MIN_AREA_SHARE`] of the total area.
pub fn drop_low_weight<S: Swatch>(mut colors: Vec<S>) -> Vec<S> {
    let total: f64 = colors.iter().map(Swatch::area).sum();
    colors.retain(|c| c.area() >= total * MIN_AREA_SHARE);
    colors
}
