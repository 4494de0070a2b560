use serde::Serialize;

use crate::color::bin_distance;

/// Upper bound on the number of regions the hue ring is split into.
pub const MAX_VALLEY_PEAKS: usize = 5;

/// A hue peak and the valley bins bounding its region on the ring.
///
/// The region runs forward from `left_valley` to `right_valley`, both
/// inclusive. A lone peak owns the whole ring, expressed as
/// `left_valley == index + 1` and `right_valley == index`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPeak {
    pub index: usize,
    pub value: f64,
    pub left_valley: usize,
    pub right_valley: usize,
}

impl LocalPeak {
    fn whole_ring(index: usize, value: f64, bins: usize) -> Self {
        Self { index, value, left_valley: (index + 1) % bins, right_valley: index }
    }
}

/// Indices of circular local maxima. The asymmetric tie-break lets a flat
/// top register at its edges instead of at every bin.
pub fn local_maxima(hist: &[f64]) -> Vec<usize> {
    let n = hist.len();
    (0..n)
        .filter(|&i| {
            let prev = hist[(i + n - 1) % n];
            let next = hist[(i + 1) % n];
            let curr = hist[i];
            (curr > prev && curr >= next) || (curr >= prev && curr > next)
        })
        .collect()
}

/// First strictly-lowest bin walking forward from `from` to `to`, inclusive.
fn lowest_between(hist: &[f64], from: usize, to: usize) -> usize {
    let n = hist.len();
    let steps = (to + n - from) % n;
    let mut best = from;
    for step in 1..=steps {
        let i = (from + step) % n;
        if hist[i] < hist[best] {
            best = i;
        }
    }
    best
}

/// Detect peaks on a circular hue histogram and bound each with the valleys
/// towards its neighbours, merging adjacent peaks until at most `max_peaks`
/// remain.
pub fn find_valley_peaks(hist: &[f64], max_peaks: usize) -> Vec<LocalPeak> {
    let n = hist.len();
    let mut indices = local_maxima(hist);

    if indices.is_empty() {
        // flat ring: fall back to the first maximum bin when there is any mass
        let max = hist.iter().copied().fold(0.0, f64::max);
        match hist.iter().position(|&v| v == max) {
            Some(i) if max > 0.0 => indices.push(i),
            _ => return Vec::new(),
        }
    }

    if indices.len() == 1 {
        return vec![LocalPeak::whole_ring(indices[0], hist[indices[0]], n)];
    }

    let mut peaks: Vec<LocalPeak> = indices
        .iter()
        .map(|&index| LocalPeak { index, value: hist[index], left_valley: index, right_valley: index })
        .collect();
    let count = peaks.len();
    for k in 0..count {
        let next = (k + 1) % count;
        let valley = lowest_between(hist, peaks[k].index, peaks[next].index);
        peaks[k].right_valley = valley;
        peaks[next].left_valley = valley;
    }

    let found = peaks.len();
    merge_adjacent(&mut peaks, hist, max_peaks.max(1));
    log::debug!("valley peaks: {found} local maxima, {} after merging", peaks.len());
    peaks
}

/// Repeatedly absorb the weaker of the best-scoring adjacent pair into the
/// stronger. Shallow valleys and short distances score high.
fn merge_adjacent(peaks: &mut Vec<LocalPeak>, hist: &[f64], max_peaks: usize) {
    let n = hist.len();
    let half = n as f64 / 2.0;

    while peaks.len() > max_peaks {
        let len = peaks.len();
        let mut best: Option<(usize, f64)> = None;
        for k in 0..len {
            let (a, b) = (&peaks[k], &peaks[(k + 1) % len]);
            let denom = a.value.min(b.value);
            if denom <= 0.0 {
                continue;
            }
            let closeness = 1.0 - bin_distance(a.index, b.index, n) as f64 / half;
            let score = hist[a.right_valley] / denom * (0.5 + 0.5 * closeness);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((k, score));
            }
        }

        let Some((k, score)) = best else { break };
        let j = (k + 1) % len;
        log::trace!("merging hue peaks {} and {} (score {score:.3})", peaks[k].index, peaks[j].index);
        if peaks[k].value >= peaks[j].value {
            peaks[k].right_valley = peaks[j].right_valley;
            peaks.remove(j);
        } else {
            peaks[j].left_valley = peaks[k].left_valley;
            peaks.remove(k);
        }
    }

    if let [only] = peaks.as_mut_slice() {
        *only = LocalPeak::whole_ring(only.index, only.value, n);
    }
}
