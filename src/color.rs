use palette::white_point::D65;
use palette::Srgb;

/// CIE Lab with the D65 reference white, `l` in 0-100.
pub type Lab = palette::Lab<D65, f64>;

/// Hue in degrees `[0, 360)`, saturation and lightness in the unit interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

// D65 reference white, XYZ scaled to Y = 100.
const REF_X: f64 = 95.047;
const REF_Y: f64 = 100.0;
const REF_Z: f64 = 108.883;

/// Wrap any angle into `[0, 360)`.
#[inline]
pub fn normalize_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 { 0.0 } else { h }
}

/// Shortest angular distance between two hues, in `[0, 180]`.
#[inline]
pub fn hue_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).abs().rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Shortest distance between two bins on a circular axis of `bins` entries.
#[inline]
pub fn bin_distance(a: usize, b: usize, bins: usize) -> usize {
    let d = a.abs_diff(b) % bins;
    d.min(bins - d)
}

pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl { h: normalize_hue(h * 60.0), s, l }
}

fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

#[inline]
fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Srgb<u8> {
    if s == 0.0 {
        let v = to_channel(l);
        return Srgb::new(v, v, v);
    }

    let h = normalize_hue(h) / 360.0;
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    Srgb::new(
        to_channel(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_channel(hue_to_channel(p, q, h)),
        to_channel(hue_to_channel(p, q, h - 1.0 / 3.0)),
    )
}

pub fn to_hex(rgb: Srgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
}

#[inline]
fn srgb_decode(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

#[inline]
fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let r = srgb_decode(r as f64 / 255.0) * 100.0;
    let g = srgb_decode(g as f64 / 255.0) * 100.0;
    let b = srgb_decode(b as f64 / 255.0) * 100.0;

    let x = r * 0.4124 + g * 0.3576 + b * 0.1805;
    let y = r * 0.2126 + g * 0.7152 + b * 0.0722;
    let z = r * 0.0193 + g * 0.1192 + b * 0.9505;

    let fx = lab_f(x / REF_X);
    let fy = lab_f(y / REF_Y);
    let fz = lab_f(z / REF_Z);

    Lab::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// CIEDE2000 colour difference (Sharma, Wu & Dalal 2005) with `kL = kC = kH = 1`.
pub fn delta_e_2000(lab1: &Lab, lab2: &Lab) -> f64 {
    let (l1, a1, b1) = (lab1.l, lab1.a, lab1.b);
    let (l2, a2, b2) = (lab2.l, lab2.a, lab2.b);
    let pow25_7 = 25f64.powi(7);

    let c1 = (a1 * a1 + b1 * b1).sqrt();
    let c2 = (a2 * a2 + b2 * b2).sqrt();
    let c_bar7 = ((c1 + c2) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (c_bar7 / (c_bar7 + pow25_7)).sqrt());

    let a1p = (1.0 + g) * a1;
    let a2p = (1.0 + g) * a2;
    let c1p = (a1p * a1p + b1 * b1).sqrt();
    let c2p = (a2p * a2p + b2 * b2).sqrt();
    let h1p = if c1p == 0.0 { 0.0 } else { normalize_hue(b1.atan2(a1p).to_degrees()) };
    let h2p = if c2p == 0.0 { 0.0 } else { normalize_hue(b2.atan2(a2p).to_degrees()) };

    let delta_lp = l2 - l1;
    let delta_cp = c2p - c1p;

    let chroma_product = c1p * c2p;
    let delta_hp = if chroma_product == 0.0 {
        0.0
    } else {
        let diff = h2p - h1p;
        if diff.abs() <= 180.0 {
            diff
        } else if diff > 180.0 {
            diff - 360.0
        } else {
            diff + 360.0
        }
    };
    let delta_big_hp = 2.0 * chroma_product.sqrt() * (delta_hp / 2.0).to_radians().sin();

    let l_bar_p = (l1 + l2) / 2.0;
    let c_bar_p = (c1p + c2p) / 2.0;
    let h_bar_p = if chroma_product == 0.0 {
        h1p + h2p
    } else if (h1p - h2p).abs() <= 180.0 {
        (h1p + h2p) / 2.0
    } else if h1p + h2p < 360.0 {
        (h1p + h2p + 360.0) / 2.0
    } else {
        (h1p + h2p - 360.0) / 2.0
    };

    let t = 1.0 - 0.17 * (h_bar_p - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_bar_p).to_radians().cos()
        + 0.32 * (3.0 * h_bar_p + 6.0).to_radians().cos()
        - 0.20 * (4.0 * h_bar_p - 63.0).to_radians().cos();

    let l_offset = (l_bar_p - 50.0).powi(2);
    let s_l = 1.0 + 0.015 * l_offset / (20.0 + l_offset).sqrt();
    let s_c = 1.0 + 0.045 * c_bar_p;
    let s_h = 1.0 + 0.015 * c_bar_p * t;

    let delta_theta = 30.0 * (-((h_bar_p - 275.0) / 25.0).powi(2)).exp();
    let c_bar_p7 = c_bar_p.powi(7);
    let r_c = 2.0 * (c_bar_p7 / (c_bar_p7 + pow25_7)).sqrt();
    let r_t = -r_c * (2.0 * delta_theta).to_radians().sin();

    let dl = delta_lp / s_l;
    let dc = delta_cp / s_c;
    let dh = delta_big_hp / s_h;

    (dl * dl + dc * dc + dh * dh + r_t * dc * dh).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::color_difference::Ciede2000;
    use palette::IntoColor;

    #[test]
    fn hsl_round_trip_stays_within_one_step() {
        for r in 0..=255u8 {
            for g in 0..=255u8 {
                for b in 0..=255u8 {
                    let hsl = rgb_to_hsl(r, g, b);
                    let back = hsl_to_rgb(hsl.h, hsl.s, hsl.l);
                    assert!(back.red.abs_diff(r) <= 1, "{r},{g},{b} -> {back:?}");
                    assert!(back.green.abs_diff(g) <= 1, "{r},{g},{b} -> {back:?}");
                    assert!(back.blue.abs_diff(b) <= 1, "{r},{g},{b} -> {back:?}");
                }
            }
        }
    }

    #[test]
    fn gray_has_no_hue_or_saturation() {
        let hsl = rgb_to_hsl(128, 128, 128);
        assert_eq!(hsl.h, 0.0);
        assert_eq!(hsl.s, 0.0);
        assert_eq!(hsl_to_rgb(0.0, 0.0, hsl.l), Srgb::new(128, 128, 128));
    }

    #[test]
    fn primary_hues() {
        assert_eq!(rgb_to_hsl(255, 0, 0).h, 0.0);
        assert!((rgb_to_hsl(0, 255, 0).h - 120.0).abs() < 1e-9);
        assert!((rgb_to_hsl(0, 0, 255).h - 240.0).abs() < 1e-9);
        assert!((rgb_to_hsl(26, 230, 230).h - 180.0).abs() < 1e-9);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(to_hex(Srgb::new(255, 8, 171)), "#ff08ab");
        assert_eq!(to_hex(Srgb::new(0, 0, 0)), "#000000");
    }

    #[test]
    fn hue_distance_is_symmetric_and_peaks_at_half_turn() {
        assert_eq!(hue_distance(10.0, 350.0), 20.0);
        assert_eq!(hue_distance(350.0, 10.0), 20.0);
        assert_eq!(hue_distance(0.0, 180.0), 180.0);
        for h in [0.0, 45.0, 90.0, 271.0] {
            assert!(hue_distance(h, h + 170.0) < hue_distance(h, h + 180.0));
            assert!(hue_distance(h, h + 190.0) < hue_distance(h, h + 180.0));
        }

        let bins = 36;
        assert_eq!(bin_distance(1, 35, bins), 2);
        assert_eq!(bin_distance(35, 1, bins), 2);
        let max = (0..bins).map(|b| bin_distance(0, b, bins)).max();
        assert_eq!(max, Some(bins / 2));
        assert_eq!(bin_distance(0, bins / 2, bins), bins / 2);
    }

    #[test]
    fn lab_matches_palette_conversion() {
        for &(r, g, b) in &[(255, 0, 0), (12, 200, 90), (250, 250, 250), (0, 0, 0), (70, 30, 160)] {
            let ours = rgb_to_lab(r, g, b);
            let srgb = Srgb::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0);
            let linear: palette::LinSrgb<f64> = srgb.into_linear();
            let theirs: Lab = linear.into_color();
            assert!((ours.l - theirs.l).abs() < 0.1, "L for {r},{g},{b}");
            assert!((ours.a - theirs.a).abs() < 0.2, "a for {r},{g},{b}");
            assert!((ours.b - theirs.b).abs() < 0.2, "b for {r},{g},{b}");
        }
    }

    #[test]
    fn delta_e_identity_is_zero() {
        for &(r, g, b) in &[(255, 0, 0), (12, 200, 90), (128, 128, 128), (0, 0, 0)] {
            let lab = rgb_to_lab(r, g, b);
            assert_eq!(delta_e_2000(&lab, &lab), 0.0);
        }
    }

    #[test]
    fn delta_e_reference_pairs() {
        // Sharma et al. test data
        let cases = [
            ((50.0, 2.6772, -79.7751), (50.0, 0.0, -82.7485), 2.0425),
            ((50.0, 3.1571, -77.2803), (50.0, 0.0, -82.7485), 2.8615),
            ((50.0, -1.3802, -84.2814), (50.0, 0.0, -82.7485), 1.0000),
            ((50.0, 0.0, 0.0), (50.0, -1.0, 2.0), 2.3669),
            ((50.0, 2.5, 0.0), (73.0, 25.0, -18.0), 27.1492),
            ((50.0, 2.5, 0.0), (50.0, 3.1736, 0.5854), 1.0000),
            ((60.2574, -34.0099, 36.2677), (60.4626, -34.1751, 39.4387), 1.2644),
            ((22.7233, 20.0904, -46.6940), (23.0331, 14.9730, -42.5619), 2.0373),
            ((90.9257, -0.5406, -0.9208), (88.6381, -0.8985, -0.7239), 1.5381),
        ];
        for ((l1, a1, b1), (l2, a2, b2), expected) in cases {
            let x = Lab::new(l1, a1, b1);
            let y = Lab::new(l2, a2, b2);
            let d = delta_e_2000(&x, &y);
            assert!((d - expected).abs() < 1e-4, "expected {expected}, got {d}");
            assert!((d - delta_e_2000(&y, &x)).abs() < 1e-9);
        }
    }

    #[test]
    fn delta_e_agrees_with_palette() {
        let a = rgb_to_lab(200, 40, 60);
        let b = rgb_to_lab(190, 70, 40);
        let ours = delta_e_2000(&a, &b);
        let theirs = a.difference(b);
        assert!((ours - theirs).abs() < 1e-3, "{ours} vs {theirs}");
    }
}
