use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use js_sys::{Array, Object, Reflect};
use wasm_bindgen::prelude::*;

pub mod color;
pub mod config;
pub mod error;
pub mod histogram;
pub mod merge;
pub mod peaks;
pub mod pipeline;
pub mod synth;

pub use config::{ExtractConfig, MergePass, SAMPLE_SIZE, Strategy};
pub use error::{ExtractError, Result};
pub use pipeline::{Palette, extract};
pub use synth::{ExtractedColor, HuePeak};

// ------------------------------------------------------------
// Image acquisition
// ------------------------------------------------------------

/// Shrink an image so that its longest side is at most `max_size`, keeping
/// the aspect ratio. Smaller images are returned unscaled.
pub fn downsample(img: &DynamicImage, max_size: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let max_side = w.max(h);
    if max_side <= max_size || max_size == 0 {
        return img.to_rgba8();
    }

    let ratio = max_size as f32 / max_side as f32;
    let out_w = ((w as f32) * ratio).round().max(1.0) as u32;
    let out_h = ((h as f32) * ratio).round().max(1.0) as u32;
    image::imageops::resize(img, out_w, out_h, FilterType::Triangle)
}

/// Decode an encoded image, down-sample it to `max_size` and extract its
/// palette.
pub fn extract_palette_bytes(input: &[u8], config: &ExtractConfig, max_size: u32) -> Result<Palette> {
    let img = image::load_from_memory(input)?;
    let sampled = downsample(&img, max_size);
    let (w, h) = sampled.dimensions();
    log::debug!("sampled {}x{} down to {w}x{h}", img.width(), img.height());
    extract(sampled.as_raw(), w, h, config)
}

// ------------------------------------------------------------
// JS bindings
// ------------------------------------------------------------

fn set(obj: &Object, key: &str, value: JsValue) -> std::result::Result<(), JsValue> {
    Reflect::set(obj, &JsValue::from_str(key), &value).map(|_| ())
}

fn color_object(hex: &str, area: f64, hue: f64, saturation: f64, lightness: f64) -> std::result::Result<Object, JsValue> {
    let obj = Object::new();
    set(&obj, "hex", JsValue::from_str(hex))?;
    set(&obj, "area", JsValue::from_f64(area))?;
    set(&obj, "hue", JsValue::from_f64(hue))?;
    set(&obj, "saturation", JsValue::from_f64(saturation))?;
    set(&obj, "lightness", JsValue::from_f64(lightness))?;
    Ok(obj)
}

/// Extract the dominant colours of an encoded image.
///
/// Every argument after `input` is optional; missing dials use the defaults
/// of [`ExtractConfig`]. Returns an array of plain objects with `hex`, `area`,
/// `hue`, `saturation` and `lightness`; the valley strategy adds the peak and
/// hue-range fields.
#[wasm_bindgen]
#[allow(clippy::too_many_arguments)]
pub fn extract_palette(
    input: Vec<u8>,
    strategy: Option<String>,
    merge: Option<String>,
    peak_distance: Option<f64>,
    hue_precision: Option<f64>,
    min_saturation: Option<f64>,
    lightness_margin: Option<f64>,
    hue_merge_distance: Option<f64>,
) -> std::result::Result<Array, JsValue> {
    let to_js = |e: ExtractError| JsValue::from_str(&e.to_string());

    let defaults = ExtractConfig::default();
    let config = ExtractConfig {
        peak_distance: peak_distance.unwrap_or(defaults.peak_distance),
        hue_precision: hue_precision.unwrap_or(defaults.hue_precision),
        min_saturation: min_saturation.unwrap_or(defaults.min_saturation),
        lightness_margin: lightness_margin.unwrap_or(defaults.lightness_margin),
        hue_merge_distance: hue_merge_distance.unwrap_or(defaults.hue_merge_distance),
        strategy: strategy.as_deref().map(str::parse).transpose().map_err(to_js)?.unwrap_or_default(),
        merge: merge.as_deref().map(str::parse).transpose().map_err(to_js)?.unwrap_or_default(),
    };

    let palette = extract_palette_bytes(&input, &config, SAMPLE_SIZE).map_err(to_js)?;

    let out = Array::new();
    match palette {
        Palette::Grid(colors) => {
            for c in colors {
                let obj = color_object(&c.hex, c.area, c.hue, c.saturation, c.lightness)?;
                out.push(&obj);
            }
        }
        Palette::Valley(peaks) => {
            for p in peaks {
                let obj = color_object(&p.hex, p.area, p.peak_hue, p.saturation, p.lightness)?;
                set(&obj, "peakHue", JsValue::from_f64(p.peak_hue))?;
                set(&obj, "peakIndex", JsValue::from_f64(p.peak_index as f64))?;
                set(&obj, "peakValue", JsValue::from_f64(p.peak_value))?;
                set(&obj, "startHue", JsValue::from_f64(p.start_hue))?;
                set(&obj, "endHue", JsValue::from_f64(p.end_hue))?;
                set(&obj, "startIndex", JsValue::from_f64(p.start_index as f64))?;
                set(&obj, "endIndex", JsValue::from_f64(p.end_index as f64))?;
                out.push(&obj);
            }
        }
    }

    Ok(out)
}
