use clap::Parser;
use std::fs;
use std::path::PathBuf;
use image_to_palette_wasm::{ExtractConfig, MergePass, Palette, SAMPLE_SIZE, Strategy, extract_palette_bytes};
use anyhow::{Context, Result};
use log::info;

/// Extract the dominant colours of images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Peak detection strategy: grid or valley
    #[arg(short = 's', long, default_value = "grid")]
    strategy: String,

    /// Merge pass: auto, linear, perceptual or off
    #[arg(short = 'm', long, default_value = "auto")]
    merge: String,

    /// Minimum spacing between peaks (0-1)
    #[arg(long, default_value_t = 0.08)]
    peak_distance: f64,

    /// Hue resolution, 0 = 36 bins, 1 = 360 bins
    #[arg(long, default_value_t = 1.0)]
    hue_precision: f64,

    /// Ignore pixels below this saturation (0-1)
    #[arg(long, default_value_t = 0.2)]
    min_saturation: f64,

    /// Ignore pixels this close to black or white (0-1)
    #[arg(long, default_value_t = 0.2)]
    lightness_margin: f64,

    /// Merge colours closer than this fraction of the hue circle
    #[arg(long, default_value_t = 0.08)]
    hue_merge_distance: f64,

    /// Longest side images are sampled down to before extraction
    #[arg(long, default_value_t = SAMPLE_SIZE)]
    max_size: u32,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn print_table(palette: &Palette) {
    match palette {
        Palette::Grid(colors) => {
            for c in colors {
                println!(
                    "  {}  area {:>5.1}%  h {:>5.1}  s {:.2}  l {:.2}",
                    c.hex,
                    c.area * 100.0,
                    c.hue,
                    c.saturation,
                    c.lightness
                );
            }
        }
        Palette::Valley(peaks) => {
            for p in peaks {
                println!(
                    "  {}  area {:>5.1}%  h {:>5.1} [{:.0}..{:.0}]  s {:.2}  l {:.2}",
                    p.hex,
                    p.area * 100.0,
                    p.peak_hue,
                    p.start_hue,
                    p.end_hue,
                    p.saturation,
                    p.lightness
                );
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = ExtractConfig {
        peak_distance: args.peak_distance,
        hue_precision: args.hue_precision,
        min_saturation: args.min_saturation,
        lightness_margin: args.lightness_margin,
        hue_merge_distance: args.hue_merge_distance,
        strategy: args.strategy.parse::<Strategy>()?,
        merge: args.merge.parse::<MergePass>()?,
    };
    config.validate()?;
    log::debug!("config {}", serde_json::to_string(&config)?);

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let palette = extract_palette_bytes(&bytes, &config, args.max_size)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;
        info!("{}: {} colours", input.display(), palette.len());

        if args.json {
            println!("{}", serde_json::to_string_pretty(&palette)?);
        } else {
            println!("{}", input.display());
            print_table(&palette);
        }
    }

    Ok(())
}
