//! Peak detection over smoothed histograms.
//!
//! `grid` works on the hue × saturation histogram, `valley` on the hue ring.
//! The pipeline picks one through [`crate::config::Strategy`].

pub mod grid;
pub mod valley;

pub use grid::{GridPeak, find_grid_peaks};
pub use valley::{LocalPeak, MAX_VALLEY_PEAKS, find_valley_peaks, local_maxima};
