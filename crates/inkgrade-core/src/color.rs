//! Color-fill analyzer.
//!
//! For each region the dominant color is found by 32-level RGB binning and
//! compared to the target with CIEDE2000. Coverage counts colored pixels
//! regardless of hue, so a region filled with the wrong color still has
//! full coverage.

use std::collections::HashMap;

use crate::colorimetry::{color_difference, delta_e_to_score, Rgb};
use crate::geometry::BoundingBox;
use crate::model::{ColorConfig, ColorRegion};
use crate::raster::{PixelBuffer, Rgba};
use crate::results::{to_score, ColorMetrics, RegionMetrics};

/// Width of each RGB histogram bin.
const BIN_SIZE: u8 = 32;
/// Pixels below this alpha are treated as transparent.
const MIN_ALPHA: u8 = 128;
/// Channels above this are background when picking the dominant color.
const DOMINANT_WHITE: u8 = 240;
/// Channels above this are background when measuring coverage.
const COVERAGE_WHITE: u8 = 245;

fn is_near_white(px: Rgba, threshold: u8) -> bool {
    px.r > threshold && px.g > threshold && px.b > threshold
}

/// Pixel range of `bounds` clipped to the raster, as `(x0, y0, x1, y1)` half-open.
fn pixel_range<B: PixelBuffer + ?Sized>(buffer: &B, bounds: &BoundingBox) -> (u32, u32, u32, u32) {
    let clip = |v: f64, max: u32| v.clamp(0.0, max as f64) as u32;
    let x0 = clip(bounds.x.floor(), buffer.width());
    let y0 = clip(bounds.y.floor(), buffer.height());
    let x1 = clip(bounds.right().ceil(), buffer.width());
    let y1 = clip(bounds.bottom().ceil(), buffer.height());
    (x0, y0, x1.max(x0), y1.max(y0))
}

fn region_pixels<'a, B: PixelBuffer + ?Sized>(
    buffer: &'a B,
    bounds: &BoundingBox,
) -> impl Iterator<Item = Rgba> + 'a {
    let (x0, y0, x1, y1) = pixel_range(buffer, bounds);
    (y0..y1).flat_map(move |y| (x0..x1).filter_map(move |x| buffer.get(x, y)))
}

#[derive(Default)]
struct Bin {
    sum: [u64; 3],
    count: u64,
}

/// Mean color of the most populated bin, or `None` if the region holds only
/// transparent or near-white pixels. Ties go to the bin seen first.
pub fn dominant_color<B: PixelBuffer + ?Sized>(buffer: &B, bounds: &BoundingBox) -> Option<Rgb> {
    let mut bins: Vec<Bin> = Vec::new();
    let mut index: HashMap<(u8, u8, u8), usize> = HashMap::new();

    for px in region_pixels(buffer, bounds) {
        if px.a < MIN_ALPHA || is_near_white(px, DOMINANT_WHITE) {
            continue;
        }
        let key = (px.r / BIN_SIZE, px.g / BIN_SIZE, px.b / BIN_SIZE);
        let slot = *index.entry(key).or_insert_with(|| {
            bins.push(Bin::default());
            bins.len() - 1
        });
        let bin = &mut bins[slot];
        bin.sum[0] += px.r as u64;
        bin.sum[1] += px.g as u64;
        bin.sum[2] += px.b as u64;
        bin.count += 1;
    }

    let mut best: Option<&Bin> = None;
    for bin in &bins {
        if best.map_or(true, |b| bin.count > b.count) {
            best = Some(bin);
        }
    }
    best.map(|bin| {
        let avg = |s: u64| (s as f64 / bin.count as f64).round() as u8;
        Rgb::new(avg(bin.sum[0]), avg(bin.sum[1]), avg(bin.sum[2]))
    })
}

/// Percentage of opaque, non-background pixels in the region.
pub fn coverage<B: PixelBuffer + ?Sized>(buffer: &B, bounds: &BoundingBox) -> f64 {
    let mut total = 0usize;
    let mut filled = 0usize;
    for px in region_pixels(buffer, bounds) {
        total += 1;
        if px.a >= MIN_ALPHA && !is_near_white(px, COVERAGE_WHITE) {
            filled += 1;
        }
    }
    if total == 0 {
        return 0.0;
    }
    100.0 * filled as f64 / total as f64
}

pub fn analyze_region<B: PixelBuffer + ?Sized>(
    buffer: &B,
    region: &ColorRegion,
    tolerance: f64,
) -> RegionMetrics {
    let dominant = dominant_color(buffer, &region.bounds);
    let delta_e = dominant.map(|c| color_difference(c, region.target_color));
    RegionMetrics {
        region_id: region.id.clone(),
        target_color: region.target_color,
        dominant_color: dominant,
        delta_e,
        color_score: delta_e.map_or(0.0, |de| delta_e_to_score(de, tolerance)),
        coverage: coverage(buffer, &region.bounds),
    }
}

pub fn analyze<B: PixelBuffer + ?Sized>(buffer: &B, config: &ColorConfig) -> ColorMetrics {
    if config.regions.is_empty() {
        return ColorMetrics::empty();
    }
    let regions: Vec<RegionMetrics> = config
        .regions
        .iter()
        .map(|r| analyze_region(buffer, r, config.delta_e_tolerance))
        .collect();

    // unweighted by region area
    let n = regions.len() as f64;
    let color_accuracy = regions.iter().map(|r| r.color_score).sum::<f64>() / n;
    let coverage = regions.iter().map(|r| r.coverage).sum::<f64>() / n;

    tracing::debug!(
        regions = regions.len(),
        color_accuracy,
        coverage,
        "color analysis"
    );
    ColorMetrics {
        color_accuracy,
        coverage,
        regions,
    }
}

pub fn score(metrics: &ColorMetrics) -> u8 {
    to_score(metrics.color_accuracy * 0.7 + metrics.coverage * 0.3)
}
