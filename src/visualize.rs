//! Cluster-size histogram rendered to PNG.
//!
//! One bar per cluster, in cluster order, on a white canvas with black axes.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};

use crate::storage::{StorageError, StorageResult, write_atomic};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 500;
pub const MARGIN: u32 = 40;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR_FILL: Rgb<u8> = Rgb([70, 130, 180]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Pixel rectangle of a bar: `x0..x1` by `y0..y1`, `y1` on the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarBounds {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

fn baseline() -> u32 {
    HEIGHT - MARGIN
}

/// Geometry of bar `index` out of `count`, or `None` for a zero-height bar.
pub fn bar_bounds(index: usize, count: usize, size: usize, max_size: usize) -> Option<BarBounds> {
    if size == 0 || max_size == 0 || index >= count {
        return None;
    }
    let plot_width = (WIDTH - 2 * MARGIN) as usize;
    let plot_height = (HEIGHT - 2 * MARGIN) as usize;

    let slot = plot_width / count;
    let gap = (slot / 10).max(1);
    let x0 = MARGIN as usize + index * slot + gap;
    let x1 = (MARGIN as usize + (index + 1) * slot).saturating_sub(gap).max(x0 + 1);
    let height = (size * plot_height / max_size).max(1);

    Some(BarBounds {
        x0: x0 as u32,
        x1: x1 as u32,
        y0: baseline() - height as u32,
        y1: baseline(),
    })
}

/// Draw one bar per entry of `sizes`.
pub fn render_histogram(sizes: &[usize]) -> RgbImage {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    let max_size = sizes.iter().copied().max().unwrap_or(0);

    for (index, &size) in sizes.iter().enumerate() {
        let Some(bar) = bar_bounds(index, sizes.len(), size, max_size) else {
            continue;
        };
        for x in bar.x0..bar.x1 {
            for y in bar.y0..bar.y1 {
                let edge = x == bar.x0 || x + 1 == bar.x1 || y == bar.y0;
                image.put_pixel(x, y, if edge { INK } else { BAR_FILL });
            }
        }
    }

    // Axes
    for x in MARGIN..WIDTH - MARGIN {
        image.put_pixel(x, baseline(), INK);
    }
    for y in MARGIN..=baseline() {
        image.put_pixel(MARGIN, y, INK);
    }

    image
}

/// Encode `image` as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Render the histogram for `sizes` and write it to `path`.
pub fn save_histogram(path: &Path, sizes: &[usize]) -> StorageResult<()> {
    let bytes = encode_png(&render_histogram(sizes)).map_err(|e| StorageError::ImageEncode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    write_atomic(path, &bytes)?;
    tracing::info!(target: "storage", "wrote cluster histogram to {}", path.display());
    Ok(())
}
