//! Cutting the exact bounding box out of a tile-aligned mosaic

use image::DynamicImage;
use log::debug;

use crate::mosaic::compositor::Mosaic;
use crate::tiles::TileRange;

/// Pixel window of the requested extent inside the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropWindow {
    /// Window for `range`'s fractional extent, clamped to the canvas
    ///
    /// Half pixels round to even.
    pub fn for_range(range: &TileRange, tile_width: u32, tile_height: u32,
                     canvas_width: u32, canvas_height: u32) -> Self {
        let (tw, th) = (tile_width as f64, tile_height as f64);
        let x = (tw * (range.x0 - range.x_min as f64)).round_ties_even().max(0.0) as u32;
        let y = (th * (range.y0 - range.y_min as f64)).round_ties_even().max(0.0) as u32;
        let width = (tw * (range.x1 - range.x0)).round_ties_even().max(0.0) as u32;
        let height = (th * (range.y1 - range.y0)).round_ties_even().max(0.0) as u32;

        let x = x.min(canvas_width.saturating_sub(1));
        let y = y.min(canvas_height.saturating_sub(1));
        CropWindow {
            x,
            y,
            width: width.min(canvas_width - x).max(1),
            height: height.min(canvas_height - y).max(1),
        }
    }
}

/// Crop `mosaic` to the extent of `range`
///
/// An RGBA result that is opaque everywhere comes back as RGB.
pub fn crop(mosaic: &Mosaic, range: &TileRange) -> DynamicImage {
    let window = CropWindow::for_range(range, mosaic.tile_width, mosaic.tile_height,
                                       mosaic.image.width(), mosaic.image.height());
    debug!("Cropping {:?} from {}x{} canvas", window, mosaic.image.width(), mosaic.image.height());

    let cropped = mosaic.image.crop_imm(window.x, window.y, window.width, window.height);
    match cropped {
        DynamicImage::ImageRgba8(rgba) if rgba.pixels().all(|p| p[3] == 255) => {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
        }
        other => other,
    }
}
