//! Assembling decoded tiles into one canvas
//!
//! The canvas is sized from the first tile that is actually pasted and is
//! held as RGBA internally. It is handed out as RGB unless some pasted
//! tile carried alpha, in which case untouched areas stay transparent.

use image::{imageops, DynamicImage, RgbaImage};
use log::{debug, warn};

use crate::errors::MosaicResult;
use crate::tiles::{TileCoordinate, TileRange};

/// Edge of the blank canvas produced when no tile exists at all
const FALLBACK_TILE_SIZE: u32 = 256;

/// A finished canvas and the pixel size of the tiles it was built from
#[derive(Debug, Clone)]
pub struct Mosaic {
    pub image: DynamicImage,
    pub tile_width: u32,
    pub tile_height: u32,
}

/// Pastes tiles of one [`TileRange`] in submission order
pub struct MosaicCompositor {
    x_min: u32,
    y_min: u32,
    columns: u32,
    rows: u32,
    canvas: Option<RgbaImage>,
    tile_size: (u32, u32),
    has_alpha: bool,
    pasted: usize,
}

impl MosaicCompositor {
    pub fn new(range: &TileRange) -> Self {
        MosaicCompositor {
            x_min: range.x_min,
            y_min: range.y_min,
            columns: range.columns(),
            rows: range.rows(),
            canvas: None,
            tile_size: (FALLBACK_TILE_SIZE, FALLBACK_TILE_SIZE),
            has_alpha: false,
            pasted: 0,
        }
    }

    /// Number of tiles painted so far
    pub fn pasted(&self) -> usize {
        self.pasted
    }

    /// Paste one decoded tile; returns `false` when it was blank and skipped
    pub fn paste(&mut self, tile: &TileCoordinate, image: DynamicImage) -> MosaicResult<bool> {
        let carries_alpha = image.color().has_alpha();
        let mut pixels = image.to_rgba8();
        drop(image);

        if carries_alpha && is_blank(&pixels) {
            debug!("Tile {} is blank, skipped", tile);
            return Ok(false);
        }

        if self.canvas.is_none() {
            self.tile_size = pixels.dimensions();
            debug!("Canvas {}x{} from {}x{} tiles", self.tile_size.0 * self.columns,
                   self.tile_size.1 * self.rows, self.tile_size.0, self.tile_size.1);
        }

        let (tw, th) = self.tile_size;
        if pixels.dimensions() != (tw, th) {
            warn!("Tile {} is {}x{}, resizing to {}x{}", tile, pixels.width(), pixels.height(), tw, th);
            pixels = imageops::resize(&pixels, tw, th, imageops::FilterType::Triangle);
        }

        let (columns, rows) = (self.columns, self.rows);
        let canvas = self.canvas.get_or_insert_with(|| RgbaImage::new(tw * columns, th * rows));
        let x = (tile.x - self.x_min) as i64 * tw as i64;
        let y = (tile.y - self.y_min) as i64 * th as i64;
        imageops::replace(canvas, &pixels, x, y);

        self.has_alpha |= carries_alpha;
        self.pasted += 1;
        Ok(true)
    }

    /// Hand out the canvas, RGBA only when alpha was seen
    pub fn finish(self) -> Mosaic {
        let (tile_width, tile_height) = self.tile_size;
        let canvas = match self.canvas {
            Some(canvas) => canvas,
            None => {
                warn!("No tile could be downloaded, the mosaic is blank");
                RgbaImage::new(tile_width * self.columns, tile_height * self.rows)
            }
        };

        let image = if self.has_alpha {
            DynamicImage::ImageRgba8(canvas)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
        };
        Mosaic { image, tile_width, tile_height }
    }
}

/// Fully transparent, or black in every color channel
fn is_blank(pixels: &RgbaImage) -> bool {
    let transparent = pixels.pixels().all(|p| p[3] == 0);
    transparent || pixels.pixels().all(|p| p[0] == 0 && p[1] == 0 && p[2] == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::BoundingBox;
    use image::{Rgb, RgbImage, Rgba};

    fn range_2x2() -> TileRange {
        // Spans exactly four z1 tiles
        let bbox = BoundingBox::new(-170.0, -80.0, 170.0, 80.0).unwrap();
        TileRange::covering(&bbox, 1)
    }

    fn solid_rgb(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb(color)))
    }

    fn solid_rgba(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba(color)))
    }

    #[test]
    fn test_tiles_land_at_grid_positions() {
        let range = range_2x2();
        let mut compositor = MosaicCompositor::new(&range);
        let colors = [[255, 0, 0], [0, 255, 0], [0, 0, 255], [9, 9, 9]];
        for (tile, color) in range.iter().zip(colors) {
            assert!(compositor.paste(&tile, solid_rgb(color)).unwrap());
        }

        let mosaic = compositor.finish();
        let rgb = mosaic.image.as_rgb8().unwrap();
        assert_eq!(rgb.dimensions(), (16, 16));
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(rgb.get_pixel(15, 0), &Rgb([0, 255, 0]));
        assert_eq!(rgb.get_pixel(0, 15), &Rgb([0, 0, 255]));
        assert_eq!(rgb.get_pixel(15, 15), &Rgb([9, 9, 9]));
    }

    #[test]
    fn test_alpha_promotes_canvas_and_keeps_gaps_transparent() {
        let range = range_2x2();
        let tiles: Vec<_> = range.iter().collect();
        let mut compositor = MosaicCompositor::new(&range);
        compositor.paste(&tiles[0], solid_rgb([10, 20, 30])).unwrap();
        compositor.paste(&tiles[1], solid_rgba([1, 2, 3, 128])).unwrap();

        let mosaic = compositor.finish();
        let rgba = mosaic.image.as_rgba8().unwrap();
        assert_eq!(rgba.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(rgba.get_pixel(8, 0), &Rgba([1, 2, 3, 128]));
        assert_eq!(rgba.get_pixel(0, 8)[3], 0);
    }

    #[test]
    fn test_blank_alpha_tiles_are_skipped() {
        let range = range_2x2();
        let tiles: Vec<_> = range.iter().collect();
        let mut compositor = MosaicCompositor::new(&range);
        assert!(!compositor.paste(&tiles[0], solid_rgba([200, 200, 200, 0])).unwrap());
        assert!(!compositor.paste(&tiles[1], solid_rgba([0, 0, 0, 255])).unwrap());
        assert_eq!(compositor.pasted(), 0);

        // Nothing with alpha was pasted, so the result stays RGB
        compositor.paste(&tiles[2], solid_rgb([5, 5, 5])).unwrap();
        assert!(compositor.finish().image.as_rgb8().is_some());
    }

    #[test]
    fn test_no_tiles_gives_blank_canvas() {
        let mosaic = MosaicCompositor::new(&range_2x2()).finish();
        assert_eq!((mosaic.image.width(), mosaic.image.height()), (512, 512));
        assert_eq!((mosaic.tile_width, mosaic.tile_height), (256, 256));
    }

    #[test]
    fn test_odd_sized_tile_is_resized() {
        let range = range_2x2();
        let tiles: Vec<_> = range.iter().collect();
        let mut compositor = MosaicCompositor::new(&range);
        compositor.paste(&tiles[0], solid_rgb([1, 1, 1])).unwrap();
        let big = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([7, 7, 7])));
        compositor.paste(&tiles[3], big).unwrap();

        let mosaic = compositor.finish();
        assert_eq!(mosaic.image.width(), 16);
        assert_eq!(mosaic.image.to_rgb8().get_pixel(12, 12), &Rgb([7, 7, 7]));
    }
}
