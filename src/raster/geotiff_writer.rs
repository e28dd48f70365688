//! GeoTIFF serialization of [`OutputRaster`]s
//!
//! Tiles are cut from the band arrays, run through the predictor and the
//! codec, and handed to the TIFF builder. Files are written to a temporary
//! sibling and renamed into place once complete.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::compression::{predictor, CompressionFactory};
use crate::errors::{MosaicError, MosaicResult};
use crate::raster::OutputRaster;
use crate::tiff::constants::{compression, header, predictor as predictor_codes};
use crate::tiff::{RasterLayout, TiffBuilder};

/// Room reserved for IFDs and tag arrays when choosing classic vs BigTIFF
const HEADER_ALLOWANCE: u64 = 16 * 1024 * 1024;

/// Something that can persist a raster to a path
pub trait RasterWriter {
    fn write(&self, raster: &OutputRaster, path: &Path) -> MosaicResult<()>;
}

/// Encoding options for [`GeoTiffWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoTiffOptions {
    /// Internal tile edge in pixels, a multiple of 16
    pub block_size: u32,
    /// TIFF Compression tag value
    pub compression: u16,
    /// Encoder level for codecs that have one
    pub level: Option<i32>,
    /// Apply horizontal differencing before compression
    pub predictor: bool,
    /// Add half resolution overviews until one block holds the image
    pub overviews: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        GeoTiffOptions {
            block_size: 256,
            compression: compression::DEFLATE,
            level: Some(9),
            predictor: true,
            overviews: false,
        }
    }
}

/// Tiled GeoTIFF writer
#[derive(Debug, Clone, Default)]
pub struct GeoTiffWriter {
    options: GeoTiffOptions,
}

impl GeoTiffWriter {
    pub fn new(options: GeoTiffOptions) -> Self {
        GeoTiffWriter { options }
    }

    pub fn options(&self) -> &GeoTiffOptions {
        &self.options
    }

    /// Encode `raster` into any seekable sink
    pub fn write_to<W: Write + std::io::Seek>(&self, raster: &OutputRaster, sink: &mut W) -> MosaicResult<u64> {
        let block = self.options.block_size;
        if block == 0 || block % 16 != 0 {
            return Err(MosaicError::InputValidation(format!(
                "Block size {} is not a positive multiple of 16", block)));
        }

        let codec = CompressionFactory::with_level(self.options.compression as u64, self.options.level)?;

        let levels = self.pyramid(raster);
        let mut encoded = Vec::with_capacity(levels.len());
        for level in &levels {
            encoded.push(self.encode_tiles(level, codec.as_ref())?);
        }

        let payload: u64 = encoded.iter().flatten().map(|tile| tile.len() as u64).sum();
        let is_big_tiff = payload + HEADER_ALLOWANCE > header::CLASSIC_TIFF_LIMIT;

        let mut builder = TiffBuilder::new(is_big_tiff);
        for (index, (level, tiles)) in levels.iter().zip(encoded).enumerate() {
            let ifd = builder.add_ifd();
            builder.add_raster_tags(ifd, &RasterLayout {
                width: level.width(),
                height: level.height(),
                samples: level.band_count() as u16,
                has_alpha: level.has_alpha(),
                compression: codec.code(),
                predictor: if self.options.predictor {
                    predictor_codes::HORIZONTAL_DIFFERENCING
                } else {
                    predictor_codes::NONE
                },
            })?;
            builder.set_tiles(ifd, (block, block), tiles)?;

            if index == 0 {
                builder.add_georeferencing(ifd, &level.transform, &level.crs)?;
            } else {
                builder.mark_overview(ifd)?;
            }
        }

        Ok(builder.write_to(sink)?)
    }

    /// The full resolution raster followed by its overviews
    fn pyramid(&self, raster: &OutputRaster) -> Vec<OutputRaster> {
        let mut levels = vec![raster.clone()];
        if !self.options.overviews {
            return levels;
        }

        let block = self.options.block_size;
        loop {
            let Some(last) = levels.last() else { break };
            if last.width() <= block && last.height() <= block {
                break;
            }
            let next = last.decimate();
            debug!("Overview level {}: {}x{}", levels.len(), next.width(), next.height());
            levels.push(next);
        }
        levels
    }

    fn encode_tiles(&self, raster: &OutputRaster, codec: &dyn crate::compression::CompressionHandler)
                    -> MosaicResult<Vec<Vec<u8>>> {
        let block = self.options.block_size;
        let samples = raster.band_count();
        let tiles_across = raster.width().div_ceil(block);
        let tiles_down = raster.height().div_ceil(block);

        let mut tiles = Vec::with_capacity((tiles_across * tiles_down) as usize);
        for tile_row in 0..tiles_down {
            for tile_col in 0..tiles_across {
                let mut data = raster.interleave_window(tile_col * block, tile_row * block, block, block);
                if self.options.predictor {
                    predictor::encode_horizontal(&mut data, block as usize * samples, samples);
                }
                tiles.push(codec.compress(&data)?);
            }
        }
        Ok(tiles)
    }
}

impl RasterWriter for GeoTiffWriter {
    fn write(&self, raster: &OutputRaster, path: &Path) -> MosaicResult<()> {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::env::current_dir()?,
        };
        fs::create_dir_all(&directory)?;

        let temp = NamedTempFile::new_in(&directory)?;
        let mut sink = BufWriter::new(temp);
        let written = self.write_to(raster, &mut sink)?;
        let temp = sink.into_inner().map_err(|e| MosaicError::Io(e.into_error()))?;

        temp.persist(path).map_err(|e| MosaicError::Io(e.error))?;
        info!("Wrote {} ({}x{}, {} bands, {} bytes)",
              path.display(), raster.width(), raster.height(), raster.band_count(), written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{CoordinateSystem, GeoTransform};
    use crate::raster::GeoTiffReader;
    use ndarray::Array2;

    fn gradient(width: usize, height: usize, bands: usize) -> OutputRaster {
        let bands = (0..bands)
            .map(|b| Array2::from_shape_fn((height, width), |(r, c)| ((r * 3 + c * 7 + b * 50) % 256) as u8))
            .collect();
        OutputRaster::new(bands, GeoTransform::north_up(1000.0, 2000.0, 2.5, 2.5),
                          CoordinateSystem::WebMercator).unwrap()
    }

    #[test]
    fn test_write_then_read_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tif");
        let raster = gradient(300, 170, 4);

        GeoTiffWriter::default().write(&raster, &path).unwrap();
        let back = GeoTiffReader::read(&path).unwrap();

        assert_eq!(back.bands, raster.bands);
        assert_eq!(back.transform, raster.transform);
        assert_eq!(back.crs, CoordinateSystem::WebMercator);
    }

    #[test]
    fn test_overviews_stop_at_one_block() {
        let raster = gradient(100, 40, 3);
        let writer = GeoTiffWriter::new(GeoTiffOptions {
            block_size: 32,
            overviews: true,
            ..GeoTiffOptions::default()
        });

        let levels = writer.pyramid(&raster);
        let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width(), l.height())).collect();
        assert_eq!(sizes, vec![(100, 40), (50, 20), (25, 10)]);
    }

    #[test]
    fn test_rejects_odd_block_size() {
        let writer = GeoTiffWriter::new(GeoTiffOptions { block_size: 100, ..GeoTiffOptions::default() });
        let mut sink = std::io::Cursor::new(Vec::new());
        assert!(writer.write_to(&gradient(8, 8, 3), &mut sink).is_err());
    }

    #[test]
    fn test_no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.tif");
        GeoTiffWriter::default().write(&gradient(16, 16, 3), &path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
