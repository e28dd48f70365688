//! Decoding of 8-bit chunky GeoTIFFs back into [`OutputRaster`]s

use std::io::{Read, Seek};
use std::path::Path;

use log::debug;
use ndarray::Array2;

use crate::compression::{predictor, CompressionFactory, CompressionHandler};
use crate::coordinate::{CoordinateSystemFactory, GeoTransform};
use crate::errors::{MosaicError, MosaicResult};
use crate::raster::OutputRaster;
use crate::tiff::constants::{planar_config, predictor as predictor_codes, tags};
use crate::tiff::{GeoKeyDirectory, TiffError, TiffReader, IFD};

/// One decoded block and where it lands in the image
struct Block {
    x0: usize,
    y0: usize,
    width: usize,
    rows: usize,
}

/// Reads the full resolution image of a GeoTIFF
pub struct GeoTiffReader;

impl GeoTiffReader {
    pub fn read(path: &Path) -> MosaicResult<OutputRaster> {
        if !path.exists() {
            return Err(MosaicError::SourceNotFound(path.to_path_buf()));
        }
        let mut reader = TiffReader::open(path)?;
        Self::read_from(&mut reader)
    }

    pub fn read_from<R: Read + Seek>(reader: &mut TiffReader<R>) -> MosaicResult<OutputRaster> {
        let tiff = reader.read()?;
        let ifd = tiff.main_ifd().ok_or(TiffError::GenericError("TIFF has no image".to_string()))?;

        let (width, height) = ifd.get_dimensions().ok_or(TiffError::MissingDimensions)?;
        let (width, height) = (width as usize, height as usize);
        let samples = ifd.get_samples_per_pixel() as usize;
        Self::check_layout(reader, ifd, samples)?;

        let codec: Box<dyn CompressionHandler> = CompressionFactory::create_handler(ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1))?;
        let uses_predictor = ifd.get_tag_value(tags::PREDICTOR) == Some(predictor_codes::HORIZONTAL_DIFFERENCING as u64);
        debug!("Decoding {}x{} image, {} samples, {}", width, height, samples, codec.name());

        let mut bands = vec![Array2::<u8>::zeros((height, width)); samples];

        let (offsets, counts, tile_size) = if ifd.is_tiled() {
            let tile_w = ifd.get_tag_value(tags::TILE_WIDTH).ok_or(TiffError::TagNotFound(tags::TILE_WIDTH))?;
            let tile_h = ifd.get_tag_value(tags::TILE_LENGTH).ok_or(TiffError::TagNotFound(tags::TILE_LENGTH))?;
            (reader.read_tag_values(ifd, tags::TILE_OFFSETS)?,
             reader.read_tag_values(ifd, tags::TILE_BYTE_COUNTS)?,
             Some((tile_w as usize, tile_h as usize)))
        } else {
            (reader.read_tag_values(ifd, tags::STRIP_OFFSETS)?,
             reader.read_tag_values(ifd, tags::STRIP_BYTE_COUNTS)?,
             None)
        };

        let rows_per_strip = ifd.get_tag_value(tags::ROWS_PER_STRIP)
            .map(|rows| (rows as usize).min(height))
            .unwrap_or(height)
            .max(1);

        for (index, (&offset, &count)) in offsets.iter().zip(&counts).enumerate() {
            let block = match tile_size {
                Some((tile_w, tile_h)) => {
                    let across = width.div_ceil(tile_w);
                    Block { x0: (index % across) * tile_w, y0: (index / across) * tile_h, width: tile_w, rows: tile_h }
                }
                None => Block { x0: 0, y0: index * rows_per_strip, width, rows: rows_per_strip },
            };
            if block.y0 >= height {
                continue;
            }

            let raw = reader.read_chunk(offset, count)?;
            let mut data = codec.decompress(&raw)?;
            let row_len = block.width * samples;
            if uses_predictor {
                predictor::decode_horizontal(&mut data, row_len, samples);
            }
            Self::scatter(&mut bands, &block, &data, samples, (width, height))?;
        }

        let transform = Self::read_transform(reader, ifd)?;
        let keys = GeoKeyDirectory::from_shorts(&reader.read_tag_values(ifd, tags::GEO_KEY_DIRECTORY_TAG)?)?;
        let crs = CoordinateSystemFactory::from_epsg(GeoKeyDirectory::epsg_code(&keys)?)?;

        OutputRaster::new(bands, transform, crs)
    }

    fn check_layout<R: Read + Seek>(reader: &mut TiffReader<R>, ifd: &IFD, samples: usize) -> MosaicResult<()> {
        if !(1..=4).contains(&samples) {
            return Err(TiffError::UnsupportedLayout(format!("{} samples per pixel", samples)).into());
        }
        if let Some(config) = ifd.get_tag_value(tags::PLANAR_CONFIGURATION) {
            if config != planar_config::CHUNKY as u64 {
                return Err(TiffError::UnsupportedLayout("planar (band sequential) data".to_string()).into());
            }
        }
        if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            let bits = reader.read_tag_values(ifd, tags::BITS_PER_SAMPLE)?;
            if bits.iter().any(|&b| b != 8) {
                return Err(TiffError::UnsupportedLayout(format!("bits per sample {:?}", bits)).into());
            }
        }
        Ok(())
    }

    fn scatter(
        bands: &mut [Array2<u8>],
        block: &Block,
        data: &[u8],
        samples: usize,
        (width, height): (usize, usize),
    ) -> MosaicResult<()> {
        let row_len = block.width * samples;
        let rows = block.rows.min(height - block.y0);
        if data.len() < row_len * rows {
            return Err(MosaicError::Decode(format!(
                "Block at ({}, {}) decoded to {} bytes, expected {}", block.x0, block.y0, data.len(), row_len * rows)));
        }

        let cols = block.width.min(width.saturating_sub(block.x0));
        for dy in 0..rows {
            for dx in 0..cols {
                let base = dy * row_len + dx * samples;
                for (band_index, band) in bands.iter_mut().enumerate() {
                    band[[block.y0 + dy, block.x0 + dx]] = data[base + band_index];
                }
            }
        }
        Ok(())
    }

    fn read_transform<R: Read + Seek>(reader: &mut TiffReader<R>, ifd: &IFD) -> MosaicResult<GeoTransform> {
        let scale = reader.read_f64_values(ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        let tiepoint = reader.read_f64_values(ifd, tags::MODEL_TIEPOINT_TAG)?;
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(TiffError::MissingGeoreference("incomplete pixel scale or tiepoint").into());
        }

        let (pixel_width, pixel_height) = (scale[0], scale[1]);
        let origin_x = tiepoint[3] - tiepoint[0] * pixel_width;
        let origin_y = tiepoint[4] + tiepoint[1] * pixel_height;
        Ok(GeoTransform::north_up(origin_x, origin_y, pixel_width, pixel_height))
    }
}
