//! GeoTIFF tag strategies
//!
//! Turns a plain TIFF IFD into a GeoTIFF one: pixel scale, a single
//! tiepoint anchoring the upper-left corner, and the GeoKey directory
//! naming the coordinate system.

use std::collections::HashMap;

use crate::coordinate::{CoordinateSystem, GeoTransform};
use crate::tiff::constants::{tags, field_types};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::geokeys::GeoKeyDirectory;
use crate::tiff::ifd::{IFD, IFDEntry};
use log::debug;

/// Handles GeoTIFF tags
pub struct GeoTagsBuilder;

impl GeoTagsBuilder {
    /// Add georeferencing tags for a north-up raster
    pub fn add_georeferencing(
        ifd: &mut IFD,
        external_data: &mut HashMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        transform: &GeoTransform,
        crs: &CoordinateSystem,
    ) -> TiffResult<()> {
        if !transform.is_north_up() {
            return Err(TiffError::GenericError(
                "Rotated geotransforms cannot be expressed with a single tiepoint".to_string()));
        }

        debug!("Georeferencing IFD #{} as {} with {}", ifd_index, crs.description(), transform);

        let scale = [transform.pixel_width, -transform.pixel_height, 0.0];
        Self::add_doubles(ifd, external_data, ifd_index, tags::MODEL_PIXEL_SCALE_TAG, &scale);

        let tiepoint = [0.0, 0.0, 0.0, transform.origin_x, transform.origin_y, 0.0];
        Self::add_doubles(ifd, external_data, ifd_index, tags::MODEL_TIEPOINT_TAG, &tiepoint);

        let directory = GeoKeyDirectory::for_crs(crs)?;
        let shorts = directory.to_shorts();
        ifd.set_entry(IFDEntry::new(tags::GEO_KEY_DIRECTORY_TAG, field_types::SHORT, shorts.len() as u64, 0));
        external_data.insert(
            (ifd_index, tags::GEO_KEY_DIRECTORY_TAG),
            shorts.iter().flat_map(|s| s.to_le_bytes()).collect(),
        );

        let mut ascii = directory.ascii_params.into_bytes();
        ascii.push(0);
        ifd.set_entry(IFDEntry::new(tags::GEO_ASCII_PARAMS_TAG, field_types::ASCII, ascii.len() as u64, 0));
        external_data.insert((ifd_index, tags::GEO_ASCII_PARAMS_TAG), ascii);

        Ok(())
    }

    fn add_doubles(
        ifd: &mut IFD,
        external_data: &mut HashMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        tag: u16,
        values: &[f64],
    ) {
        ifd.set_entry(IFDEntry::new(tag, field_types::DOUBLE, values.len() as u64, 0));
        external_data.insert((ifd_index, tag), values.iter().flat_map(|v| v.to_le_bytes()).collect());
    }
}
