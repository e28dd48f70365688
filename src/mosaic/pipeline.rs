//! End-to-end mosaic construction
//!
//! A request moves through fixed stages:
//!
//! ```text
//! Validating -> Indexing -> Fetching -> Compositing -> Cropping -> Georeferencing
//!            -> [Reprojecting] -> [ConvertingToCog] -> Done
//! ```
//!
//! Any error ends in `Failed`. An existing output without `overwrite`
//! ends in `OutputExistsSkip` straight after validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use log::{error, info};

use crate::cog::{CogConverter, CogProfile};
use crate::components::Components;
use crate::config::MosaicConfig;
use crate::coordinate::{BoundingBox, CoordinateSystem, CoordinateSystemFactory};
use crate::errors::{MosaicError, MosaicResult};
use crate::mosaic::compositor::MosaicCompositor;
use crate::mosaic::cropper;
use crate::mosaic::decoder::{ImageTileDecoder, TileDecoder};
use crate::mosaic::georeferencer::Georeferencer;
use crate::raster::{GeoTiffWriter, RasterWriter};
use crate::reproject::{self, ReprojectOptions};
use crate::tiles::{HttpClient, ProviderCatalog, ReqwestClient, TileFetcher, TileRange, TileSource, ZoomSpec};
use crate::utils::ProgressTracker;

/// Where a request currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Indexing,
    Fetching,
    Compositing,
    Cropping,
    Georeferencing,
    Reprojecting,
    ConvertingToCog,
    Done,
    OutputExistsSkip,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Indexing => "indexing",
            PipelineStage::Fetching => "fetching",
            PipelineStage::Compositing => "compositing",
            PipelineStage::Cropping => "cropping",
            PipelineStage::Georeferencing => "georeferencing",
            PipelineStage::Reprojecting => "reprojecting",
            PipelineStage::ConvertingToCog => "converting to COG",
            PipelineStage::Done => "done",
            PipelineStage::OutputExistsSkip => "output exists, skipped",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to build
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRequest {
    pub output: PathBuf,
    /// `[west, south, east, north]` in degrees
    pub bbox: Vec<f64>,
    pub zoom: Option<u8>,
    /// Ground resolution in meters per pixel, alternative to `zoom`
    pub resolution: Option<f64>,
    /// Built-in provider, catalog name or URL template
    pub source: String,
    pub dst_crs: String,
    pub to_cog: bool,
    pub return_image: bool,
    pub overwrite: bool,
    pub quiet: bool,
}

impl MosaicRequest {
    pub fn new(output: impl Into<PathBuf>, bbox: Vec<f64>, source: &str) -> Self {
        MosaicRequest {
            output: output.into(),
            bbox,
            zoom: None,
            resolution: None,
            source: source.to_string(),
            dst_crs: "EPSG:3857".to_string(),
            to_cog: false,
            return_image: false,
            overwrite: false,
            quiet: true,
        }
    }

    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn dst_crs(mut self, crs: &str) -> Self {
        self.dst_crs = crs.to_string();
        self
    }

    pub fn to_cog(mut self, to_cog: bool) -> Self {
        self.to_cog = to_cog;
        self
    }

    pub fn return_image(mut self, return_image: bool) -> Self {
        self.return_image = return_image;
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// How a request ended
#[derive(Debug, Clone)]
pub enum MosaicOutcome {
    /// The raster, post-processed as requested, is at this path
    Written(PathBuf),
    /// The base raster was written and the cropped image is returned
    Image(DynamicImage),
    /// The output already existed and was left untouched
    Skipped(PathBuf),
}

impl MosaicOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MosaicOutcome::Written(path) | MosaicOutcome::Skipped(path) => Some(path),
            MosaicOutcome::Image(_) => None,
        }
    }
}

/// A request with every input resolved
struct Plan {
    bbox: BoundingBox,
    range: TileRange,
    source: TileSource,
    dst_crs: CoordinateSystem,
    cog_profile: Option<CogProfile>,
}

/// Builds mosaics with one HTTP client, decoder and writer
pub struct Mosaicker {
    config: MosaicConfig,
    catalog: ProviderCatalog,
    components: Components,
    fetcher: TileFetcher,
    decoder: Box<dyn TileDecoder>,
    georeferencer: Georeferencer,
}

impl Mosaicker {
    /// Pipeline talking to tile servers over HTTP
    pub fn new(config: MosaicConfig) -> MosaicResult<Self> {
        let client = ReqwestClient::new(config.timeout(), &config.fetch.user_agent)?;
        Self::with_client(config, Arc::new(client))
    }

    pub fn with_client(config: MosaicConfig, client: Arc<dyn HttpClient>) -> MosaicResult<Self> {
        let catalog = config.provider_catalog()?;
        let fetcher = TileFetcher::new(client, config.fetch_policy());
        let georeferencer = Georeferencer::new(Box::new(GeoTiffWriter::new(config.geotiff_options())));
        Ok(Mosaicker {
            config,
            catalog,
            components: Components::detect(),
            fetcher,
            decoder: Box::new(ImageTileDecoder),
            georeferencer,
        })
    }

    pub fn with_decoder(mut self, decoder: Box<dyn TileDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn RasterWriter>) -> Self {
        self.georeferencer = Georeferencer::new(writer);
        self
    }

    pub fn with_components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    /// Run `request` to completion
    pub fn build(&self, request: &MosaicRequest) -> MosaicResult<MosaicOutcome> {
        self.run(request).inspect_err(|e| {
            enter(PipelineStage::Failed);
            error!("Mosaic {} failed: {}", request.output.display(), e);
        })
    }

    fn run(&self, request: &MosaicRequest) -> MosaicResult<MosaicOutcome> {
        enter(PipelineStage::Validating);
        let plan = self.validate(request)?;

        if request.output.exists() && !request.overwrite {
            enter(PipelineStage::OutputExistsSkip);
            info!("{} already exists, pass overwrite to replace it", request.output.display());
            return Ok(MosaicOutcome::Skipped(request.output.clone()));
        }

        enter(PipelineStage::Indexing);
        let tiles: Vec<_> = plan.range.iter().collect();
        info!("{} tiles ({}x{}) at zoom {} from {}", tiles.len(), plan.range.columns(), plan.range.rows(),
              plan.range.zoom, plan.source);

        enter(PipelineStage::Fetching);
        let progress = if request.quiet {
            ProgressTracker::hidden()
        } else {
            ProgressTracker::new(tiles.len() as u64, "Downloaded image")
        };
        let downloaded = self.fetcher.fetch_all(&plan.source, &tiles, &progress)?;
        progress.finish();

        enter(PipelineStage::Compositing);
        let mut compositor = MosaicCompositor::new(&plan.range);
        for (tile, bytes) in tiles.iter().zip(downloaded) {
            if let Some(bytes) = bytes {
                let image = self.decoder.decode(&bytes)?;
                compositor.paste(tile, image)?;
            }
        }
        let mosaic = compositor.finish();

        enter(PipelineStage::Cropping);
        let image = cropper::crop(&mosaic, &plan.range);
        drop(mosaic);

        enter(PipelineStage::Georeferencing);
        self.georeferencer.write(&image, &plan.bbox, &request.output)?;
        if !request.quiet {
            info!("Image saved to {}", request.output.display());
        }

        if request.return_image {
            enter(PipelineStage::Done);
            return Ok(MosaicOutcome::Image(image));
        }

        if plan.dst_crs != CoordinateSystem::WebMercator {
            enter(PipelineStage::Reprojecting);
            let options = ReprojectOptions {
                dst_crs: plan.dst_crs,
                proj_data_dir: self.config.projection.data_dir.clone(),
                ..Default::default()
            };
            let writer = GeoTiffWriter::new(self.config.geotiff_options());
            reproject::reproject_file(&request.output, &request.output, &options, &writer)?;
        }

        if let Some(profile) = plan.cog_profile {
            enter(PipelineStage::ConvertingToCog);
            CogConverter::new(profile, self.config.cog.block_size).convert(&request.output, &request.output)?;
        }

        enter(PipelineStage::Done);
        Ok(MosaicOutcome::Written(request.output.clone()))
    }

    /// Resolve every input before anything touches the network or disk
    fn validate(&self, request: &MosaicRequest) -> MosaicResult<Plan> {
        let bbox = BoundingBox::from_slice(&request.bbox)?;
        let zoom = ZoomSpec::from_options(request.zoom, request.resolution)?.zoom()?;
        let source = TileSource::resolve(&request.source, &self.catalog, self.config.catalog.free_only)?;
        if let TileSource::UrlTemplate(_) = source {
            self.check_provider_zoom(&request.source, zoom)?;
        }
        let dst_crs = CoordinateSystemFactory::from_string(&request.dst_crs)?;

        let post_processing = !request.return_image;
        if post_processing && dst_crs != CoordinateSystem::WebMercator {
            self.components.require_reprojection()?;
        }
        let cog_profile = match post_processing && request.to_cog {
            true => Some(self.components.require_cog_profile(&self.config.cog.profile)?),
            false => None,
        };

        Ok(Plan { range: TileRange::covering(&bbox, zoom), bbox, source, dst_crs, cog_profile })
    }

    /// Catalog providers publish tiles up to their `max_zoom` only
    fn check_provider_zoom(&self, name: &str, zoom: u8) -> MosaicResult<()> {
        let Some(entry) = self.catalog.get(name, self.config.catalog.free_only) else {
            return Ok(());
        };
        if let Some(attribution) = &entry.attribution {
            info!("Tiles from {}: {}", entry.name, attribution);
        }
        match entry.max_zoom {
            Some(max_zoom) if zoom > max_zoom => Err(MosaicError::InputValidation(format!(
                "Zoom {} is above the maximum zoom {} of provider {}", zoom, max_zoom, entry.name))),
            _ => Ok(()),
        }
    }
}

fn enter(stage: PipelineStage) {
    info!("Pipeline stage: {}", stage);
}

/// Build a mosaic with default configuration over HTTP
pub fn build_mosaic(request: &MosaicRequest) -> MosaicResult<MosaicOutcome> {
    Mosaicker::new(MosaicConfig::default())?.build(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::{HttpResponse, TransportError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts requests and never answers
    struct CountingClient(AtomicUsize);

    impl HttpClient for CountingClient {
        fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse { status: 404, body: Vec::new() })
        }
    }

    fn mosaicker(client: Arc<CountingClient>) -> Mosaicker {
        Mosaicker::with_client(MosaicConfig::default(), client).unwrap()
    }

    #[test]
    fn test_invalid_requests_fail_before_network() {
        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let pipeline = mosaicker(Arc::clone(&client));
        let base = MosaicRequest::new("unused.tif", vec![-122.0, 37.0, -121.99, 37.01], "OPENSTREETMAP");

        let cases = [
            MosaicRequest { bbox: vec![1.0, 2.0, 3.0], ..base.clone().zoom(10) },
            MosaicRequest { bbox: vec![3.0, 2.0, 1.0, 4.0], ..base.clone().zoom(10) },
            base.clone(),
            base.clone().zoom(10).resolution(5.0),
            base.clone().resolution(-1.0),
            MosaicRequest { source: "not a source".to_string(), ..base.clone().zoom(10) },
            base.clone().zoom(10).dst_crs("EPSG:abc"),
        ];
        for request in &cases {
            let err = pipeline.build(request).unwrap_err();
            assert!(matches!(err, MosaicError::InputValidation(_)), "{:?}: {}", request, err);
        }
        assert_eq!(client.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zoom_above_provider_limit_is_rejected() {
        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let pipeline = mosaicker(Arc::clone(&client));
        let request = MosaicRequest::new("unused.tif", vec![-122.0, 37.0, -121.99, 37.01], "OpenTopoMap");

        let err = pipeline.build(&request.clone().zoom(18)).unwrap_err();
        assert!(matches!(err, MosaicError::InputValidation(ref msg) if msg.contains("maximum zoom 17")));
        assert_eq!(client.0.load(Ordering::SeqCst), 0);

        // Built-in names carry no limit
        let dir = tempfile::tempdir().unwrap();
        let request = MosaicRequest::new(dir.path().join("z20.tif"), vec![-122.0, 37.0, -121.9999, 37.0001],
                                         "OPENSTREETMAP").zoom(20);
        assert!(pipeline.build(&request).is_ok());
    }

    #[test]
    fn test_missing_reprojection_fails_during_validation() {
        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let pipeline = mosaicker(Arc::clone(&client))
            .with_components(Components { reprojection: false, zstd: false });
        let request = MosaicRequest::new("unused.tif", vec![-122.0, 37.0, -121.99, 37.01], "OPENSTREETMAP")
            .zoom(12)
            .dst_crs("EPSG:4326");

        let err = pipeline.build(&request).unwrap_err();
        assert!(matches!(err, MosaicError::MissingOptionalComponent(_)));
        assert_eq!(client.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_output_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("exists.tif");
        std::fs::write(&output, b"keep me").unwrap();

        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let request = MosaicRequest::new(&output, vec![-122.0, 37.0, -121.99, 37.01], "OPENSTREETMAP").zoom(15);
        let outcome = mosaicker(Arc::clone(&client)).build(&request).unwrap();

        assert!(matches!(outcome, MosaicOutcome::Skipped(ref path) if path == &output));
        assert_eq!(std::fs::read(&output).unwrap(), b"keep me");
        assert_eq!(client.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_tiles_missing_still_writes_blank_raster() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("blank.tif");
        let client = Arc::new(CountingClient(AtomicUsize::new(0)));
        let request = MosaicRequest::new(&output, vec![-122.0, 37.0, -121.99, 37.01], "OPENSTREETMAP").zoom(15);

        let outcome = mosaicker(Arc::clone(&client)).build(&request).unwrap();
        assert_eq!(outcome.path(), Some(output.as_path()));
        assert!(output.exists());
        assert!(client.0.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::ConvertingToCog.to_string(), "converting to COG");
        assert_eq!(PipelineStage::OutputExistsSkip.to_string(), "output exists, skipped");
    }
}
