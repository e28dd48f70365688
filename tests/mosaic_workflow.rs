//! End-to-end mosaics against an in-process tile server

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};

use approx::assert_relative_eq;
use image::{ImageFormat, Rgb, RgbImage};

use tilemosaic::coordinate::{BoundingBox, CoordinateSystem};
use tilemosaic::mosaic::{CropWindow, MosaicOutcome, MosaicRequest, Mosaicker};
use tilemosaic::raster::GeoTiffReader;
use tilemosaic::tiff::TiffReader;
use tilemosaic::tiles::{HttpClient, HttpResponse, TileRange, TransportError};
use tilemosaic::{MosaicConfig, MosaicError, NetworkError};

const TEMPLATE: &str = "http://tiles.test/{z}/{x}/{y}.png";
const SCENARIO_BBOX: [f64; 4] = [-122.0, 37.0, -121.99, 37.01];
const GREEN: [u8; 3] = [20, 180, 60];

type Handler = dyn Fn(u32, u32, usize) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Answers tile requests through `handler(x, y, attempt)`
struct MockTileServer {
    handler: Box<Handler>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl MockTileServer {
    fn new(handler: impl Fn(u32, u32, usize) -> Result<HttpResponse, TransportError> + Send + Sync + 'static)
           -> Arc<Self> {
        Arc::new(MockTileServer { handler: Box::new(handler), attempts: Mutex::new(HashMap::new()) })
    }

    fn total_requests(&self) -> usize {
        self.attempts.lock().unwrap().values().sum()
    }

    fn max_attempts_per_tile(&self) -> usize {
        self.attempts.lock().unwrap().values().copied().max().unwrap_or(0)
    }
}

impl HttpClient for MockTileServer {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            let count = attempts.entry(url.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let path = url.trim_start_matches("http://tiles.test/").trim_end_matches(".png");
        let parts: Vec<u32> = path.split('/').map(|p| p.parse().unwrap()).collect();
        (self.handler)(parts[1], parts[2], attempt)
    }
}

fn png(color: [u8; 3]) -> HttpResponse {
    let mut body = Vec::new();
    RgbImage::from_pixel(256, 256, Rgb(color))
        .write_to(&mut Cursor::new(&mut body), ImageFormat::Png)
        .unwrap();
    HttpResponse { status: 200, body }
}

fn status(code: u16) -> HttpResponse {
    HttpResponse { status: code, body: b"error".to_vec() }
}

fn pipeline(server: Arc<MockTileServer>) -> Mosaicker {
    let mut config = MosaicConfig::default();
    config.fetch.retry_delay_ms = 0;
    Mosaicker::with_client(config, server).unwrap()
}

fn request(output: &Path, zoom: u8) -> MosaicRequest {
    MosaicRequest::new(output, SCENARIO_BBOX.to_vec(), TEMPLATE).zoom(zoom)
}

fn scenario_window(zoom: u8) -> (TileRange, CropWindow) {
    let bbox = BoundingBox::from_slice(&SCENARIO_BBOX).unwrap();
    let range = TileRange::covering(&bbox, zoom);
    let window = CropWindow::for_range(&range, 256, 256, 256 * range.columns(), 256 * range.rows());
    (range, window)
}

#[test]
fn test_solid_tiles_make_solid_mosaic() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("solid.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));

    let outcome = pipeline(Arc::clone(&server)).build(&request(&output, 15).return_image(true)).unwrap();
    let MosaicOutcome::Image(image) = outcome else { panic!("expected an image") };

    let (range, window) = scenario_window(15);
    assert_eq!(range.x_min, 5279);
    assert_eq!(range.x_max, 5281);
    assert_eq!((image.width(), image.height()), (window.width, window.height));
    assert_eq!(image.width(), 233);

    let rgb = image.as_rgb8().expect("opaque tiles give an RGB mosaic");
    assert!(rgb.pixels().all(|p| p.0 == GREEN));
    assert_eq!(server.total_requests(), range.len());

    // The base raster is still written when the image is returned
    let raster = GeoTiffReader::read(&output).unwrap();
    assert_eq!((raster.width(), raster.height()), (233, window.height));
}

#[test]
fn test_written_raster_is_georeferenced_in_web_mercator() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("geo.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));

    let outcome = pipeline(server).build(&request(&output, 15)).unwrap();
    assert_eq!(outcome.path(), Some(output.as_path()));

    let raster = GeoTiffReader::read(&output).unwrap();
    assert_eq!(raster.crs, CoordinateSystem::WebMercator);
    assert_eq!(raster.band_count(), 3);

    let expected = BoundingBox::from_slice(&SCENARIO_BBOX).unwrap().to_web_mercator();
    let (min_x, min_y, max_x, max_y) = raster.bounds();
    assert_relative_eq!(min_x, expected.0, epsilon = 1e-6);
    assert_relative_eq!(min_y, expected.1, epsilon = 1e-6);
    assert_relative_eq!(max_x, expected.2, epsilon = 1e-6);
    assert_relative_eq!(max_y, expected.3, epsilon = 1e-6);
}

#[test]
fn test_missing_tiles_leave_black_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("gaps.tif");
    let (range, window) = scenario_window(15);
    let first_column = range.x_min;
    let server = MockTileServer::new(move |x, _, _| {
        if x == first_column { Ok(status(404)) } else { Ok(png(GREEN)) }
    });

    pipeline(server).build(&request(&output, 15)).unwrap();
    let raster = GeoTiffReader::read(&output).unwrap();

    // Columns left of the first tile boundary come from the missing tile
    let boundary = 256 - window.x;
    assert!(boundary > 0 && boundary < window.width);
    assert_eq!(raster.bands[1][(0, 0)], 0);
    assert_eq!(raster.bands[1][(0, (boundary - 1) as usize)], 0);
    assert_eq!(raster.bands[1][(0, boundary as usize)], GREEN[1]);
}

#[test]
fn test_empty_bodies_count_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("empty.tif");
    let server = MockTileServer::new(|_, _, _| Ok(HttpResponse { status: 200, body: Vec::new() }));

    let outcome = pipeline(server).build(&request(&output, 15).return_image(true)).unwrap();
    let MosaicOutcome::Image(image) = outcome else { panic!("expected an image") };
    assert!(image.to_rgb8().pixels().all(|p| p.0 == [0, 0, 0]));
}

#[test]
fn test_transport_failures_are_retried() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("retry.tif");
    let server = MockTileServer::new(|_, _, attempt| {
        if attempt < 3 { Err(TransportError::Timeout("timed out".into())) } else { Ok(png(GREEN)) }
    });

    pipeline(Arc::clone(&server)).build(&request(&output, 15)).unwrap();
    assert_eq!(server.max_attempts_per_tile(), 3);
    let raster = GeoTiffReader::read(&output).unwrap();
    assert_eq!(raster.bands[0][(10, 10)], GREEN[0]);
}

#[test]
fn test_exhausted_retries_fail_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.tif");
    let server = MockTileServer::new(|_, _, _| Err(TransportError::Connection("refused".into())));

    let err = pipeline(server).build(&request(&output, 15)).unwrap_err();
    assert!(matches!(err, MosaicError::Network(NetworkError::RetriesExhausted { attempts: 3, .. })));
    assert!(!output.exists());
}

#[test]
fn test_server_error_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("broken.tif");
    let server = MockTileServer::new(|_, y, _| if y % 2 == 0 { Ok(status(500)) } else { Ok(png(GREEN)) });

    let err = pipeline(server).build(&request(&output, 15)).unwrap_err();
    assert!(matches!(err, MosaicError::Network(NetworkError::HttpStatus { status: 500, .. })));
    assert!(!output.exists());
}

#[test]
fn test_existing_output_is_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("once.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));
    let mosaicker = pipeline(Arc::clone(&server));

    mosaicker.build(&request(&output, 15)).unwrap();
    let first = std::fs::read(&output).unwrap();
    let requests = server.total_requests();

    let outcome = mosaicker.build(&request(&output, 15)).unwrap();
    assert!(matches!(outcome, MosaicOutcome::Skipped(_)));
    assert_eq!(std::fs::read(&output).unwrap(), first);
    assert_eq!(server.total_requests(), requests);

    mosaicker.build(&request(&output, 15).overwrite(true)).unwrap();
    assert_eq!(server.total_requests(), 2 * requests);
}

#[test]
fn test_resolution_selects_zoom() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("res.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));

    // Zoom 15 is 4.777 m/px and zoom 16 is 2.389 m/px
    let req = MosaicRequest::new(&output, SCENARIO_BBOX.to_vec(), TEMPLATE).resolution(4.7).return_image(true);
    let MosaicOutcome::Image(image) = pipeline(server).build(&req).unwrap() else { panic!("expected an image") };
    assert_eq!(image.width(), 233);
}

#[test]
fn test_cog_output_has_overviews() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("cog.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));

    pipeline(server).build(&request(&output, 17).to_cog(true)).unwrap();

    let (_, window) = scenario_window(17);
    assert!(window.width > 512);
    let tiff = TiffReader::open(&output).unwrap().read().unwrap();
    assert!(tiff.ifds.len() >= 2);
    assert!(tiff.ifds[1].is_overview());

    let raster = GeoTiffReader::read(&output).unwrap();
    assert_eq!(raster.width(), window.width);
    assert_eq!(raster.bands[2][(5, 5)], GREEN[2]);
}

#[cfg(feature = "reproject")]
#[test]
fn test_reprojected_output_is_geographic() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("wgs84.tif");
    let server = MockTileServer::new(|_, _, _| Ok(png(GREEN)));

    pipeline(server).build(&request(&output, 15).dst_crs("EPSG:4326")).unwrap();

    let raster = GeoTiffReader::read(&output).unwrap();
    assert_eq!(raster.crs, CoordinateSystem::WGS84);
    let (west, south, east, north) = raster.bounds();
    assert_relative_eq!(west, -122.0, epsilon = 1e-4);
    assert_relative_eq!(north, 37.01, epsilon = 1e-4);
    assert!(east > -121.991 && south < 37.001);

    let (rows, cols) = raster.bands[1].dim();
    assert_eq!(raster.bands[1][(rows / 2, cols / 2)], GREEN[1]);
}

#[test]
fn test_decoded_garbage_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("garbage.tif");
    let server = MockTileServer::new(|_, _, _| Ok(HttpResponse { status: 200, body: b"<html/>".to_vec() }));

    let err = pipeline(server).build(&request(&output, 15)).unwrap_err();
    assert!(matches!(err, MosaicError::Decode(_)));
}
