//! Slippy-map tiles: indexing, sources and concurrent download

pub mod index;
pub mod source;
pub mod catalog;
pub mod http;
pub mod pool;
pub mod fetcher;

pub use self::index::{degrees_to_tile, resolution_to_zoom, tile_to_degrees, FractionalTile, TileCoordinate,
                      TileRange, ZoomSpec, MAX_ZOOM};
pub use self::source::{list_providers, NamedProvider, TileSource};
pub use self::catalog::{ProviderCatalog, ProviderEntry};
pub use self::http::{HttpClient, HttpResponse, ReqwestClient, TransportError, DEFAULT_USER_AGENT};
pub use self::pool::{TaskHandle, WorkerPool};
pub use self::fetcher::{FetchPolicy, TileBytes, TileFetcher};
