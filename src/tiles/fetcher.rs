//! Concurrent tile downloads with retry and abort semantics
//!
//! Each tile is one GET. A 404 or an empty body means the tile does not
//! exist; transport failures are retried; any other error status is fatal
//! at once. The first fatal error stops queued downloads from starting.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, warn};

use crate::errors::{MosaicError, MosaicResult, NetworkError};
use crate::tiles::http::HttpClient;
use crate::tiles::index::TileCoordinate;
use crate::tiles::pool::WorkerPool;
use crate::tiles::source::TileSource;
use crate::utils::ProgressTracker;

/// Raw bytes of one tile, `None` when the server has no such tile
pub type TileBytes = Option<Vec<u8>>;

/// How downloads are scheduled and retried
#[derive(Debug, Clone, PartialEq)]
pub struct FetchPolicy {
    /// Concurrent downloads
    pub workers: usize,
    /// Attempts per tile, counting the first
    pub max_attempts: u32,
    /// Pause between attempts
    pub retry_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        FetchPolicy {
            workers: 5,
            max_attempts: 3,
            retry_delay: Duration::from_millis(250),
        }
    }
}

/// Downloads tiles through one shared HTTP client
pub struct TileFetcher {
    client: Arc<dyn HttpClient>,
    policy: FetchPolicy,
}

impl TileFetcher {
    pub fn new(client: Arc<dyn HttpClient>, policy: FetchPolicy) -> Self {
        TileFetcher { client, policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Download a single tile
    pub fn fetch(&self, url: &str) -> MosaicResult<TileBytes> {
        fetch_with_retry(self.client.as_ref(), url, &self.policy)
    }

    /// Download `tiles` concurrently, results in the order given
    pub fn fetch_all(
        &self,
        source: &TileSource,
        tiles: &[TileCoordinate],
        progress: &ProgressTracker,
    ) -> MosaicResult<Vec<TileBytes>> {
        let abort = Arc::new(AtomicBool::new(false));
        let mut pool = WorkerPool::new(self.policy.workers)?;

        for tile in tiles {
            let url = source.tile_url(tile);
            let client = Arc::clone(&self.client);
            let policy = self.policy.clone();
            let abort = Arc::clone(&abort);
            let progress = progress.clone();

            pool.submit(move || {
                if abort.load(Ordering::SeqCst) {
                    return Err(MosaicError::Aborted);
                }
                let result = fetch_with_retry(client.as_ref(), &url, &policy);
                match &result {
                    Ok(_) => progress.increment(1),
                    Err(e) => {
                        error!("Tile download failed: {}", e);
                        abort.store(true, Ordering::SeqCst);
                    }
                }
                result
            })?;
        }

        let mut downloaded = Vec::with_capacity(tiles.len());
        let mut aborted = false;
        for result in pool.join_all()? {
            match result {
                Ok(bytes) => downloaded.push(bytes),
                Err(MosaicError::Aborted) => aborted = true,
                Err(e) => return Err(e),
            }
        }

        if aborted {
            return Err(MosaicError::Aborted);
        }
        Ok(downloaded)
    }
}

/// One tile with the retry policy applied
pub fn fetch_with_retry(client: &dyn HttpClient, url: &str, policy: &FetchPolicy) -> MosaicResult<TileBytes> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    let response = loop {
        attempt += 1;
        match client.get(url) {
            Ok(response) => break response,
            Err(e) if attempt < max_attempts => {
                warn!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, url, e);
                if !policy.retry_delay.is_zero() {
                    thread::sleep(policy.retry_delay);
                }
            }
            Err(e) => {
                return Err(NetworkError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_error: e.to_string(),
                }.into());
            }
        }
    };

    if response.status == 404 {
        debug!("No tile at {}", url);
        return Ok(None);
    }
    if response.body.is_empty() {
        debug!("Empty tile at {}", url);
        return Ok(None);
    }
    if !(200..300).contains(&response.status) {
        return Err(NetworkError::HttpStatus { url: url.to_string(), status: response.status }.into());
    }

    debug!("Fetched {} ({} bytes)", url, response.body.len());
    Ok(Some(response.body))
}
