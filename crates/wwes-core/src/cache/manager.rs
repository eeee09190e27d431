use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::api::ApiRequest;

/// Subdirectory of the system temp dir holding cached documents.
const CACHE_DIR_NAME: &str = "eveapi";

const CACHE_FILE_EXTENSION: &str = "cache";

/// Zstd level 0 selects the library default.
const COMPRESSION_LEVEL: i32 = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub cached_until: DateTime<Utc>,
    pub body: String,
}

impl CachedResponse {
    pub fn new(body: String, cached_for: Duration, now: DateTime<Utc>) -> Self {
        Self {
            cached_until: now + cached_for,
            body,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.cached_until
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let bytes = rmp_serde::to_vec(self).context("Failed to serialize cache entry")?;
        zstd::encode_all(&bytes[..], COMPRESSION_LEVEL).context("Failed to compress cache entry")
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let decompressed = zstd::decode_all(bytes).context("Failed to decompress cache entry")?;
        rmp_serde::from_slice(&decompressed).context("Failed to deserialize cache entry")
    }
}

/// Derive the cache key of a request.
///
/// Host, path and every parameter pair are fed to the hasher with a length
/// prefix. Parameters come out of a sorted map, so their insertion order
/// never changes the key.
pub fn cache_key(request: &ApiRequest) -> String {
    let mut hasher = Sha256::new();
    let mut feed = |part: &str| {
        hasher.update((part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    };
    feed(request.host.as_str());
    feed(request.path.as_str());
    for (key, value) in &request.params {
        feed(key.as_str());
        feed(value.as_str());
    }
    hex::encode(hasher.finalize())
}

/// Two-tier (memory, then disk) store of remote documents honouring the
/// validity window each document declared when it was fetched.
pub struct ResponseCache {
    cache_dir: PathBuf,
    memory: HashMap<String, CachedResponse>,
    lookups: u64,
}

impl ResponseCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir,
            memory: HashMap::new(),
            lookups: 0,
        })
    }

    /// `<temp>/eveapi`, shared by every run on this machine.
    pub fn default_dir() -> PathBuf {
        std::env::temp_dir().join(CACHE_DIR_NAME)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", key, CACHE_FILE_EXTENSION))
    }

    /// Return the cached body for `request` if it is still valid.
    /// `None` tells the caller to go to the server.
    pub fn retrieve(&mut self, request: &ApiRequest) -> Option<String> {
        self.retrieve_at(request, Utc::now())
    }

    pub(crate) fn retrieve_at(&mut self, request: &ApiRequest, now: DateTime<Utc>) -> Option<String> {
        let key = cache_key(request);
        self.lookups += 1;
        let count = self.lookups;
        let path = request.path.as_str();

        if !self.memory.contains_key(&key) {
            if let Some(entry) = self.read_entry(&key) {
                debug!(count, path, "retrieving from disk");
                self.memory.insert(key.clone(), entry);
            }
        }

        let fresh = self.memory.get(&key).map(|entry| entry.is_fresh_at(now));
        match fresh {
            Some(true) => {
                if let Some(entry) = self.memory.get(&key) {
                    debug!(count, path, until = %entry.cached_until, "returning cached document");
                    return Some(entry.body.clone());
                }
            }
            Some(false) => {
                debug!(count, path, "cache expired, purging");
                self.purge(&key);
            }
            None => {}
        }

        debug!(count, path, "not cached, fetching from server");
        None
    }

    /// Remember `body` for `cached_for`. Documents declaring no positive
    /// validity are not cached at all.
    pub fn store(&mut self, request: &ApiRequest, body: &str, cached_for: Duration) -> Result<()> {
        self.store_at(request, body, cached_for, Utc::now())
    }

    pub(crate) fn store_at(
        &mut self,
        request: &ApiRequest,
        body: &str,
        cached_for: Duration,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if cached_for <= Duration::zero() {
            debug!(path = %request.path, "document declares no validity, not caching");
            return Ok(());
        }

        let key = cache_key(request);
        debug!(path = %request.path, seconds = cached_for.num_seconds(), "cached");

        let entry = CachedResponse::new(body.to_string(), cached_for, now);
        let encoded = entry.encode()?;
        self.memory.insert(key.clone(), entry);

        let path = self.entry_path(&key);
        std::fs::write(&path, encoded)
            .with_context(|| format!("Failed to write cache file {}", path.display()))?;
        Ok(())
    }

    /// Load an entry from disk. Unreadable or corrupt files are deleted and
    /// reported as absent so the document gets fetched again.
    fn read_entry(&self, key: &str) -> Option<CachedResponse> {
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable cache file, discarding");
                self.remove_file(&path);
                return None;
            }
        };

        match CachedResponse::decode(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupt cache file, discarding");
                self.remove_file(&path);
                None
            }
        }
    }

    fn purge(&mut self, key: &str) {
        self.memory.remove(key);
        let path = self.entry_path(key);
        self.remove_file(&path);
    }

    fn remove_file(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove cache file"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
