//! Caching of close series in front of any [`PriceSource`].
//!
//! Entries live in memory and, when the store has a directory, as one JSON
//! file per key so later processes reuse them until they expire.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::data_source::{CloseSeriesFuture, HistoryRequest, PriceSource};
use crate::{CloseSeries, ProviderId};

/// Defines how a request interacts with the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheMode {
    /// Serve a non-expired entry if present; otherwise fetch and store. (Default)
    #[default]
    Use,
    /// Always fetch, then overwrite the stored entry.
    Refresh,
    /// Always fetch; never read or write the cache.
    Bypass,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: CloseSeries,
    expires_at: Instant,
}

/// On-disk form of an entry; `expires_at` is a unix timestamp in seconds.
#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    expires_at: i64,
    series: CloseSeries,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    default_ttl: Duration,
    hits: u64,
    misses: u64,
}

/// Thread-safe TTL cache of close series.
#[derive(Debug, Clone)]
pub struct CacheStore {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
    dir: Option<PathBuf>,
}

impl CacheStore {
    /// In-memory cache for the lifetime of the process.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
                hits: 0,
                misses: 0,
            })),
            dir: None,
        }
    }

    /// Cache that also keeps entries as JSON files under `dir`.
    pub fn persistent(dir: impl Into<PathBuf>, default_ttl: Duration) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::new(default_ttl)
        }
    }

    /// Cache with a 15 minute TTL; daily closes only change once per session.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    pub async fn get(&self, key: &str) -> Option<CloseSeries> {
        let in_memory = {
            let store = self.inner.read().await;
            store
                .map
                .get(key)
                .filter(|entry| Instant::now() <= entry.expires_at)
                .map(|entry| entry.series.clone())
        };

        let found = match in_memory {
            Some(series) => Some((series, None)),
            None => match &self.dir {
                Some(dir) => read_disk_entry(&entry_path(dir, key))
                    .await
                    .map(|(series, remaining)| (series, Some(remaining))),
                None => None,
            },
        };

        let mut store = self.inner.write().await;
        match found {
            Some((series, from_disk)) => {
                store.hits += 1;
                if let Some(remaining) = from_disk {
                    store.map.insert(
                        key.to_owned(),
                        CacheEntry {
                            series: series.clone(),
                            expires_at: Instant::now() + remaining,
                        },
                    );
                }
                Some(series)
            }
            None => {
                store.misses += 1;
                None
            }
        }
    }

    /// No-op when the default TTL is zero.
    pub async fn put(&self, key: String, series: CloseSeries) {
        let ttl = {
            let mut store = self.inner.write().await;
            if store.default_ttl == Duration::ZERO {
                return;
            }
            let ttl = store.default_ttl;
            store.map.insert(
                key.clone(),
                CacheEntry {
                    series: series.clone(),
                    expires_at: Instant::now() + ttl,
                },
            );
            ttl
        };

        if let Some(dir) = &self.dir {
            if let Err(error) = write_disk_entry(dir, &key, series, ttl).await {
                tracing::warn!(key = %key, error = %error, "failed to persist cache entry");
            }
        }
    }

    /// Drops expired in-memory entries. Expired files are removed when read.
    pub async fn clear_expired(&self) {
        let now = Instant::now();
        self.inner
            .write()
            .await
            .map
            .retain(|_, entry| entry.expires_at > now);
    }

    /// Number of in-memory entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `(hits, misses)` since creation.
    pub async fn stats(&self) -> (u64, u64) {
        let store = self.inner.read().await;
        (store.hits, store.misses)
    }
}

const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// `$SECTORWATCH_HOME/cache`, else `$HOME/.sectorwatch/cache`.
pub fn default_cache_dir() -> PathBuf {
    let home = match env::var_os("SECTORWATCH_HOME") {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".sectorwatch"),
            None => PathBuf::from(".sectorwatch"),
        },
    };
    home.join("cache")
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", urlencoding::encode(key)))
}

async fn read_disk_entry(path: &Path) -> Option<(CloseSeries, Duration)> {
    let bytes = tokio::fs::read(path).await.ok()?;
    let entry: DiskEntry = match serde_json::from_slice(&bytes) {
        Ok(entry) => entry,
        Err(error) => {
            tracing::debug!(path = %path.display(), error = %error, "ignoring unreadable cache file");
            return None;
        }
    };

    let remaining = entry.expires_at - OffsetDateTime::now_utc().unix_timestamp();
    if remaining <= 0 {
        let _ = tokio::fs::remove_file(path).await;
        return None;
    }
    Some((entry.series, Duration::from_secs(remaining as u64)))
}

async fn write_disk_entry(
    dir: &Path,
    key: &str,
    series: CloseSeries,
    ttl: Duration,
) -> std::io::Result<()> {
    let expires_at = OffsetDateTime::now_utc().unix_timestamp() + ttl.as_secs() as i64;
    let bytes = serde_json::to_vec(&DiskEntry { expires_at, series })?;

    tokio::fs::create_dir_all(dir).await?;
    let path = entry_path(dir, key);
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, bytes).await?;
    tokio::fs::rename(&staging, &path).await
}

/// Caching decorator around another price source.
///
/// Keys are `<provider>:<symbol>:<start>:<end>`.
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    inner: S,
    store: CacheStore,
    mode: CacheMode,
}

impl<S: PriceSource> CachedSource<S> {
    pub fn new(inner: S, store: CacheStore, mode: CacheMode) -> Self {
        Self { inner, store, mode }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn mode(&self) -> CacheMode {
        self.mode
    }
}

impl<S: PriceSource> PriceSource for CachedSource<S> {
    fn id(&self) -> ProviderId {
        self.inner.id()
    }

    fn daily_closes<'a>(&'a self, req: HistoryRequest) -> CloseSeriesFuture<'a> {
        Box::pin(async move {
            let key = format!("{}:{}", self.inner.id(), req.cache_key());
            if self.mode == CacheMode::Use {
                if let Some(series) = self.store.get(&key).await {
                    tracing::debug!(key = %key, "close series cache hit");
                    return Ok(series);
                }
            }

            let series = self.inner.daily_closes(req).await?;
            if self.mode != CacheMode::Bypass {
                self.store.put(key, series.clone()).await;
            }
            Ok(series)
        })
    }
}
