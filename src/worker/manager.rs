//! Cache worker lifecycle
//!
//! Keeps the durable content bucket consistent with the declared resource
//! manifest across versioned deployments. Install stages the application
//! shell without touching shared state; activate diffs the previous
//! manifest against the new one so unchanged resources survive an upgrade
//! without re-downloading; steady-state requests are served cache-first,
//! except the root document, which is online-first.

use std::collections::BTreeSet;

use tracing::{debug, error, info, warn};

use crate::core::paths::{normalize_stored_key, request_key, ROOT_KEY};
use crate::error::CacheError;
use crate::fetch::{FetchMode, FetchResponse, Fetcher};
use crate::manifest::{ResourceManifest, MANIFEST_ENTRY};
use crate::store::BucketStore;
use crate::worker::request::{Intercepted, Request, ResponseSource};
use crate::worker::{MSG_DOWNLOAD_OFFLINE, MSG_SKIP_WAITING};

/// Temporary staging bucket, populated during install and consumed by
/// activate. Names must stay stable across worker versions so an upgrade
/// can find the previous generation's buckets.
pub const TEMP_BUCKET: &str = "appshell-temp-cache";

/// Durable content bucket served to the application.
pub const CONTENT_BUCKET: &str = "appshell-content-cache";

/// Bucket holding the previously activated manifest under one entry.
pub const MANIFEST_BUCKET: &str = "appshell-manifest";

/// Offline asset cache manager for one deployed build.
///
/// One worker is instantiated per build, configured with that build's
/// resource manifest and core set. The store outlives worker versions;
/// the manifest bucket is how consecutive versions hand state over.
pub struct CacheWorker<S, F> {
    store: S,
    fetcher: F,
    origin: String,
    manifest: ResourceManifest,
    core: Vec<String>,
    skip_waiting: bool,
    claimed: bool,
}

impl<S: BucketStore, F: Fetcher> CacheWorker<S, F> {
    /// Creates a worker for the given build.
    pub fn new(
        store: S,
        fetcher: F,
        origin: impl Into<String>,
        manifest: ResourceManifest,
        core: Vec<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            origin: origin.into(),
            manifest,
            core,
            skip_waiting: false,
            claimed: false,
        }
    }

    /// Install phase: stage every core-set resource in the temp bucket.
    ///
    /// Each resource is fetched with cache-bypassing revalidation. Neither
    /// the content bucket nor the manifest bucket is touched, so a failed
    /// install leaves the previously active generation fully servable.
    /// Any fetch failure (including a non-2xx response) fails the install.
    pub async fn install(&mut self) -> Result<(), CacheError> {
        info!(core = self.core.len(), "installing");
        self.store.open(TEMP_BUCKET).await?;

        for key in &self.core {
            let resp = self.fetcher.fetch(key, FetchMode::Reload).await?;
            if !resp.ok() {
                return Err(CacheError::fetch(key, format!("status {}", resp.status)));
            }
            self.store.put(TEMP_BUCKET, key, &resp.body).await?;
        }

        // The deployment template always requests immediate takeover.
        self.skip_waiting = true;
        Ok(())
    }

    /// Activate phase: make the staged generation the served one.
    ///
    /// On any failure the cache state is unrecoverable by design: all
    /// three buckets are wiped so the next install runs as a cold start,
    /// and the error is returned to the hosting side.
    pub async fn activate(&mut self) -> Result<(), CacheError> {
        match self.try_activate().await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(error = %e, "activation failed, wiping cache buckets");
                self.wipe().await;
                Err(e)
            }
        }
    }

    async fn try_activate(&mut self) -> Result<(), CacheError> {
        self.store.open(CONTENT_BUCKET).await?;
        self.store.open(TEMP_BUCKET).await?;
        self.store.open(MANIFEST_BUCKET).await?;

        let previous = match self.store.get(MANIFEST_BUCKET, MANIFEST_ENTRY).await? {
            Some(bytes) => Some(ResourceManifest::from_bytes(&bytes)?),
            None => None,
        };

        match previous {
            None => {
                // No prior manifest: nothing is trustworthy, start clean.
                info!("cold start, rebuilding content cache from staging");
                self.store.delete_bucket(CONTENT_BUCKET).await?;
                self.store.open(CONTENT_BUCKET).await?;
            }
            Some(old) => {
                for stored in self.store.keys(CONTENT_BUCKET).await? {
                    let key = normalize_stored_key(&stored).to_string();
                    let stale = match self.manifest.fingerprint(&key) {
                        None => true,
                        Some(fp) => old.fingerprint(&key) != Some(fp),
                    };
                    if stale {
                        debug!(key, "pruning stale entry");
                        self.store.remove(CONTENT_BUCKET, &stored).await?;
                    }
                }
            }
        }

        // Refresh the application shell from staging, overwriting any
        // retained copy.
        for key in self.store.keys(TEMP_BUCKET).await? {
            if let Some(body) = self.store.get(TEMP_BUCKET, &key).await? {
                self.store.put(CONTENT_BUCKET, &key, &body).await?;
            }
        }
        self.store.delete_bucket(TEMP_BUCKET).await?;

        let bytes = self.manifest.to_bytes()?;
        self.store.put(MANIFEST_BUCKET, MANIFEST_ENTRY, &bytes).await?;

        // Take control of open clients so caching applies without a reload.
        self.claimed = true;
        info!(resources = self.manifest.len(), "activated");
        Ok(())
    }

    /// Deletes all three buckets. Individual deletion failures are logged
    /// and swallowed; there is nothing better to do with them.
    async fn wipe(&mut self) {
        for bucket in [CONTENT_BUCKET, TEMP_BUCKET, MANIFEST_BUCKET] {
            if let Err(e) = self.store.delete_bucket(bucket).await {
                warn!(bucket, error = %e, "failed to delete bucket during wipe");
            }
        }
    }

    /// Steady-state request interception.
    ///
    /// Returns `Ok(None)` when the request must pass through to the
    /// network untouched: non-GET methods, cross-origin URLs, and keys not
    /// listed in the manifest. A returned error is a network failure the
    /// caller sees unmodified.
    pub async fn handle_fetch(&self, req: &Request) -> Result<Option<Intercepted>, CacheError> {
        if req.method != "GET" {
            return Ok(None);
        }

        let Some(key) = request_key(&self.origin, &req.url) else {
            return Ok(None);
        };

        if !self.manifest.contains(&key) {
            return Ok(None);
        }

        let intercepted = if key == ROOT_KEY {
            self.online_first(&key).await?
        } else {
            self.cache_first(&key).await?
        };
        Ok(Some(intercepted))
    }

    /// Online-first policy for the root document: the freshest entry wins,
    /// the cache is the offline fallback.
    async fn online_first(&self, key: &str) -> Result<Intercepted, CacheError> {
        match self.fetcher.fetch(key, FetchMode::Normal).await {
            Ok(resp) => {
                self.store.put(CONTENT_BUCKET, key, &resp.body).await?;
                Ok(Intercepted {
                    key: key.to_string(),
                    source: ResponseSource::Network,
                    response: resp,
                })
            }
            Err(net_err) => match self.store.get(CONTENT_BUCKET, key).await? {
                Some(body) => {
                    debug!(key, "network failed, serving cached root");
                    Ok(Intercepted {
                        key: key.to_string(),
                        source: ResponseSource::Cache,
                        response: FetchResponse::ok_with(body),
                    })
                }
                None => Err(net_err),
            },
        }
    }

    /// Cache-first, populate-on-miss policy for every other manifest key.
    /// Only successful responses are cached; unsuccessful ones are handed
    /// back uncached.
    async fn cache_first(&self, key: &str) -> Result<Intercepted, CacheError> {
        if let Some(body) = self.store.get(CONTENT_BUCKET, key).await? {
            return Ok(Intercepted {
                key: key.to_string(),
                source: ResponseSource::Cache,
                response: FetchResponse::ok_with(body),
            });
        }

        let resp = self.fetcher.fetch(key, FetchMode::Normal).await?;
        if resp.ok() {
            self.store.put(CONTENT_BUCKET, key, &resp.body).await?;
        }
        Ok(Intercepted {
            key: key.to_string(),
            source: ResponseSource::Network,
            response: resp,
        })
    }

    /// Out-of-band control channel. Payloads are exact string matches;
    /// anything else is ignored.
    pub async fn handle_message(&mut self, payload: &str) -> Result<(), CacheError> {
        match payload {
            MSG_SKIP_WAITING => {
                info!("skip-waiting requested");
                self.skip_waiting = true;
                Ok(())
            }
            MSG_DOWNLOAD_OFFLINE => self.download_offline().await,
            other => {
                debug!(payload = other, "ignoring unknown control message");
                Ok(())
            }
        }
    }

    /// Best-effort background fill: fetch every manifest resource not
    /// already cached. Individual failures are logged and skipped so one
    /// bad resource does not stop the rest from downloading.
    async fn download_offline(&self) -> Result<(), CacheError> {
        let cached: BTreeSet<String> = self
            .store
            .keys(CONTENT_BUCKET)
            .await?
            .iter()
            .map(|k| normalize_stored_key(k).to_string())
            .collect();

        let mut fetched = 0usize;
        let mut failed = 0usize;
        for key in self.manifest.keys() {
            if cached.contains(key) {
                continue;
            }
            match self.fetcher.fetch(key, FetchMode::Normal).await {
                Ok(resp) if resp.ok() => {
                    self.store.put(CONTENT_BUCKET, key, &resp.body).await?;
                    fetched += 1;
                }
                Ok(resp) => {
                    warn!(key, status = resp.status, "offline download skipped resource");
                    failed += 1;
                }
                Err(e) => {
                    warn!(key, error = %e, "offline download failed for resource");
                    failed += 1;
                }
            }
        }

        info!(fetched, failed, "offline download finished");
        Ok(())
    }

    /// Whether the worker asked to supersede an older generation.
    #[allow(dead_code)]
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Whether the worker has claimed open clients (set by activation).
    #[allow(dead_code)]
    pub fn claimed(&self) -> bool {
        self.claimed
    }

    /// This build's resource manifest.
    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    /// The underlying bucket store.
    #[allow(dead_code)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The configured fetcher.
    #[allow(dead_code)]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Consumes the worker, handing the store and fetcher over so the
    /// next build's worker can take ownership of the same cache state.
    #[allow(dead_code)]
    pub fn into_parts(self) -> (S, F) {
        (self.store, self.fetcher)
    }
}
