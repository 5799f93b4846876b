//! A persistent response cache backed by JSON files.
//!
//! Every entry lives in its own file under `<cache dir>/<source>/<key>.json` and never expires.
//! Writes go to a uniquely named temporary file that is renamed into place, so concurrent tasks
//! writing the same key cannot leave a torn file behind.

use super::cache_lock::{CacheLockGuard, LOCK_FILE_NAME, acquire_cache_lock};
use super::path_utils::cache_file_path;
use super::provider_result::ProviderResult;
use crate::Result;
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use core::future::Future;
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::IntoAppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const LOG_TARGET: &str = "     cache";

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Result of loading an entry from the cache.
#[derive(Debug, Clone)]
pub enum CacheResult<T> {
    /// Cached data was found.
    Data(T),

    /// A negative cache entry exists, the data was previously determined to be unavailable.
    NoData(String),

    /// No usable cache entry exists (missing or corrupt).
    Miss,
}

/// Identity of a cached request: the adapter that made it and its request parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source: &'static str,
    param: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(source: &'static str, param: impl Into<String>) -> Self {
        Self {
            source,
            param: param.into(),
        }
    }

    fn file_path(&self) -> String {
        cache_file_path(self.source, &self.param)
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.source, self.param)
    }
}

/// On-disk representation of a cache entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct Envelope<T> {
    timestamp: DateTime<Utc>,
    payload: EnvelopePayload<T>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
enum EnvelopePayload<T> {
    Data(T),
    NoData(String),
}

/// A directory-backed JSON cache shared by all data-source adapters.
///
/// Cloning is cheap. The cache directory stays exclusively locked until the last clone is dropped.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: Arc<PathBuf>,
    _lock: Arc<CacheLockGuard>,
}

impl Cache {
    /// Open the cache rooted at `cache_dir`, creating it if needed and taking the cache lock.
    pub async fn open(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = cache_dir.into();
        fs::create_dir_all(&dir).into_app_err_with(|| format!("creating cache directory '{}'", dir.display()))?;
        let lock = acquire_cache_lock(&dir).await?;

        Ok(Self {
            dir: Arc::new(dir),
            _lock: Arc::new(lock),
        })
    }

    /// Returns the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load a cache entry.
    #[must_use]
    pub fn load<T>(&self, key: &CacheKey) -> CacheResult<T>
    where
        T: DeserializeOwned,
    {
        let path = self.dir.join(key.file_path());

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                log::trace!(target: LOG_TARGET, "Cache miss for {key}: {e:#}");
                return CacheResult::Miss;
            }
        };

        let envelope: Envelope<T> = match serde_json::from_reader(BufReader::new(file)) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring unreadable cache entry for {key}: {e:#}");
                return CacheResult::Miss;
            }
        };

        log::trace!(target: LOG_TARGET, "Cache hit for {key} (written {})", envelope.timestamp);

        match envelope.payload {
            EnvelopePayload::Data(data) => CacheResult::Data(data),
            EnvelopePayload::NoData(reason) => CacheResult::NoData(reason),
        }
    }

    /// Save data to the cache.
    pub fn save<T>(&self, key: &CacheKey, data: &T) -> Result<()>
    where
        T: Serialize,
    {
        let envelope = Envelope {
            timestamp: Utc::now(),
            payload: EnvelopePayload::Data(data),
        };
        self.write_envelope(key, &envelope)
    }

    /// Save a negative cache entry.
    pub fn save_no_data(&self, key: &CacheKey, reason: &str) -> Result<()> {
        let envelope = Envelope::<()> {
            timestamp: Utc::now(),
            payload: EnvelopePayload::NoData(reason.to_string()),
        };
        self.write_envelope(key, &envelope)
    }

    /// Look up a previously stored adapter answer.
    ///
    /// Returns `None` on a miss, in which case the caller must go to the network.
    #[must_use]
    pub fn lookup<T>(&self, key: &CacheKey) -> Option<ProviderResult<T>>
    where
        T: DeserializeOwned,
    {
        match self.load(key) {
            CacheResult::Data(data) => Some(ProviderResult::Found(data)),
            CacheResult::NoData(_) => Some(ProviderResult::NotFound),
            CacheResult::Miss => None,
        }
    }

    /// Record an adapter answer.
    ///
    /// Found and not-found answers are persisted. Errors are never stored so the next run retries them.
    /// A failure to write is logged and otherwise ignored.
    pub fn store<T>(&self, key: &CacheKey, result: &ProviderResult<T>)
    where
        T: Serialize,
    {
        let outcome = match result {
            ProviderResult::Found(data) => self.save(key, data),
            ProviderResult::NotFound => self.save_no_data(key, "not found"),
            ProviderResult::Error(_) => return,
        };

        if let Err(e) = outcome {
            log::warn!(target: LOG_TARGET, "Could not cache {key}: {e:#}");
        }
    }

    /// Return the cached answer for `key`, or run `compute` and cache its answer.
    ///
    /// Concurrent misses for the same key may each run `compute`; the last write wins.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &CacheKey, compute: F) -> ProviderResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<T>>,
    {
        if let Some(cached) = self.lookup(key) {
            return cached;
        }

        let result = compute().await;
        self.store(key, &result);
        result
    }

    /// Evict every entry, leaving the directory and its lock file in place.
    pub fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(self.dir.as_path())
            .into_app_err_with(|| format!("reading cache directory '{}'", self.dir.display()))?;

        for entry in entries {
            let entry = entry.into_app_err_with(|| format!("reading cache directory '{}'", self.dir.display()))?;
            if entry.file_name() == LOCK_FILE_NAME {
                continue;
            }

            let path = entry.path();
            let file_type = entry
                .file_type()
                .into_app_err_with(|| format!("inspecting '{}'", path.display()))?;

            if file_type.is_dir() {
                fs::remove_dir_all(&path).into_app_err_with(|| format!("removing '{}'", path.display()))?;
            } else {
                fs::remove_file(&path).into_app_err_with(|| format!("removing '{}'", path.display()))?;
            }
        }

        log::info!(target: LOG_TARGET, "Cleared cache at '{}'", self.dir.display());
        Ok(())
    }

    fn write_envelope<T: Serialize>(&self, key: &CacheKey, envelope: &Envelope<T>) -> Result<()> {
        let path = self.dir.join(key.file_path());

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
        }

        let temp_path = temp_path_for(&path);
        if let Err(e) = write_file(&temp_path, envelope) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        let renamed = fs::rename(&temp_path, &path);
        if renamed.is_err() {
            let _ = fs::remove_file(&temp_path);
        }
        renamed.into_app_err_with(|| format!("moving cache file into place at '{}'", path.display()))
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let counter = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{counter}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn write_file<T: Serialize>(path: &Path, envelope: &Envelope<T>) -> Result<()> {
    let file = File::create(path).into_app_err_with(|| format!("creating cache file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    #[cfg(debug_assertions)]
    let result = serde_json::to_writer_pretty(&mut writer, envelope);
    #[cfg(not(debug_assertions))]
    let result = serde_json::to_writer(&mut writer, envelope);

    result.into_app_err_with(|| format!("writing cache file '{}'", path.display()))?;
    writer
        .flush()
        .into_app_err_with(|| format!("flushing cache file '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;
    use ohno::app_err;

    #[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
    struct TestData {
        name: String,
        value: u64,
    }

    fn sample() -> TestData {
        TestData {
            name: "test".to_string(),
            value: 42,
        }
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn save_and_load_data() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "requests");

        cache.save(&key, &sample()).unwrap();

        match cache.load::<TestData>(&key) {
            CacheResult::Data(loaded) => assert_eq!(loaded, sample()),
            other => panic!("expected Data, got {other:?}"),
        }
        assert!(tmp.path().join("registry/requests.json").exists());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn save_and_load_no_data() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "missing");

        cache.save_no_data(&key, "not found").unwrap();

        match cache.load::<TestData>(&key) {
            CacheResult::NoData(reason) => assert_eq!(reason, "not found"),
            other => panic!("expected NoData, got {other:?}"),
        }
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn load_missing_and_corrupt_entries_are_misses() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();

        assert!(matches!(cache.load::<TestData>(&CacheKey::new("registry", "nope")), CacheResult::Miss));

        fs::create_dir_all(tmp.path().join("registry")).unwrap();
        fs::write(tmp.path().join("registry/bad.json"), "not valid json").unwrap();
        assert!(matches!(cache.load::<TestData>(&CacheKey::new("registry", "bad")), CacheResult::Miss));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn old_entries_never_expire() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("downloads", "old");

        let envelope = Envelope {
            timestamp: Utc::now() - chrono::Duration::days(3650),
            payload: EnvelopePayload::Data(sample()),
        };
        fs::create_dir_all(tmp.path().join("downloads")).unwrap();
        write_file(&tmp.path().join("downloads/old.json"), &envelope).unwrap();

        assert!(matches!(cache.load::<TestData>(&key), CacheResult::Data(d) if d == sample()));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn writes_leave_no_temp_files() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "requests");

        cache.save(&key, &sample()).unwrap();
        cache.save(&key, &sample()).unwrap();

        let names: Vec<_> = fs::read_dir(tmp.path().join("registry"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["requests.json".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn concurrent_writes_of_one_key_stay_readable() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "requests");

        let handles: Vec<_> = (0..32_u64)
            .map(|i| {
                let cache = cache.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    let data = TestData {
                        name: "test".to_string(),
                        value: i,
                    };
                    if i % 2 == 0 {
                        cache.store(&key, &ProviderResult::Found(data));
                    } else {
                        let _ = cache.get_or_compute(&key, || async move { ProviderResult::Found(data) }).await;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        match cache.load::<TestData>(&key) {
            CacheResult::Data(loaded) => {
                assert_eq!(loaded.name, "test");
                assert!(loaded.value < 32);
            }
            other => panic!("expected Data, got {other:?}"),
        }

        let names: Vec<_> = fs::read_dir(tmp.path().join("registry"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["requests.json".to_string()]);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn get_or_compute_memoizes_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "requests");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let result = cache
                .get_or_compute(&key, || async {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    ProviderResult::Found(sample())
                })
                .await;
            assert_eq!(result.ok(), Some(sample()));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn get_or_compute_memoizes_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "ghost");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: ProviderResult<TestData> = cache
                .get_or_compute(&key, || async {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    ProviderResult::NotFound
                })
                .await;
            assert!(matches!(result, ProviderResult::NotFound));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn get_or_compute_never_caches_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("downloads", "flaky");
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let result: ProviderResult<TestData> = cache
                .get_or_compute(&key, || async {
                    let _ = calls.fetch_add(1, Ordering::SeqCst);
                    ProviderResult::Error(Arc::new(app_err!("service unavailable")))
                })
                .await;
            assert!(matches!(result, ProviderResult::Error(_)));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(cache.load::<TestData>(&key), CacheResult::Miss));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn clear_evicts_entries_but_keeps_lock_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = Cache::open(tmp.path()).await.unwrap();
        let key = CacheKey::new("registry", "requests");

        cache.save(&key, &sample()).unwrap();
        cache.save_no_data(&CacheKey::new("index", "simple"), "empty").unwrap();

        cache.clear().unwrap();

        assert!(matches!(cache.load::<TestData>(&key), CacheResult::Miss));
        assert!(!tmp.path().join("registry").exists());
        assert!(tmp.path().join(LOCK_FILE_NAME).exists());

        // still usable afterwards
        cache.save(&key, &sample()).unwrap();
        assert!(matches!(cache.load::<TestData>(&key), CacheResult::Data(_)));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn entries_persist_across_handles() {
        let tmp = tempfile::tempdir().unwrap();
        let key = CacheKey::new("hosting", "psf/requests");

        {
            let cache = Cache::open(tmp.path()).await.unwrap();
            cache.save(&key, &sample()).unwrap();
        }

        let cache = Cache::open(tmp.path()).await.unwrap();
        assert!(matches!(cache.load::<TestData>(&key), CacheResult::Data(d) if d == sample()));
    }

    #[test]
    fn cache_key_display() {
        assert_eq!(CacheKey::new("hosting", "psf/requests").to_string(), "hosting:psf/requests");
    }
}
