use crate::report::dataset::SiteDataset;
use crate::storage::cache::DatasetCache;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the static report files.
///
/// Both calls are synchronous: a load blocks its caller until the data is
/// available or has failed.
pub trait DataSource: Send + Sync {
    /// Site ids listed in `sites.json`, in display order.
    fn sites(&self) -> Result<Vec<String>, LoadError>;

    /// The dataset of one site (`<site>.json`).
    fn site(&self, site: &str) -> Result<Arc<SiteDataset>, LoadError>;
}

/// What went wrong while loading a data file.
#[derive(Debug)]
pub enum LoadErrorKind {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidSiteId(String),
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{e}"),
            Self::Parse(e) => write!(f, "invalid JSON: {e}"),
            Self::InvalidSiteId(msg) => f.write_str(msg),
        }
    }
}

/// A failed load, naming the data file that was requested.
#[derive(Debug)]
pub struct LoadError {
    /// Location relative to the site root, e.g. `data/example.com.json`.
    pub url: String,
    pub kind: LoadErrorKind,
}

impl LoadError {
    pub fn new(url: impl Into<String>, kind: LoadErrorKind) -> Self {
        Self {
            url: url.into(),
            kind,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not load \"{}\": {}", self.url, self.kind)
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            LoadErrorKind::Io(e) => Some(e),
            LoadErrorKind::Parse(e) => Some(e),
            LoadErrorKind::InvalidSiteId(_) => None,
        }
    }
}

/// Validate that a site id is safe to use as a file name.
///
/// - Must be non-empty and at most 256 bytes.
/// - Must contain only alphanumeric ASCII characters or `.`, `-`, `_`, `:`.
/// - Must not be made of dots only (`.`, `..`).
pub fn validate_site_id(site: &str) -> Result<(), String> {
    if site.is_empty() {
        return Err("site id must not be empty".to_string());
    }
    if site.len() > 256 {
        return Err("site id must be at most 256 characters".to_string());
    }
    let valid = site
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':'));
    if !valid {
        return Err(
            "site id may only contain alphanumeric characters, '.', '-', '_', ':'".to_string(),
        );
    }
    if site.chars().all(|c| c == '.') {
        return Err("site id must not be a relative path".to_string());
    }
    Ok(())
}

/// Load counters exposed on `/metrics`.
#[derive(Debug, Default)]
pub struct LoadStats {
    loads: AtomicU64,
    failures: AtomicU64,
}

impl LoadStats {
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// Reads `sites.json` and `<site>.json` from a data directory.
///
/// Layout:
/// ```text
/// data/sites.json
/// data/example.com.json
/// ```
pub struct FsDataSource {
    data_dir: PathBuf,
    cache: DatasetCache,
    stats: Arc<LoadStats>,
}

impl FsDataSource {
    pub fn new(data_dir: &Path, cache: DatasetCache) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            cache,
            stats: Arc::new(LoadStats::default()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    pub fn stats(&self) -> Arc<LoadStats> {
        Arc::clone(&self.stats)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file_name: &str) -> Result<T, LoadError> {
        let url = format!("data/{file_name}");
        let path = self.data_dir.join(file_name);
        self.stats.loads.fetch_add(1, Ordering::Relaxed);

        let result = std::fs::read_to_string(&path)
            .map_err(LoadErrorKind::Io)
            .and_then(|contents| serde_json::from_str(&contents).map_err(LoadErrorKind::Parse));

        result.map_err(|kind| {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(path = %path.display(), error = %kind, "Failed to load data file");
            LoadError::new(url, kind)
        })
    }
}

impl DataSource for FsDataSource {
    fn sites(&self) -> Result<Vec<String>, LoadError> {
        self.read_json("sites.json")
    }

    fn site(&self, site: &str) -> Result<Arc<SiteDataset>, LoadError> {
        let file_name = format!("{site}.json");
        if let Err(msg) = validate_site_id(site) {
            self.stats.failures.fetch_add(1, Ordering::Relaxed);
            return Err(LoadError::new(
                format!("data/{file_name}"),
                LoadErrorKind::InvalidSiteId(msg),
            ));
        }

        if let Some(cached) = self.cache.get(site) {
            tracing::debug!(site, "Dataset served from cache");
            return Ok(cached);
        }

        let dataset: Arc<SiteDataset> = Arc::new(self.read_json(&file_name)?);
        tracing::info!(site, periods = dataset.periods.len(), "Loaded site dataset");
        self.cache.insert(site.to_string(), Arc::clone(&dataset));
        Ok(dataset)
    }
}
