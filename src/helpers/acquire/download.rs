//! Run-scoped download cache and fetcher
//!
//! Every transfer lands in one temporary directory owned by the [`Fetcher`].
//! A URL is transferred at most once per run; later requests for the same
//! (normalized) URL are served from the cache. Dropping the fetcher removes
//! the directory and everything in it, including after an aborted run.

use crate::core::output;
use crate::error::{Error, Result};
use crate::helpers::internal::url_utils::url_extension;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

use super::transport::Transports;

/// URL to temporary file mapping, alive for one run.
pub struct DownloadCache {
    dir: TempDir,
    entries: HashMap<Url, PathBuf>,
}

impl DownloadCache {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("extdep-")
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        Ok(Self {
            dir,
            entries: HashMap::new(),
        })
    }

    pub fn get(&self, url: &Url) -> Option<&Path> {
        self.entries.get(url).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Root of the run's temporary directory.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Unique path for the next download, keeping the URL's extension.
    fn allocate(&self, url: &Url) -> PathBuf {
        let ext = url_extension(url);
        let n = self.entries.len() + 1;
        let name = if ext.is_empty() {
            format!("download-{n}")
        } else {
            format!("download-{n}.{ext}")
        };
        self.dir.path().join("downloads").join(name)
    }

    fn insert(&mut self, url: Url, path: PathBuf) {
        self.entries.insert(url, path);
    }
}

/// Performs transfers through the scheme registry and records them in the cache.
pub struct Fetcher {
    transports: Transports,
    cache: DownloadCache,
    fetch_count: usize,
}

impl Fetcher {
    pub fn new(transports: Transports) -> Result<Self> {
        Ok(Self {
            transports,
            cache: DownloadCache::new()?,
            fetch_count: 0,
        })
    }

    /// Fetch `url` for `artifact`, returning the temporary file.
    ///
    /// A cached URL returns immediately with no network activity.
    pub fn fetch(&mut self, artifact: &str, url: &Url, timeout: Duration) -> Result<PathBuf> {
        if let Some(path) = self.cache.get(url) {
            output::debug(&format!("reusing download of {url}"));
            return Ok(path.to_path_buf());
        }

        let transport = self.transports.get(url.scheme()).ok_or_else(|| {
            Error::config(format!(
                "no transport for URL scheme \"{}\" ({url})",
                url.scheme()
            ))
        })?;

        let dest = self.cache.allocate(url);
        crate::helpers::internal::fs_utils::ensure_parent_dir(&dest)?;
        let mut file = std::fs::File::create(&dest).map_err(|e| Error::io(&dest, e))?;

        output::detail(&format!("downloading {url}"));
        let transferred = transport.fetch(url, &mut file, timeout);
        drop(file);

        let bytes = match transferred {
            Ok(bytes) => bytes,
            Err(reason) => {
                let _ = std::fs::remove_file(&dest);
                return Err(Error::Transport {
                    artifact: artifact.to_string(),
                    url: url.to_string(),
                    reason,
                });
            }
        };

        self.fetch_count += 1;
        output::debug(&format!("downloaded {bytes} bytes to {}", dest.display()));
        self.cache.insert(url.clone(), dest.clone());
        Ok(dest)
    }

    /// Number of real transfers performed so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count
    }

    pub fn cache(&self) -> &DownloadCache {
        &self.cache
    }

    /// Scratch directory inside the run's temporary directory.
    pub fn scratch_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.cache.dir().join("work").join(name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(dir)
    }
}
