//! Publishing installed artifacts to a remote repository
//!
//! The target keeps the local repository layout. `file://` targets are
//! plain copies; `http(s)://` targets receive one PUT per file, with basic
//! auth from the settings server entry matching the target id.

use crate::config::DistributionToml;
use crate::coordinates::Coordinates;
use crate::core::output;
use crate::error::{Error, Result};
use crate::helpers::acquire::transport::HttpTransport;
use crate::helpers::internal::fs_utils;
use crate::settings::{ServerCredentials, Settings};
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::repository::LocalRepository;

const DEPLOY_TIMEOUT: Duration = Duration::from_secs(300);

/// Remote repository that `deploy` publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionTarget {
    pub id: Option<String>,
    pub url: Url,
}

impl DistributionTarget {
    pub fn from_config(dist: &DistributionToml) -> Result<Self> {
        let url = Url::parse(dist.url.trim()).map_err(|e| {
            Error::config(format!("invalid distribution URL {}: {}", dist.url, e))
        })?;
        if !matches!(url.scheme(), "file" | "http" | "https") {
            return Err(Error::config(format!(
                "unsupported distribution URL scheme \"{}\" ({})",
                url.scheme(),
                dist.url
            )));
        }
        Ok(Self {
            id: dist.id.clone(),
            url,
        })
    }

    /// Location of a repository-relative path under this target.
    fn resolve(&self, rel: &Path) -> Result<Url> {
        let mut base = self.url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        base.join(&rel)
            .map_err(|e| Error::config(format!("cannot build deploy URL for {rel}: {e}")))
    }
}

pub struct Deployer {
    target: DistributionTarget,
    http: HttpTransport,
    credentials: Option<ServerCredentials>,
}

impl Deployer {
    pub fn new(target: DistributionTarget, http: HttpTransport, settings: &Settings) -> Self {
        let credentials = target
            .id
            .as_deref()
            .and_then(|id| settings.server(id))
            .cloned();
        Self {
            target,
            http,
            credentials,
        }
    }

    pub fn target(&self) -> &DistributionTarget {
        &self.target
    }

    fn authorization(&self) -> Option<String> {
        let creds = self.credentials.as_ref()?;
        let user = creds.username.as_deref()?;
        let password = creds.password.as_deref().unwrap_or_default();
        let token = base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}"));
        Some(format!("Basic {token}"))
    }

    /// Publish every installed file of `coords`. Returns the deployed locations.
    pub fn deploy(&self, repository: &LocalRepository, coords: &Coordinates) -> Result<Vec<Url>> {
        let fail = |reason: String| Error::Deploy {
            artifact: coords.to_string(),
            reason,
        };

        if !repository.contains(coords) {
            return Err(fail(format!(
                "not present in local repository {}; run install first",
                repository.root().display()
            )));
        }

        let files = repository.installed_files(coords)?;
        let authorization = self.authorization();
        let mut deployed = Vec::with_capacity(files.len());

        for rel in files {
            let src = repository.root().join(&rel);
            let url = self.target.resolve(&rel)?;
            match url.scheme() {
                "file" => {
                    let dest: PathBuf = url
                        .to_file_path()
                        .map_err(|_| fail(format!("not a local path: {url}")))?;
                    fs_utils::copy_file(&src, &dest)
                        .map_err(|e| fail(format!("copy to {} failed: {}", dest.display(), e)))?;
                }
                _ => self
                    .http
                    .put_file(&url, &src, authorization.as_deref(), DEPLOY_TIMEOUT)
                    .map_err(|reason| fail(format!("upload to {url} failed: {reason}")))?,
            }
            output::detail(&format!("deployed {url}"));
            deployed.push(url);
        }

        Ok(deployed)
    }
}
