//! Project configuration (`extdep.toml`)
//!
//! The file holds run-wide settings as top-level keys and one `[[artifacts]]`
//! table per external dependency:
//!
//! ```toml
//! stagingDirectory = "target/external"
//! centralLookup = true
//!
//! [[artifacts]]
//! groupId = "org.example"
//! artifactId = "native-lib"
//! version = "2.4.1"
//! classifier = "linux-x86_64"
//! packaging = "so"
//! downloadUrl = "https://example.org/releases/{version}/bundle-{_version}.tar.gz"
//! checksum = "3f786850e387550fdab836ed7e6dc881de23001b"
//! extractFile = "bundle/lib/libnative.so"
//! ```

use crate::coordinates::{Coordinates, DEFAULT_PACKAGING};
use crate::error::{Error, Result};
use crate::helpers::acquire::verify;
use crate::tokens;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "extdep.toml";
pub const DEFAULT_LOCAL_FILE: &str = "{artifactId}-{version}-{classifier}.{packaging}";
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// How the run-wide and per-artifact central lookup flags combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LookupPolicy {
    /// Enabled when either the run-wide or the artifact flag is true
    #[default]
    Either,
    /// An artifact flag, when present, replaces the run-wide flag
    Override,
}

impl LookupPolicy {
    pub fn enabled(self, run_wide: bool, artifact: Option<bool>) -> bool {
        match self {
            Self::Either => run_wide || artifact.unwrap_or(false),
            Self::Override => artifact.unwrap_or(run_wide),
        }
    }
}

/// Remote repository that `deploy` publishes to
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DistributionToml {
    /// Server id used to look up credentials in the settings file
    pub id: Option<String>,
    pub url: String,
}

/// Raw contents of `extdep.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    pub staging_directory: Option<PathBuf>,
    pub local_repository: Option<PathBuf>,
    pub force: Option<bool>,
    pub create_checksum: Option<bool>,
    pub central_lookup: Option<bool>,
    pub central_lookup_policy: Option<LookupPolicy>,
    pub central_lookup_url: Option<String>,
    pub central_lookup_rows: Option<u32>,
    pub central_lookup_timeout: Option<i64>,
    pub distribution: Option<DistributionToml>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactItem>,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&text)
            .map_err(|e| Error::config(format!("invalid config {}: {}", path.display(), e)))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Validate every `[[artifacts]]` entry, keeping declaration order.
    pub fn descriptors(&self) -> Result<Vec<PackageDescriptor>> {
        if self.artifacts.is_empty() {
            return Err(Error::config("no [[artifacts]] declared"));
        }
        self.artifacts
            .iter()
            .enumerate()
            .map(|(i, item)| {
                PackageDescriptor::from_item(item.clone()).map_err(|e| match e {
                    Error::Configuration(msg) => {
                        Error::config(format!("artifact #{}: {}", i + 1, msg))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

/// One `[[artifacts]]` table as written by the user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ArtifactItem {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub classifier: Option<String>,
    #[serde(alias = "type")]
    pub packaging: Option<String>,
    pub local_file: Option<String>,
    pub staging_directory: Option<String>,
    pub download_url: Option<String>,
    pub timeout: Option<i64>,
    pub checksum: Option<String>,
    pub extract_file: Option<String>,
    pub extract_file_checksum: Option<String>,
    #[serde(default)]
    pub repack: bool,
    pub install: Option<bool>,
    pub deploy: Option<bool>,
    #[serde(default)]
    pub force: bool,
    pub generate_pom: Option<bool>,
    pub pom_file: Option<PathBuf>,
    pub create_checksum: Option<bool>,
    pub central_lookup: Option<bool>,
}

/// A validated external dependency.
///
/// Template fields are stored as written and expanded on access, so the
/// expansion always sees the descriptor's own coordinates.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    pub coordinates: Coordinates,
    pub local_file: String,
    pub staging_directory: Option<String>,
    pub download_url: Option<String>,
    pub timeout: Duration,
    pub checksum: Option<String>,
    pub extract_file: Option<String>,
    pub extract_file_checksum: Option<String>,
    pub repack: bool,
    pub install: bool,
    pub deploy: bool,
    pub force: bool,
    pub generate_pom: bool,
    pub pom_file: Option<PathBuf>,
    pub create_checksum: Option<bool>,
    pub central_lookup: Option<bool>,
    /// Canonical staged path, written once acquisition completes
    pub resolved_file: Option<PathBuf>,
}

impl PackageDescriptor {
    /// Descriptor with default directives for the given coordinates.
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            local_file: DEFAULT_LOCAL_FILE.to_string(),
            staging_directory: None,
            download_url: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            checksum: None,
            extract_file: None,
            extract_file_checksum: None,
            repack: false,
            install: true,
            deploy: true,
            force: false,
            generate_pom: true,
            pom_file: None,
            create_checksum: None,
            central_lookup: None,
            resolved_file: None,
        }
    }

    pub fn from_item(item: ArtifactItem) -> Result<Self> {
        let group_id = non_empty(item.group_id)
            .ok_or_else(|| Error::config("missing required field groupId"))?;
        let artifact_id = non_empty(item.artifact_id)
            .ok_or_else(|| Error::config(format!("missing required field artifactId ({group_id})")))?;

        let coordinates = Coordinates {
            group_id,
            artifact_id,
            version: non_empty(item.version),
            classifier: non_empty(item.classifier),
            packaging: non_empty(item.packaging).unwrap_or_else(|| DEFAULT_PACKAGING.to_string()),
        };

        let mut descriptor = Self::new(coordinates);
        if let Some(local_file) = non_empty(item.local_file) {
            descriptor.local_file = local_file;
        }
        descriptor.staging_directory = non_empty(item.staging_directory);
        descriptor.download_url = non_empty(item.download_url);
        descriptor.timeout = timeout_from_millis(item.timeout);
        descriptor.checksum = non_empty(item.checksum);
        descriptor.extract_file = non_empty(item.extract_file);
        descriptor.extract_file_checksum = non_empty(item.extract_file_checksum);
        descriptor.repack = item.repack;
        descriptor.install = item.install.unwrap_or(true);
        descriptor.deploy = item.deploy.unwrap_or(true);
        descriptor.force = item.force;
        descriptor.generate_pom = item.generate_pom.unwrap_or(true);
        descriptor.pom_file = item.pom_file;
        descriptor.create_checksum = item.create_checksum;
        descriptor.central_lookup = item.central_lookup;
        descriptor.validate_checksums()?;
        Ok(descriptor)
    }

    /// Reject checksum values naming an unknown algorithm.
    pub fn validate_checksums(&self) -> Result<()> {
        for (field, value) in [
            ("checksum", &self.checksum),
            ("extractFileChecksum", &self.extract_file_checksum),
        ] {
            if let Some(value) = value {
                verify::parse_expected(value).map_err(|e| match e {
                    Error::Configuration(msg) => Error::config(format!("{field}: {msg}")),
                    other => other,
                })?;
            }
        }
        Ok(())
    }

    pub fn local_file(&self) -> String {
        tokens::resolve(&self.local_file, &self.coordinates)
    }

    pub fn staging_directory(&self) -> Option<String> {
        tokens::resolve_opt(self.staging_directory.as_deref(), &self.coordinates)
    }

    pub fn download_url(&self) -> Option<String> {
        tokens::resolve_opt(self.download_url.as_deref(), &self.coordinates)
    }

    pub fn extract_file(&self) -> Option<String> {
        tokens::resolve_opt(self.extract_file.as_deref(), &self.coordinates)
    }

    /// Staging path: the artifact's own staging directory, else the run-wide one.
    pub fn staging_path(&self, default_staging: &Path) -> PathBuf {
        let dir = self
            .staging_directory()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_staging.to_path_buf());
        dir.join(self.local_file())
    }
}

impl std::fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.coordinates.fmt(f)
    }
}

/// Timeouts that are unset or not positive fall back to 5 seconds.
pub fn timeout_from_millis(ms: Option<i64>) -> Duration {
    match ms {
        Some(ms) if ms > 0 => Duration::from_millis(ms as u64),
        _ => Duration::from_millis(DEFAULT_TIMEOUT_MS),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
