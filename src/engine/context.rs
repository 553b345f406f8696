//! Run-wide context
//!
//! Built once from the project file, the settings and the command line,
//! then shared read-only by every stage of the run.

use crate::config::{LookupPolicy, PackageDescriptor, ProjectConfig, timeout_from_millis};
use crate::error::Result;
use crate::helpers::acquire::central;
use crate::helpers::install::DistributionTarget;
use crate::settings::{self, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_STAGING_DIRECTORY: &str = "target/external";

/// Command-line overrides of project settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub force: bool,
    pub local_repository: Option<PathBuf>,
    pub staging_directory: Option<PathBuf>,
    pub central_lookup: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Directory relative paths are resolved against (the project file's)
    pub base_dir: PathBuf,
    pub staging_directory: PathBuf,
    pub local_repository: PathBuf,
    pub force: bool,
    pub create_checksum: bool,
    pub central_lookup: bool,
    pub lookup_policy: LookupPolicy,
    pub lookup_url: String,
    pub lookup_rows: u32,
    pub lookup_timeout: Duration,
    pub distribution: Option<DistributionTarget>,
    pub settings: Settings,
}

impl RunContext {
    pub fn new(
        config: &ProjectConfig,
        settings: Settings,
        overrides: &Overrides,
        base_dir: &Path,
    ) -> Result<Self> {
        let staging_directory = overrides
            .staging_directory
            .clone()
            .or_else(|| config.staging_directory.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIRECTORY));
        let local_repository = overrides
            .local_repository
            .clone()
            .or_else(|| config.local_repository.clone())
            .or_else(|| settings.local_repository.clone())
            .unwrap_or_else(settings::default_local_repository);
        let lookup_timeout = match config.central_lookup_timeout {
            Some(ms) if ms > 0 => timeout_from_millis(Some(ms)),
            _ => Duration::from_millis(central::DEFAULT_TIMEOUT_MS),
        };
        let distribution = config
            .distribution
            .as_ref()
            .map(DistributionTarget::from_config)
            .transpose()?;

        let ctx = Self {
            base_dir: base_dir.to_path_buf(),
            staging_directory,
            local_repository,
            force: overrides.force || config.force.unwrap_or(false),
            create_checksum: config.create_checksum.unwrap_or(true),
            central_lookup: overrides
                .central_lookup
                .or(config.central_lookup)
                .unwrap_or(false),
            lookup_policy: config.central_lookup_policy.unwrap_or_default(),
            lookup_url: config
                .central_lookup_url
                .clone()
                .unwrap_or_else(|| central::DEFAULT_ENDPOINT.to_string()),
            lookup_rows: config.central_lookup_rows.unwrap_or(central::DEFAULT_ROWS),
            lookup_timeout,
            distribution,
            settings,
        };
        Ok(ctx)
    }

    /// Context with defaults for everything except the two directories.
    pub fn with_dirs(staging_directory: &Path, local_repository: &Path) -> Self {
        Self {
            base_dir: PathBuf::from("."),
            staging_directory: staging_directory.to_path_buf(),
            local_repository: local_repository.to_path_buf(),
            force: false,
            create_checksum: true,
            central_lookup: false,
            lookup_policy: LookupPolicy::default(),
            lookup_url: central::DEFAULT_ENDPOINT.to_string(),
            lookup_rows: central::DEFAULT_ROWS,
            lookup_timeout: Duration::from_millis(central::DEFAULT_TIMEOUT_MS),
            distribution: None,
            settings: Settings::default(),
        }
    }

    /// Resolve a possibly relative path against the base directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn staging_path(&self, descriptor: &PackageDescriptor) -> PathBuf {
        self.resolve_path(&descriptor.staging_path(&self.staging_directory))
    }

    pub fn local_repository_path(&self) -> PathBuf {
        self.resolve_path(&self.local_repository)
    }

    pub fn is_forced(&self, descriptor: &PackageDescriptor) -> bool {
        self.force || descriptor.force
    }

    pub fn lookup_enabled(&self, descriptor: &PackageDescriptor) -> bool {
        self.lookup_policy
            .enabled(self.central_lookup, descriptor.central_lookup)
    }

    pub fn create_checksum_for(&self, descriptor: &PackageDescriptor) -> bool {
        descriptor.create_checksum.unwrap_or(self.create_checksum)
    }
}
