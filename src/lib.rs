//! External dependency installer for Maven-layout repositories
//!
//! Artifacts that are not published to any repository (vendor tarballs,
//! native libraries, documentation bundles) are declared in `extdep.toml`.
//! Each run fetches them, verifies checksums, optionally extracts one member
//! of a downloaded archive, cross-checks the digest against the central
//! search service and installs the result into a local repository.
//!
//! # Example
//!
//! ```toml
//! [[artifacts]]
//! groupId = "com.vendor"
//! artifactId = "sdk"
//! version = "4.2"
//! packaging = "zip"
//! downloadUrl = "https://vendor.example/sdk/{version}/sdk-{_version}.tar.gz"
//! checksum = "sha1:1f2d3c..."
//! extractFile = "sdk-{version}/docs"
//! repack = true
//! ```
//!
//! # Pipeline
//!
//! For every `[[artifacts]]` entry, in order:
//! - resolve `{groupId}`, `{artifactId}`, `{version}`, `{_version}`,
//!   `{classifier}`, `{packaging}`/`{type}` tokens in templated fields
//! - reuse the staged file, or fetch through the run's download cache
//! - verify the checksum (SHA-1, then MD5, unless the value names its algorithm)
//! - extract `extractFile` and verify `extractFileChecksum`
//! - cross-check the staged file's SHA-1 with the central lookup (advisory)
//! - install into the local repository with a POM and checksum sidecars
//!
//! `deploy` then publishes installed artifacts to the `[distribution]` target.

pub mod config;
pub mod coordinates;
pub mod core;
pub mod engine;
pub mod error;
pub mod helpers;
pub mod settings;
pub mod tokens;

pub use config::{PackageDescriptor, ProjectConfig};
pub use coordinates::Coordinates;
pub use engine::{Goal, Orchestrator, Overrides, RunContext, RunReport};
pub use error::{Error, ErrorKind, Result};
pub use settings::Settings;
