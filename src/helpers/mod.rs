//! Stage helpers used by the run pipeline
//!
//! Each helper takes explicit inputs and returns explicit outputs; the only
//! state they hold is what the caller hands them (a fetcher's cache, a
//! repository root).
//!
//! ## Categories
//!
//! - **acquire**: transports, download cache, checksum verification, central lookup
//! - **build**: archive member extraction and repacking
//! - **install**: local repository installer, POM generation, deployer
//! - **internal**: hashing, atomic file writes, progress bars, URL utilities

pub mod acquire;
pub mod build;
pub mod install;
pub mod internal;
