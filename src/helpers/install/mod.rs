//! Install helpers: writing staged artifacts into repositories
//!
//! - **repository**: Maven-layout local repository installer
//! - **pom**: minimal POM generation
//! - **deploy**: publishing installed artifacts to a distribution target

pub mod deploy;
pub mod pom;
pub mod repository;

pub use deploy::{Deployer, DistributionTarget};
pub use repository::{InstallRequest, InstalledFiles, LocalRepository};
