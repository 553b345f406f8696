//! Acquisition helpers: getting artifact bytes and proving they are the right ones.
//!
//! - **transport**: scheme-keyed byte movers (`http`, `https`, `file`)
//! - **download**: run-scoped cache and fetcher
//! - **verify**: checksum verification with algorithm fallback
//! - **central**: digest lookup against the central search service

pub mod central;
pub mod download;
pub mod transport;
pub mod verify;

pub use central::{LookupClient, LookupOutcome};
pub use download::{DownloadCache, Fetcher};
pub use transport::{FileTransport, HttpTransport, Transport, Transports};
pub use verify::{VerificationOutcome, verify};
