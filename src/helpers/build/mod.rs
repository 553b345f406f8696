//! Extraction helpers: pulling one member out of a downloaded archive
//!
//! - **extract**: format detection, safe unpacking, member lookup
//! - **repack**: re-archiving an extracted directory

pub mod extract;
pub mod repack;

pub use extract::{ArchiveFormat, ExtractRequest, extract_member};
pub use repack::repack_dir;
