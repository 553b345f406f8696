//! File digest helpers
//!
//! Provides streaming digests for SHA-1, MD5, SHA-256, SHA-512 and BLAKE3.

use crate::error::{Error, Result};
use std::io::Read;
use std::path::Path;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Threshold for showing progress (100MB)
const PROGRESS_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Md5,
    Sha256,
    Sha512,
    Blake3,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
            Self::Blake3 => "BLAKE3",
        }
    }

    /// Sidecar extension used in Maven repositories (`.sha1`, `.md5`, ...)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Parse an algorithm label such as `sha1`, `SHA-256` or `md5`.
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Some(Self::Sha1),
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "sha512" => Some(Self::Sha512),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// Compute the lowercase hex digest of a file.
///
/// Shows progress for files larger than 100MB.
pub fn file_digest(file: &Path, algorithm: DigestAlgorithm) -> Result<String> {
    let mut f = std::fs::File::open(file).map_err(|e| Error::io(file, e))?;

    let file_size = f.metadata().map(|m| m.len()).unwrap_or(0);
    let show_progress = file_size > PROGRESS_THRESHOLD;

    let digest = match algorithm {
        DigestAlgorithm::Sha1 => hash_with_progress::<sha1::Sha1>(&mut f, file_size, show_progress),
        DigestAlgorithm::Md5 => hash_with_progress::<md5::Md5>(&mut f, file_size, show_progress),
        DigestAlgorithm::Sha256 => {
            hash_with_progress::<sha2::Sha256>(&mut f, file_size, show_progress)
        }
        DigestAlgorithm::Sha512 => {
            hash_with_progress::<sha2::Sha512>(&mut f, file_size, show_progress)
        }
        DigestAlgorithm::Blake3 => hash_blake3(&mut f),
    };

    digest.map_err(|e| Error::io(file, e))
}

/// Compute hash using any RustCrypto digest (SHA-1, MD5, SHA-2)
fn hash_with_progress<D: sha2::Digest>(
    reader: &mut impl Read,
    file_size: u64,
    show_progress: bool,
) -> std::io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total_read = 0u64;
    let mut last_percent = 0u8;

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }

        hasher.update(&buffer[..n]);
        total_read += n as u64;

        if show_progress && file_size > 0 {
            let percent = ((total_read * 100) / file_size) as u8;
            if percent >= last_percent + 10 {
                print!("\r     checksum: {}%...", percent);
                std::io::Write::flush(&mut std::io::stdout()).ok();
                last_percent = percent;
            }
        }
    }

    if show_progress {
        println!();
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute BLAKE3 hash (separate implementation due to different API)
fn hash_blake3(reader: &mut impl Read) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Container for computed file hashes
#[derive(Debug, Clone)]
pub struct FileHashes {
    pub sha1: String,
    pub md5: String,
    pub sha256: String,
    pub sha512: String,
    pub blake3: String,
}

/// Compute all hashes for a file in one read (for `extdep checksum`).
pub fn compute_all_hashes(file: &Path) -> Result<FileHashes> {
    use sha2::Digest;

    let mut f = std::fs::File::open(file).map_err(|e| Error::io(file, e))?;
    let mut sha1_hasher = sha1::Sha1::new();
    let mut md5_hasher = md5::Md5::new();
    let mut sha256_hasher = sha2::Sha256::new();
    let mut sha512_hasher = sha2::Sha512::new();
    let mut blake3_hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = f.read(&mut buffer).map_err(|e| Error::io(file, e))?;
        if n == 0 {
            break;
        }
        sha1_hasher.update(&buffer[..n]);
        md5_hasher.update(&buffer[..n]);
        sha256_hasher.update(&buffer[..n]);
        sha512_hasher.update(&buffer[..n]);
        blake3_hasher.update(&buffer[..n]);
    }

    Ok(FileHashes {
        sha1: hex::encode(sha1_hasher.finalize()),
        md5: hex::encode(md5_hasher.finalize()),
        sha256: hex::encode(sha256_hasher.finalize()),
        sha512: hex::encode(sha512_hasher.finalize()),
        blake3: blake3_hasher.finalize().to_hex().to_string(),
    })
}
