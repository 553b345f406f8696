//! Checksum verification
//!
//! An expected value without a prefix is tried as SHA-1, then as MD5; the
//! first algorithm that matches accepts the file. A prefixed value
//! (`sha256:...`, `md5:...`) is checked with that algorithm only.
//!
//! Comparison ignores case and surrounding whitespace.

use crate::core::output;
use crate::error::{Error, Result};
use std::path::Path;

use super::super::internal::hash::{self, DigestAlgorithm};

/// Algorithms tried for an unprefixed expected value, in order.
pub const FALLBACK_ORDER: &[DigestAlgorithm] = &[DigestAlgorithm::Sha1, DigestAlgorithm::Md5];

/// Result of checking one algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestAttempt {
    pub algorithm: DigestAlgorithm,
    pub computed: String,
    pub matched: bool,
}

/// Per-algorithm attempts and the accepting algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub attempts: Vec<DigestAttempt>,
    pub matched: DigestAlgorithm,
}

/// Split an expected value into the algorithms to try and the bare digest.
pub fn parse_expected(expected: &str) -> Result<(Vec<DigestAlgorithm>, String)> {
    let trimmed = expected.trim();
    match trimmed.split_once(':') {
        Some((label, digest)) => {
            let algorithm = DigestAlgorithm::parse(label.trim()).ok_or_else(|| {
                Error::config(format!("unknown checksum algorithm \"{label}\" in {trimmed}"))
            })?;
            Ok((vec![algorithm], digest.trim().to_ascii_lowercase()))
        }
        None => Ok((FALLBACK_ORDER.to_vec(), trimmed.to_ascii_lowercase())),
    }
}

/// Verify `file` against `expected`.
///
/// `subject` names what is being verified (coordinates, member path) and is
/// included in the mismatch diagnostic.
pub fn verify(file: &Path, expected: &str, subject: &str) -> Result<VerificationOutcome> {
    let (algorithms, digest) = parse_expected(expected)?;
    let mut attempts = Vec::with_capacity(algorithms.len());

    for algorithm in algorithms {
        let computed = hash::file_digest(file, algorithm)?;
        let matched = computed.eq_ignore_ascii_case(&digest);
        attempts.push(DigestAttempt {
            algorithm,
            computed,
            matched,
        });
        if matched {
            output::detail(&format!(
                "{} checksum verified for {}",
                algorithm.name(),
                file.display()
            ));
            return Ok(VerificationOutcome { attempts, matched: algorithm });
        }
        output::debug(&format!(
            "{} checksum did not match for {}",
            algorithm.name(),
            file.display()
        ));
    }

    let mut msg = format!(
        "checksum mismatch for {}\n  file     : {}\n  expected : {}",
        subject,
        file.display(),
        expected.trim()
    );
    for attempt in &attempts {
        msg.push_str(&format!(
            "\n  {:<9}: {}",
            attempt.algorithm.name(),
            attempt.computed
        ));
    }
    Err(Error::ChecksumMismatch(msg))
}
