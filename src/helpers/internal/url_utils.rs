//! URL parsing and naming utilities
//!
//! Helpers for validating download URLs and deriving file names and
//! extensions from them.

use crate::error::{Error, Result};
use url::Url;

/// Schemes a download URL may use
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Parse a download URL and check that a transport exists for its scheme.
pub fn parse_download_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::config(format!("could not interpret URL {}: {}", raw, e)))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(Error::config(format!(
            "unsupported URL scheme \"{}\" in {} (supported: {})",
            url.scheme(),
            raw,
            SUPPORTED_SCHEMES.join(", ")
        )));
    }

    Ok(url)
}

/// Extension of the resource a URL points at.
///
/// Recognises the double extensions `tar.gz`, `tar.bz2`, `tar.xz` and
/// `tar.zst`; returns an empty string when the last segment has none.
pub fn url_extension(url: &Url) -> String {
    let name = extract_filename(url);
    let lower = name.to_lowercase();
    for double in ["tar.gz", "tar.bz2", "tar.xz", "tar.zst"] {
        if lower.ends_with(&format!(".{double}")) {
            return double.to_string();
        }
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_string(),
        _ => String::new(),
    }
}

/// Last path segment of a URL, or "download" when there is none.
pub fn extract_filename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(sanitize_filename)
        .unwrap_or_else(|| "download".to_string())
}

/// Sanitize a filename for safe filesystem use.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() || name == "." || name == ".." {
        return "download".to_string();
    }

    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Match a host against `|`-separated non-proxy patterns (`*.corp.example|localhost`).
pub fn matches_non_proxy_hosts(host: &str, patterns: &str) -> bool {
    let host = host.to_ascii_lowercase();
    patterns
        .split('|')
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
        .any(|pattern| wildcard_match(&pattern, &host))
}

fn wildcard_match(pattern: &str, text: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == text,
        Some((prefix, rest)) => {
            let Some(tail) = text.strip_prefix(prefix) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            (0..=tail.len())
                .filter(|&i| tail.is_char_boundary(i))
                .any(|i| wildcard_match(rest, &tail[i..]))
        }
    }
}
