//! Central repository lookup by digest
//!
//! Asks the search service which coordinates are already published for the
//! SHA-1 of a staged file. Any record under different coordinates is a
//! conflict. The service is advisory: when it cannot be reached or answers
//! with something unusable, the check is skipped.

use crate::coordinates::Coordinates;
use crate::error::{Error, Result};
use crate::helpers::internal::hash::{self, DigestAlgorithm};
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::transport::HttpTransport;

pub const DEFAULT_ENDPOINT: &str = "https://search.maven.org/solrsearch/select";
pub const DEFAULT_ROWS: u32 = 20;
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// One `doc` element: its named string fields in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupRecord {
    pub fields: Vec<(String, String)>,
}

impl LookupRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether every coordinate field present in the record agrees with `coords`.
    pub fn matches(&self, coords: &Coordinates) -> bool {
        let same = |field: &str, expected: &str| {
            self.field(field)
                .is_none_or(|v| v.eq_ignore_ascii_case(expected))
        };
        same("g", &coords.group_id)
            && same("a", &coords.artifact_id)
            && coords.version.as_deref().is_none_or(|v| same("v", v))
    }

    fn describe(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LookupResponse {
    pub num_found: usize,
    pub records: Vec<LookupRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Every returned record agrees with the descriptor
    Verified { hits: usize },
    /// Service unusable; carries the reason for the single warning
    Unavailable(String),
}

pub struct LookupClient {
    http: HttpTransport,
    endpoint: Url,
    rows: u32,
    timeout: Duration,
}

impl LookupClient {
    pub fn new(http: HttpTransport, endpoint: &str, rows: u32, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::config(format!("invalid central lookup URL {endpoint}: {e}"))
        })?;
        Ok(Self {
            http,
            endpoint,
            rows,
            timeout,
        })
    }

    pub fn query_url(&self, sha1: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", &format!("1:\"{sha1}\""))
            .append_pair("rows", &self.rows.to_string())
            .append_pair("wt", "xml");
        url
    }

    /// Run the digest query. Every failure is [`Error::LookupUnavailable`].
    pub fn query(&self, sha1: &str) -> Result<LookupResponse> {
        let url = self.query_url(sha1);
        crate::core::output::debug(&format!("central lookup: {url}"));
        let body = self
            .http
            .get_string(&url, self.timeout)
            .map_err(Error::LookupUnavailable)?;
        parse_response(&body).map_err(Error::LookupUnavailable)
    }

    /// Cross-check the SHA-1 of `file` against `coords`.
    ///
    /// Returns [`Error::CoordinateConflict`] listing every record when any
    /// record disagrees.
    pub fn cross_check(&self, file: &Path, coords: &Coordinates) -> Result<LookupOutcome> {
        let sha1 = hash::file_digest(file, DigestAlgorithm::Sha1)?;
        let response = match self.query(&sha1) {
            Ok(response) => response,
            Err(Error::LookupUnavailable(reason)) => return Ok(LookupOutcome::Unavailable(reason)),
            Err(e) => return Err(e),
        };
        check_records(&response, coords, &sha1, file)?;
        Ok(LookupOutcome::Verified {
            hits: response.num_found,
        })
    }
}

/// Fail with a conflict when any record disagrees with `coords`.
pub fn check_records(
    response: &LookupResponse,
    coords: &Coordinates,
    sha1: &str,
    file: &Path,
) -> Result<()> {
    if response.records.iter().all(|r| r.matches(coords)) {
        return Ok(());
    }

    let mut msg = format!(
        "artifact {} is published under different coordinates\n  file  : {}\n  sha1  : {}\n  declared:\n{}\n  found {} record(s):",
        coords,
        file.display(),
        sha1,
        coords.describe(),
        response.num_found
    );
    for record in &response.records {
        msg.push_str(&format!("\n    {}", record.describe()));
    }
    Err(Error::CoordinateConflict(msg))
}

/// Parse the XML search response.
pub fn parse_response(xml: &str) -> std::result::Result<LookupResponse, String> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| format!("unparsable lookup response: {e}"))?;

    let records: Vec<LookupRecord> = doc
        .descendants()
        .filter(|n| n.has_tag_name("doc"))
        .map(|d| LookupRecord {
            fields: d
                .children()
                .filter(|c| c.has_tag_name("str"))
                .filter_map(|c| {
                    let name = c.attribute("name")?;
                    Some((name.to_string(), c.text().unwrap_or_default().trim().to_string()))
                })
                .collect(),
        })
        .collect();

    let num_found = doc
        .descendants()
        .find(|n| n.has_tag_name("result") && n.attribute("name") == Some("response"))
        .and_then(|n| n.attribute("numFound"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(records.len());

    Ok(LookupResponse { num_found, records })
}
