//! Repository coordinates (groupId, artifactId, version, classifier, packaging).

use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PACKAGING: &str = "jar";

/// Identity of an artifact in a Maven-layout repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinates {
    pub group_id: String,
    pub artifact_id: String,
    /// `None` means "any version"; such coordinates can be staged but not installed.
    pub version: Option<String>,
    pub classifier: Option<String>,
    pub packaging: String,
}

impl Coordinates {
    pub fn new(group_id: &str, artifact_id: &str, version: Option<&str>) -> Self {
        Self {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.map(str::to_string),
            classifier: None,
            packaging: DEFAULT_PACKAGING.to_string(),
        }
    }

    pub fn with_classifier(mut self, classifier: &str) -> Self {
        self.classifier = Some(classifier.to_string());
        self
    }

    pub fn with_packaging(mut self, packaging: &str) -> Self {
        self.packaging = packaging.to_string();
        self
    }

    /// Snapshot versions are mutable between builds.
    pub fn is_snapshot(&self) -> bool {
        self.version.as_deref().is_some_and(is_snapshot_version)
    }

    /// Directory of this coordinate relative to a repository root:
    /// `org/example/foo/1.0`.
    pub fn repository_dir(&self) -> Option<PathBuf> {
        let version = self.version.as_deref()?;
        let mut dir = PathBuf::new();
        for segment in self.group_id.split('.') {
            dir.push(segment);
        }
        dir.push(&self.artifact_id);
        dir.push(version);
        Some(dir)
    }

    /// Artifact file name in repository layout: `foo-1.0[-classifier].jar`.
    pub fn artifact_file_name(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        Some(match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact_id, version, c, self.packaging),
            None => format!("{}-{}.{}", self.artifact_id, version, self.packaging),
        })
    }

    /// POM file name in repository layout: `foo-1.0.pom`.
    pub fn pom_file_name(&self) -> Option<String> {
        let version = self.version.as_deref()?;
        Some(format!("{}-{}.pom", self.artifact_id, version))
    }

    /// Multi-line block used in diagnostics.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "  groupId    : {}\n  artifactId : {}\n  version    : {}\n",
            self.group_id,
            self.artifact_id,
            self.version.as_deref().unwrap_or("?"),
        );
        if let Some(c) = &self.classifier {
            out.push_str(&format!("  classifier : {}\n", c));
        }
        out.push_str(&format!("  packaging  : {}", self.packaging));
        out
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let version = self.version.as_deref().unwrap_or("?");
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, c, version, self.packaging
            ),
            None => write!(
                f,
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, version, self.packaging
            ),
        }
    }
}

/// `1.0-SNAPSHOT`, or a deployed snapshot such as `1.0-20240102.030405-7`.
pub fn is_snapshot_version(version: &str) -> bool {
    if version.ends_with("SNAPSHOT") {
        return true;
    }
    let mut parts = version.rsplitn(3, '-');
    let (Some(build), Some(timestamp), Some(base)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if base.is_empty() || build.is_empty() || !build.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match timestamp.split_once('.') {
        Some((date, time)) => {
            date.len() == 8
                && time.len() == 6
                && date.bytes().all(|b| b.is_ascii_digit())
                && time.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
