//! Maven-layout local repository
//!
//! `<root>/org/example/foo/1.0/foo-1.0[-classifier].<packaging>`, with a POM
//! next to it and optional `.md5`/`.sha1` sidecars for both.

use crate::coordinates::Coordinates;
use crate::core::output;
use crate::error::{Error, Result};
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::hash::{self, DigestAlgorithm};
use std::path::{Path, PathBuf};

use super::pom;

/// Sidecar digests written next to installed files
pub const SIDECAR_ALGORITHMS: &[DigestAlgorithm] = &[DigestAlgorithm::Md5, DigestAlgorithm::Sha1];

/// What to install for one coordinate
#[derive(Debug, Clone)]
pub struct InstallRequest<'a> {
    pub coordinates: &'a Coordinates,
    pub file: &'a Path,
    /// Explicit POM, installed instead of a generated one
    pub pom_file: Option<&'a Path>,
    pub generate_pom: bool,
    pub create_checksum: bool,
}

/// Files written by an install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledFiles {
    pub artifact: PathBuf,
    pub pom: Option<PathBuf>,
    pub checksums: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Repository-relative path of the artifact file.
    pub fn relative_artifact_path(coords: &Coordinates) -> Result<PathBuf> {
        let dir = version_required(coords, coords.repository_dir())?;
        let name = version_required(coords, coords.artifact_file_name())?;
        Ok(dir.join(name))
    }

    /// Repository-relative path of the POM.
    pub fn relative_pom_path(coords: &Coordinates) -> Result<PathBuf> {
        let dir = version_required(coords, coords.repository_dir())?;
        let name = version_required(coords, coords.pom_file_name())?;
        Ok(dir.join(name))
    }

    pub fn artifact_path(&self, coords: &Coordinates) -> Result<PathBuf> {
        Ok(self.root.join(Self::relative_artifact_path(coords)?))
    }

    pub fn pom_path(&self, coords: &Coordinates) -> Result<PathBuf> {
        Ok(self.root.join(Self::relative_pom_path(coords)?))
    }

    /// A coordinate is present when its artifact file exists.
    pub fn contains(&self, coords: &Coordinates) -> bool {
        self.artifact_path(coords).is_ok_and(|p| p.is_file())
    }

    /// Every installed file for `coords` that exists on disk, repository-relative.
    pub fn installed_files(&self, coords: &Coordinates) -> Result<Vec<PathBuf>> {
        let mut primaries = vec![Self::relative_artifact_path(coords)?];
        if coords.packaging != "pom" {
            primaries.push(Self::relative_pom_path(coords)?);
        }

        let mut files = Vec::new();
        for rel in primaries {
            if !self.root.join(&rel).is_file() {
                continue;
            }
            let sidecars: Vec<PathBuf> = SIDECAR_ALGORITHMS
                .iter()
                .map(|algorithm| sidecar_path(&rel, *algorithm))
                .filter(|sidecar| self.root.join(sidecar).is_file())
                .collect();
            files.push(rel);
            files.extend(sidecars);
        }
        Ok(files)
    }

    /// Install the artifact, its POM and sidecar checksums.
    pub fn install(&self, request: &InstallRequest<'_>) -> Result<InstalledFiles> {
        let coords = request.coordinates;
        let artifact = self.artifact_path(coords)?;
        let fail = |reason: String| Error::Install {
            artifact: coords.to_string(),
            reason,
        };

        fs_utils::copy_file(request.file, &artifact)
            .map_err(|e| fail(format!("copy to {} failed: {}", artifact.display(), e)))?;
        output::detail(&format!("installed {}", artifact.display()));

        let mut installed = InstalledFiles {
            artifact: artifact.clone(),
            ..Default::default()
        };

        if coords.packaging != "pom" {
            let pom_path = self.pom_path(coords)?;
            let written = match request.pom_file {
                Some(explicit) => {
                    fs_utils::copy_file(explicit, &pom_path).map_err(|e| {
                        fail(format!("POM {} could not be installed: {}", explicit.display(), e))
                    })?;
                    true
                }
                None if request.generate_pom => {
                    let content = pom::minimal_pom(coords)
                        .ok_or_else(|| Error::config(format!("version required to generate a POM for {coords}")))?;
                    fs_utils::write_atomically(&pom_path, |f| {
                        std::io::Write::write_all(f, content.as_bytes())
                    })
                    .map_err(|e| fail(format!("POM generation failed: {e}")))?;
                    true
                }
                None => false,
            };
            if written {
                output::debug(&format!("installed {}", pom_path.display()));
                installed.pom = Some(pom_path);
            }
        }

        if request.create_checksum {
            let mut targets = vec![artifact];
            targets.extend(installed.pom.clone());
            for target in targets {
                let sidecars = write_sidecars(&target)
                    .map_err(|e| fail(format!("checksum creation failed: {e}")))?;
                installed.checksums.extend(sidecars);
            }
        }

        Ok(installed)
    }
}

fn version_required<T>(coords: &Coordinates, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| {
        Error::config(format!(
            "a version is required to install or deploy {}\n{}",
            coords,
            coords.describe()
        ))
    })
}

fn sidecar_path(path: &Path, algorithm: DigestAlgorithm) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(algorithm.extension());
    PathBuf::from(name)
}

/// Write `.md5` and `.sha1` files next to `path`.
pub fn write_sidecars(path: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(SIDECAR_ALGORITHMS.len());
    for algorithm in SIDECAR_ALGORITHMS {
        let digest = hash::file_digest(path, *algorithm)?;
        let sidecar = sidecar_path(path, *algorithm);
        fs_utils::write_atomically(&sidecar, |f| std::io::Write::write_all(f, digest.as_bytes()))?;
        written.push(sidecar);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn staged(dir: &Path) -> PathBuf {
        let file = dir.join("staged.jar");
        std::fs::write(&file, "hello world").unwrap();
        file
    }

    #[test]
    fn test_layout_paths() {
        let repo = LocalRepository::new("/repo");
        let coords = Coordinates::new("org.foo.bar", "baz", Some("1.0")).with_classifier("src");
        assert_eq!(
            repo.artifact_path(&coords).unwrap(),
            PathBuf::from("/repo/org/foo/bar/baz/1.0/baz-1.0-src.jar")
        );
        assert_eq!(
            repo.pom_path(&coords).unwrap(),
            PathBuf::from("/repo/org/foo/bar/baz/1.0/baz-1.0.pom")
        );
    }

    #[test]
    fn test_install_with_generated_pom_and_checksums() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("repo"));
        let coords = Coordinates::new("org.foo", "bar", Some("1.0"));
        let file = staged(dir.path());

        assert!(!repo.contains(&coords));
        let installed = repo
            .install(&InstallRequest {
                coordinates: &coords,
                file: &file,
                pom_file: None,
                generate_pom: true,
                create_checksum: true,
            })
            .unwrap();

        assert!(repo.contains(&coords));
        assert!(installed.pom.as_ref().unwrap().is_file());
        assert_eq!(installed.checksums.len(), 4);
        let sha1 = std::fs::read_to_string(repo.root().join("org/foo/bar/1.0/bar-1.0.jar.sha1")).unwrap();
        assert_eq!(sha1, "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed");

        let files = repo.installed_files(&coords).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("org/foo/bar/1.0/bar-1.0.jar"),
                PathBuf::from("org/foo/bar/1.0/bar-1.0.jar.md5"),
                PathBuf::from("org/foo/bar/1.0/bar-1.0.jar.sha1"),
                PathBuf::from("org/foo/bar/1.0/bar-1.0.pom"),
                PathBuf::from("org/foo/bar/1.0/bar-1.0.pom.md5"),
                PathBuf::from("org/foo/bar/1.0/bar-1.0.pom.sha1"),
            ]
        );
    }

    #[test]
    fn test_install_explicit_pom_without_checksums() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("repo"));
        let coords = Coordinates::new("org.foo", "bar", Some("2.0"));
        let file = staged(dir.path());
        let pom_file = dir.path().join("custom.pom");
        std::fs::write(&pom_file, "<project/>").unwrap();

        let installed = repo
            .install(&InstallRequest {
                coordinates: &coords,
                file: &file,
                pom_file: Some(&pom_file),
                generate_pom: false,
                create_checksum: false,
            })
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(installed.pom.unwrap()).unwrap(),
            "<project/>"
        );
        assert!(installed.checksums.is_empty());
    }

    #[test]
    fn test_pom_packaging_has_no_separate_pom() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("repo"));
        let coords = Coordinates::new("org.foo", "parent", Some("1")).with_packaging("pom");
        let file = staged(dir.path());

        let installed = repo
            .install(&InstallRequest {
                coordinates: &coords,
                file: &file,
                pom_file: None,
                generate_pom: true,
                create_checksum: false,
            })
            .unwrap();
        assert!(installed.pom.is_none());
        assert!(installed.artifact.ends_with("parent-1.pom"));
    }

    #[test]
    fn test_install_requires_version() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("repo"));
        let coords = Coordinates::new("org.foo", "bar", None);
        let file = staged(dir.path());

        let err = repo
            .install(&InstallRequest {
                coordinates: &coords,
                file: &file,
                pom_file: None,
                generate_pom: true,
                create_checksum: true,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(!repo.contains(&coords));
    }

    #[test]
    fn test_missing_staged_file_is_install_error() {
        let dir = TempDir::new().unwrap();
        let repo = LocalRepository::new(dir.path().join("repo"));
        let coords = Coordinates::new("org.foo", "bar", Some("1.0"));

        let err = repo
            .install(&InstallRequest {
                coordinates: &coords,
                file: &dir.path().join("missing.jar"),
                pom_file: None,
                generate_pom: true,
                create_checksum: true,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Install);
        assert!(err.to_string().contains("org.foo:bar:1.0:jar"));
    }
}
