//! Member extraction from downloaded archives
//!
//! The whole archive is unpacked into an isolated work directory, then the
//! requested member is located by path and copied (or repacked) to its
//! destination. Tar unpacking rejects absolute paths, `..` components,
//! writes through symlinks and links pointing outside the work directory.
//!
//! Format detection uses the file name first, then magic bytes. A bare
//! compressed stream (`.gz`, `.xz`, `.bz2`, `.zst`) is decompressed straight
//! to `<work>/<member>`.

use crate::core::output;
use crate::error::{Error, Result};
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::{self, ProgressGuard};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use super::repack;

/// Archive container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarXz,
    TarBz2,
    TarZst,
}

/// Single compressed streams with no container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    Gz,
    Xz,
    Bz2,
    Zst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    Archive(ArchiveFormat),
    Stream(StreamFormat),
}

impl ArchiveFormat {
    /// Container format implied by a file name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
            Some(Self::TarXz)
        } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
            Some(Self::TarBz2)
        } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
            Some(Self::TarZst)
        } else if [".zip", ".jar", ".war", ".ear"]
            .iter()
            .any(|ext| name.ends_with(ext))
        {
            Some(Self::Zip)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }
}

impl StreamFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        if name.ends_with(".gz") {
            Some(Self::Gz)
        } else if name.ends_with(".xz") {
            Some(Self::Xz)
        } else if name.ends_with(".bz2") {
            Some(Self::Bz2)
        } else if name.ends_with(".zst") {
            Some(Self::Zst)
        } else {
            None
        }
    }

    fn as_tar(self) -> ArchiveFormat {
        match self {
            Self::Gz => ArchiveFormat::TarGz,
            Self::Xz => ArchiveFormat::TarXz,
            Self::Bz2 => ArchiveFormat::TarBz2,
            Self::Zst => ArchiveFormat::TarZst,
        }
    }

    fn decoder<'a, R: Read + 'a>(self, reader: R) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::Gz => Box::new(flate2::read::GzDecoder::new(reader)),
            Self::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Self::Bz2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Self::Zst => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

/// Work out what `path` holds, by name and then by content.
pub fn detect(path: &Path) -> Result<Option<Detected>> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    if let Some(format) = ArchiveFormat::from_name(&name) {
        return Ok(Some(Detected::Archive(format)));
    }
    let sniffed = sniff(path)?;
    if sniffed.is_some() {
        return Ok(sniffed);
    }
    Ok(StreamFormat::from_name(&name).map(Detected::Stream))
}

/// Detect a format from magic bytes.
///
/// A compressed stream whose payload carries a tar header is a compressed tar.
pub fn sniff(path: &Path) -> Result<Option<Detected>> {
    let mut head = [0u8; 512];
    let n = read_prefix(File::open(path).map_err(|e| Error::io(path, e))?, &mut head)
        .map_err(|e| Error::io(path, e))?;
    let head = &head[..n];

    if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
        return Ok(Some(Detected::Archive(ArchiveFormat::Zip)));
    }
    if is_tar_header(head) {
        return Ok(Some(Detected::Archive(ArchiveFormat::Tar)));
    }

    let stream = if head.starts_with(&[0x1f, 0x8b]) {
        StreamFormat::Gz
    } else if head.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
        StreamFormat::Xz
    } else if head.starts_with(b"BZh") {
        StreamFormat::Bz2
    } else if head.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
        StreamFormat::Zst
    } else {
        return Ok(None);
    };

    // Peek inside the stream for a tar header; an undecodable payload is
    // left for the unpack step to report.
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut payload = [0u8; 512];
    let is_tar = stream
        .decoder(BufReader::new(file))
        .and_then(|decoder| read_prefix(decoder, &mut payload))
        .is_ok_and(|n| is_tar_header(&payload[..n]));

    Ok(Some(if is_tar {
        Detected::Archive(stream.as_tar())
    } else {
        Detected::Stream(stream)
    }))
}

fn read_prefix(mut reader: impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

fn is_tar_header(block: &[u8]) -> bool {
    block.len() >= 262 && &block[257..262] == b"ustar"
}

/// One extraction job.
pub struct ExtractRequest<'a> {
    pub archive: &'a Path,
    /// Member path inside the archive, `/` separated
    pub member: &'a str,
    pub dest: &'a Path,
    pub repack: bool,
    /// Descriptor context (download URL, coordinates) for diagnostics
    pub context: &'a str,
}

impl ExtractRequest<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::Extraction(format!(
            "{}\n  member  : {}\n  archive : {}\n{}",
            reason,
            self.member,
            self.archive.display(),
            self.context
        ))
    }
}

/// Extract `request.member` to `request.dest`, unpacking under `work_dir`.
///
/// Nothing is written at the destination unless the whole step succeeds.
pub fn extract_member(request: &ExtractRequest<'_>, work_dir: &Path) -> Result<()> {
    let member_rel = Path::new(request.member.trim_start_matches('/'));
    if member_rel.as_os_str().is_empty() || !fs_utils::is_safe_path(member_rel) {
        return Err(request.error("invalid member path"));
    }

    let detected = detect(request.archive)?
        .ok_or_else(|| request.error("file is not a recognised archive or compressed stream"))?;

    let filename = request
        .archive
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "archive".to_string());
    let pb = progress::create_spinner(&format!("extracting {}", filename));
    let guard = ProgressGuard::new(&pb);

    match detected {
        Detected::Archive(format) => unpack(request.archive, format, work_dir)
            .map_err(|reason| request.error(&format!("unreadable archive: {reason}")))?,
        Detected::Stream(stream) => {
            decompress_stream(request.archive, stream, &work_dir.join(member_rel))
                .map_err(|reason| request.error(&format!("unreadable stream: {reason}")))?
        }
    }
    drop(guard);

    let located = work_dir.join(member_rel);
    let metadata = match std::fs::metadata(&located) {
        Ok(md) => md,
        Err(_) => return Err(request.error("member not found in archive")),
    };

    if metadata.is_file() {
        fs_utils::copy_file(&located, request.dest)?;
        output::detail(&format!(
            "extracted {} to {}",
            request.member,
            request.dest.display()
        ));
        return Ok(());
    }

    if !request.repack {
        return Err(request.error("member is a directory; set repack to archive it"));
    }
    repack::repack_dir(&located, request.dest)
        .map_err(|e| match e {
            Error::Extraction(reason) => request.error(&reason),
            other => other,
        })?;
    output::detail(&format!(
        "repacked {} into {}",
        request.member,
        request.dest.display()
    ));
    Ok(())
}

/// Unpack a whole archive into `dest`.
pub fn unpack(archive: &Path, format: ArchiveFormat, dest: &Path) -> std::result::Result<(), String> {
    std::fs::create_dir_all(dest)
        .map_err(|e| format!("cannot create directory {}: {}", dest.display(), e))?;
    let file = File::open(archive).map_err(|e| format!("cannot open {}: {}", archive.display(), e))?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::Zip => extract_zip(archive, dest),
        ArchiveFormat::Tar => extract_tar(reader, dest),
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(reader), dest),
        ArchiveFormat::TarXz => extract_tar(xz2::read::XzDecoder::new(reader), dest),
        ArchiveFormat::TarBz2 => extract_tar(bzip2::read::BzDecoder::new(reader), dest),
        ArchiveFormat::TarZst => {
            let decoder = zstd::stream::read::Decoder::new(reader)
                .map_err(|e| format!("zstd init error: {}", e))?;
            extract_tar(decoder, dest)
        }
    }
}

fn decompress_stream(
    archive: &Path,
    stream: StreamFormat,
    target: &Path,
) -> std::result::Result<(), String> {
    let file = File::open(archive).map_err(|e| format!("cannot open {}: {}", archive.display(), e))?;
    let mut decoder = stream
        .decoder(BufReader::new(file))
        .map_err(|e| format!("decoder init error: {}", e))?;
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
    }
    let mut out = File::create(target).map_err(|e| format!("cannot create {}: {}", target.display(), e))?;
    std::io::copy(&mut decoder, &mut out).map_err(|e| format!("decompression failed: {}", e))?;
    Ok(())
}

// Lexical normalization, no filesystem access; used to validate link targets
// without following symlinks.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> std::result::Result<(), String> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| format!("tar contains path outside destination: {}", full_path.display()))?;

    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!(
                "tar extraction blocked: symlink in path component: {}",
                cur.display()
            ));
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> std::result::Result<(), String> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(format!(
            "tar contains unsafe link target (absolute): {}",
            link_name.display()
        ));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    let norm_dest = normalize_lexical(dest);
    if candidate.strip_prefix(&norm_dest).is_err() {
        return Err(format!(
            "tar contains unsafe link target (escapes dest): {} -> {}",
            link_parent.display(),
            link_name.display()
        ));
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> std::result::Result<(), String> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive
        .entries()
        .map_err(|e| format!("tar read error: {}", e))?
    {
        let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;
        let path = entry
            .path()
            .map_err(|e| format!("tar path error: {}", e))?
            .into_owned();

        if !fs_utils::is_safe_path(&path) {
            return Err(format!("tar contains unsafe path: {}", path.display()));
        }
        if path.as_os_str().is_empty() || path == Path::new(".") {
            continue;
        }

        let full_path = dest.join(&path);
        ensure_no_symlink_components(dest, &full_path)?;

        let entry_type = entry.header().entry_type();
        if entry_type == tar::EntryType::Symlink || entry_type == tar::EntryType::Link {
            let link_name = entry
                .link_name()
                .map_err(|e| format!("tar link_name error: {}", e))?
                .ok_or_else(|| format!("tar contains link without target: {}", path.display()))?;
            let link_parent = full_path.parent().unwrap_or(dest);
            ensure_link_target_within_dest(dest, link_parent, &link_name)?;
        }

        if let Some(parent) = full_path.parent() {
            if parent.starts_with(dest) {
                ensure_no_symlink_components(dest, parent)?;
            }
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }

        entry
            .unpack(&full_path)
            .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
    }

    Ok(())
}

fn extract_zip(archive_path: &Path, dest: &Path) -> std::result::Result<(), String> {
    let file = File::open(archive_path)
        .map_err(|e| format!("cannot open {}: {}", archive_path.display(), e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("zip read error: {}", e))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| format!("zip entry error: {}", e))?;

        // Entries with unsafe paths are skipped.
        let Some(outpath) = file.enclosed_name().map(|p| dest.join(p)) else {
            continue;
        };

        if file.is_dir() {
            std::fs::create_dir_all(&outpath)
                .map_err(|e| format!("cannot create directory {}: {}", outpath.display(), e))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
        }
        let mut outfile = File::create(&outpath)
            .map_err(|e| format!("cannot create {}: {}", outpath.display(), e))?;
        std::io::copy(&mut file, &mut outfile)
            .map_err(|e| format!("write error for {}: {}", outpath.display(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
            }
        }
    }

    Ok(())
}
