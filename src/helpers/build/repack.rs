//! Re-archiving an extracted directory.
//!
//! The archiver is chosen from the destination's extension. Entries are
//! stored relative to the directory, in sorted order, so repeated repacks of
//! the same tree produce the same entry list.

use crate::error::{Error, Result};
use crate::helpers::internal::fs_utils;
use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;
use walkdir::WalkDir;

use super::extract::ArchiveFormat;

/// Archive `src_dir` into `dest`, atomically.
pub fn repack_dir(src_dir: &Path, dest: &Path) -> Result<()> {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let format = ArchiveFormat::from_name(&name).ok_or_else(|| {
        Error::Extraction(format!("no archiver available for repack target {}", dest.display()))
    })?;

    fs_utils::write_atomically(dest, |file| write_archive(format, src_dir, file))?;
    Ok(())
}

fn write_archive(format: ArchiveFormat, src_dir: &Path, file: &mut File) -> io::Result<()> {
    match format {
        ArchiveFormat::Zip => write_zip(src_dir, file),
        ArchiveFormat::Tar => write_tar(src_dir, file).map(drop),
        ArchiveFormat::TarGz => {
            let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
            write_tar(src_dir, encoder)?.finish().map(drop)
        }
        ArchiveFormat::TarXz => {
            let encoder = xz2::write::XzEncoder::new(file, 6);
            write_tar(src_dir, encoder)?.finish().map(drop)
        }
        ArchiveFormat::TarBz2 => {
            let encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
            write_tar(src_dir, encoder)?.finish().map(drop)
        }
        ArchiveFormat::TarZst => {
            let encoder = zstd::stream::write::Encoder::new(file, 0)?;
            write_tar(src_dir, encoder)?.finish().map(drop)
        }
    }
}

/// Walk `src_dir`, yielding (absolute path, `/` separated relative name, is_dir).
fn entries(src_dir: &Path) -> io::Result<Vec<(std::path::PathBuf, String, bool)>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(src_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(io::Error::other)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        out.push((entry.path().to_path_buf(), rel, entry.file_type().is_dir()));
    }
    Ok(out)
}

fn write_tar<W: Write>(src_dir: &Path, writer: W) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    for (path, rel, _) in entries(src_dir)? {
        builder.append_path_with_name(&path, &rel)?;
    }
    builder.into_inner()
}

fn write_zip<W: Write + Seek>(src_dir: &Path, writer: W) -> io::Result<()> {
    let mut zip = zip::ZipWriter::new(writer);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for (path, rel, is_dir) in entries(src_dir)? {
        if is_dir {
            zip.add_directory(format!("{rel}/"), options)
                .map_err(io::Error::other)?;
        } else {
            zip.start_file(rel, options).map_err(io::Error::other)?;
            let mut input = File::open(&path)?;
            io::copy(&mut input, &mut zip)?;
        }
    }
    zip.finish().map_err(io::Error::other)?;
    Ok(())
}
