//! Common test utilities: a scratch project layout and archive fixtures.

#![allow(dead_code)]

use extdep::{Coordinates, PackageDescriptor, RunContext};
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;

/// Digests of the bytes `hello world`
pub const HELLO: &str = "hello world";
pub const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
pub const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";

/// Scratch project: `stage/` for staged files, `repo/` for the local repository.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn stage(&self) -> PathBuf {
        self.path("stage")
    }

    pub fn repo(&self) -> PathBuf {
        self.path("repo")
    }

    pub fn ctx(&self) -> RunContext {
        RunContext::with_dirs(&self.stage(), &self.repo())
    }

    /// Write a source file and return its `file://` URL.
    pub fn serve_file(&self, rel: &str, content: &[u8]) -> Url {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        Url::from_file_path(&path).unwrap()
    }

    /// Artifact path inside the local repository.
    pub fn installed(&self, rel: &str) -> PathBuf {
        self.repo().join(rel)
    }
}

pub fn descriptor(artifact: &str, version: &str, url: &str) -> PackageDescriptor {
    let mut d = PackageDescriptor::new(Coordinates::new("org.example", artifact, Some(version)));
    d.download_url = Some(url.to_string());
    d
}

/// A gzipped tarball with the given regular files.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A zip archive with the given regular files.
pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

/// Serve `body` once over HTTP, one byte per `pause`, and return its URL.
pub fn trickle_server(body: &'static [u8], pause: Duration) -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 2 {
            line.clear();
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        for byte in body {
            std::thread::sleep(pause);
            if stream.write_all(&[*byte]).and_then(|_| stream.flush()).is_err() {
                return;
            }
        }
    });
    Url::parse(&format!("http://{addr}/slow.jar")).unwrap()
}
