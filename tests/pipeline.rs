//! End-to-end pipeline tests: staging, caching, installing.

mod common;

use common::*;
use extdep::engine::{FetchReason, PipelineState, install, resolve};
use extdep::{ErrorKind, ProjectConfig};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Idempotence and forcing
// =============================================================================

#[tokio::test]
async fn test_second_run_performs_no_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lib-1.0.jar"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HELLO))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let ctx = env.ctx();
    let mut descriptors = vec![descriptor("lib", "1.0", &format!("{}/lib-1.0.jar", server.uri()))];
    descriptors[0].checksum = Some(HELLO_SHA1.to_string());

    let first = install(&ctx, &mut descriptors).unwrap();
    assert_eq!(first.fetch_count, 1);
    assert_eq!(first.installed(), 1);
    assert_eq!(read(&env.installed("org/example/lib/1.0/lib-1.0.jar")), HELLO);
    assert!(env.installed("org/example/lib/1.0/lib-1.0.pom").is_file());
    assert!(env.installed("org/example/lib/1.0/lib-1.0.jar.sha1").is_file());

    let second = install(&ctx, &mut descriptors).unwrap();
    assert_eq!(second.fetch_count, 0);
    assert_eq!(second.outcomes[0].state, PipelineState::Skip);
    assert_eq!(second.skipped(), 1);
}

#[test]
fn test_forced_descriptor_is_refetched_and_reinstalled() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let url = env.serve_file("dl/tool.bin", b"v1");
    let mut descriptors = vec![descriptor("tool", "2.0", url.as_str())];
    descriptors[0].coordinates.packaging = "bin".into();

    install(&ctx, &mut descriptors).unwrap();
    env.serve_file("dl/tool.bin", b"v2");

    let unforced = install(&ctx, &mut descriptors).unwrap();
    assert_eq!(unforced.fetch_count, 0);
    assert_eq!(read(&env.installed("org/example/tool/2.0/tool-2.0.bin")), "v1");

    descriptors[0].force = true;
    let forced = install(&ctx, &mut descriptors).unwrap();
    assert_eq!(forced.fetch_count, 1);
    assert_eq!(forced.outcomes[0].fetch, Some(FetchReason::Forced));
    assert_eq!(forced.outcomes[0].state, PipelineState::Installed);
    assert_eq!(read(&env.installed("org/example/tool/2.0/tool-2.0.bin")), "v2");
}

#[test]
fn test_run_wide_force() {
    let env = TestEnv::new();
    let mut ctx = env.ctx();
    let url = env.serve_file("dl/a.jar", b"a");
    let mut descriptors = vec![descriptor("a", "1", url.as_str())];

    install(&ctx, &mut descriptors).unwrap();
    ctx.force = true;
    let report = install(&ctx, &mut descriptors).unwrap();
    assert_eq!(report.fetch_count, 1);
    assert_eq!(report.installed(), 1);
}

#[test]
fn test_snapshot_is_always_refetched() {
    let env = TestEnv::new();
    let ctx = env.ctx();
    let url = env.serve_file("dl/snap.jar", b"build-1");
    let mut descriptors = vec![descriptor("snap", "1.0-SNAPSHOT", url.as_str())];

    install(&ctx, &mut descriptors).unwrap();
    env.serve_file("dl/snap.jar", b"build-2");
    let report = install(&ctx, &mut descriptors).unwrap();

    assert_eq!(report.outcomes[0].fetch, Some(FetchReason::Snapshot));
    assert_eq!(report.outcomes[0].state, PipelineState::Installed);
    assert_eq!(
        read(&env.installed("org/example/snap/1.0-SNAPSHOT/snap-1.0-SNAPSHOT.jar")),
        "build-2"
    );
}

#[test]
fn test_install_disabled_only_stages() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/a.jar", b"a");
    let mut descriptors = vec![descriptor("a", "1", url.as_str())];
    descriptors[0].install = false;

    let report = install(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(report.outcomes[0].state, PipelineState::Skip);
    assert!(env.stage().join("a-1.jar").is_file());
    assert!(!env.repo().exists());
}

// =============================================================================
// Download cache
// =============================================================================

#[tokio::test]
async fn test_shared_url_is_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bundle.tar.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(tar_gz(&[
            ("bundle/lib/native.so", b"native"),
            ("bundle/docs/README", b"readme"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let url = format!("{}/bundle.tar.gz", server.uri());
    let mut native = descriptor("native", "3.1", &url);
    native.coordinates.packaging = "so".into();
    native.extract_file = Some("bundle/lib/native.so".into());
    let mut docs = descriptor("native-docs", "3.1", &url);
    docs.coordinates.packaging = "txt".into();
    docs.extract_file = Some("bundle/docs/README".into());
    let mut descriptors = vec![native, docs];

    let report = resolve(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(report.fetch_count, 1);
    assert_eq!(read(&env.stage().join("native-3.1.so")), "native");
    assert_eq!(read(&env.stage().join("native-docs-3.1.txt")), "readme");
}

#[test]
fn test_shared_url_stages_same_bytes() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/shared.jar", HELLO.as_bytes());
    let mut first = descriptor("one", "1", url.as_str());
    first.coordinates.classifier = Some("linux".into());
    let mut second = descriptor("one", "1", url.as_str());
    second.coordinates.classifier = Some("darwin".into());
    let mut descriptors = vec![first, second];

    let report = resolve(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(report.fetch_count, 1);
    let a = std::fs::read(env.stage().join("one-1-linux.jar")).unwrap();
    let b = std::fs::read(env.stage().join("one-1-darwin.jar")).unwrap();
    assert_eq!(a, b);
}

// =============================================================================
// Verification and extraction
// =============================================================================

#[test]
fn test_md5_checksum_accepted() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/a.jar", HELLO.as_bytes());
    let mut descriptors = vec![descriptor("a", "1", url.as_str())];
    descriptors[0].checksum = Some(HELLO_MD5.to_uppercase());

    resolve(&env.ctx(), &mut descriptors).unwrap();
    assert!(env.stage().join("a-1.jar").is_file());
}

#[test]
fn test_checksum_mismatch_stages_nothing() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/a.jar", HELLO.as_bytes());
    let mut descriptors = vec![descriptor("a", "1", url.as_str())];
    descriptors[0].checksum = Some("0123456789abcdef".into());

    let err = install(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    let msg = err.to_string();
    assert!(msg.contains("SHA1") && msg.contains(HELLO_SHA1));
    assert!(msg.contains("MD5") && msg.contains(HELLO_MD5));
    assert!(!env.stage().join("a-1.jar").exists());
    assert!(descriptors[0].resolved_file.is_none());
}

#[test]
fn test_missing_member_writes_nothing() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/bundle.tar.gz", &tar_gz(&[("present.txt", b"x")]));
    let mut descriptors = vec![descriptor("bundle", "1", url.as_str())];
    descriptors[0].extract_file = Some("absent/file.txt".into());

    let err = resolve(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Extraction);
    let msg = err.to_string();
    assert!(msg.contains("absent/file.txt"));
    assert!(msg.contains(url.as_str()));
    assert!(msg.contains("org.example"));
    assert!(!env.stage().join("bundle-1.jar").exists());
}

#[test]
fn test_extract_file_checksum_verified() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/bundle.tar.gz", &tar_gz(&[("inner.txt", HELLO.as_bytes())]));
    let mut descriptors = vec![descriptor("inner", "1", url.as_str())];
    descriptors[0].coordinates.packaging = "txt".into();
    descriptors[0].extract_file = Some("inner.txt".into());
    descriptors[0].extract_file_checksum = Some("sha1:ffff".into());

    let err = resolve(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    assert!(!env.stage().join("inner-1.txt").exists());

    descriptors[0].extract_file_checksum = Some(format!("sha1:{HELLO_SHA1}"));
    resolve(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(read(&env.stage().join("inner-1.txt")), HELLO);
}

#[test]
fn test_directory_member_repacked_and_installed() {
    let env = TestEnv::new();
    let url = env.serve_file(
        "dl/sdk.zip",
        &zip(&[("sdk/docs/index.html", b"<html/>"), ("sdk/docs/api/a.html", b"a")]),
    );
    let mut descriptors = vec![descriptor("sdk-docs", "4.2", url.as_str())];
    descriptors[0].coordinates.packaging = "zip".into();
    descriptors[0].extract_file = Some("sdk/docs".into());
    descriptors[0].repack = true;

    install(&env.ctx(), &mut descriptors).unwrap();

    let installed = env.installed("org/example/sdk-docs/4.2/sdk-docs-4.2.zip");
    let archive = zip::ZipArchive::new(std::fs::File::open(installed).unwrap()).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["api/", "api/a.html", "index.html"]);
}

// =============================================================================
// Configuration through the project file
// =============================================================================

#[test]
fn test_templated_descriptor_from_toml() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/1.2.3/tool-1_2_3-linux.tar.gz", &tar_gz(&[("tool-1.2.3/bin/tool", b"#!")]));
    let base = url.as_str().replace("1.2.3/tool-1_2_3-linux.tar.gz", "");

    let toml = format!(
        r#"
[[artifacts]]
groupId = "org.example"
artifactId = "tool"
version = "1.2.3"
classifier = "linux"
packaging = "bin"
downloadUrl = "{base}{{version}}/tool-{{_version}}-{{classifier}}.tar.gz"
extractFile = "tool-{{version}}/bin/tool"
"#
    );
    let config = ProjectConfig::parse(&toml).unwrap();
    let mut descriptors = config.descriptors().unwrap();

    let report = install(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(report.fetch_count, 1);
    assert_eq!(
        read(&env.installed("org/example/tool/1.2.3/tool-1.2.3-linux.bin")),
        "#!"
    );
}

#[test]
fn test_missing_version_cannot_install() {
    let env = TestEnv::new();
    let url = env.serve_file("dl/a.jar", b"a");
    let mut d = descriptor("a", "1", url.as_str());
    d.coordinates.version = None;
    let mut descriptors = vec![d];

    let err = install(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[tokio::test]
async fn test_http_404_is_transport_error() {
    let server = MockServer::start().await;
    let env = TestEnv::new();
    let mut descriptors = vec![descriptor("gone", "1", &format!("{}/gone.jar", server.uri()))];

    let err = resolve(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("org.example:gone:1:jar"));
    assert!(err.to_string().contains("404"));
}

#[test]
fn test_unsupported_scheme_is_configuration_error() {
    let env = TestEnv::new();
    let mut descriptors = vec![descriptor("a", "1", "ftp://example.com/a.jar")];
    let err = resolve(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_slow_download_completes_past_timeout() {
    // 11 bytes at 150ms each outlasts the 1s timeout, but no single read stalls
    let url = trickle_server(HELLO.as_bytes(), Duration::from_millis(150));
    let env = TestEnv::new();
    let mut descriptors = vec![descriptor("slow", "1", url.as_str())];
    descriptors[0].timeout = Duration::from_millis(1000);
    descriptors[0].checksum = Some(HELLO_SHA1.to_string());

    let report = resolve(&env.ctx(), &mut descriptors).unwrap();
    assert_eq!(report.fetch_count, 1);
    assert_eq!(read(&env.stage().join("slow-1.jar")), HELLO);
}

#[tokio::test]
async fn test_unknown_checksum_algorithm_rejected_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HELLO))
        .expect(0)
        .mount(&server)
        .await;

    let env = TestEnv::new();
    let mut descriptors = vec![descriptor("a", "1", &format!("{}/a.jar", server.uri()))];
    descriptors[0].checksum = Some("crc32:abcd".to_string());

    let err = resolve(&env.ctx(), &mut descriptors).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("crc32"));
    assert!(!env.stage().join("a-1.jar").exists());
}
