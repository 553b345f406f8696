//! Transports: moving bytes from a URL into a local file.
//!
//! A [`Transport`] is selected by URL scheme from a [`Transports`] registry.
//! `http`/`https` go through a ureq agent (with the settings proxy unless the
//! host is excluded), `file` is a local copy.

use crate::core::output;
use crate::helpers::internal::progress::{self, ProgressGuard, upgrade_to_bytes};
use crate::settings::Settings;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("extdep/", env!("CARGO_PKG_VERSION"));

/// Copies the resource at a URL into an open file.
///
/// Failures are returned as a human readable cause; the caller attaches the
/// artifact and URL.
pub trait Transport {
    fn fetch(&self, url: &Url, dest: &mut File, timeout: Duration) -> Result<u64, String>;
}

/// Scheme-keyed transport registry
#[derive(Default)]
pub struct Transports {
    by_scheme: HashMap<String, Box<dyn Transport>>,
}

impl Transports {
    pub fn new() -> Self {
        Self::default()
    }

    /// `http`, `https` and `file`, with proxy settings applied to HTTP.
    pub fn standard(settings: &Settings) -> Self {
        let mut transports = Self::new();
        let http = HttpTransport::new(settings);
        transports.register("http", Box::new(http.clone()));
        transports.register("https", Box::new(http));
        transports.register("file", Box::new(FileTransport));
        transports
    }

    pub fn register(&mut self, scheme: &str, transport: Box<dyn Transport>) {
        self.by_scheme.insert(scheme.to_ascii_lowercase(), transport);
    }

    pub fn get(&self, scheme: &str) -> Option<&dyn Transport> {
        self.by_scheme
            .get(&scheme.to_ascii_lowercase())
            .map(|t| t.as_ref())
    }
}

/// HTTP(S) over ureq.
///
/// Holds a direct agent and, when a proxy is configured, a proxied one; the
/// agent is picked per host. Downloads get their own agent so the descriptor
/// timeout bounds connecting and each read, never the whole transfer.
#[derive(Clone)]
pub struct HttpTransport {
    direct: ureq::Agent,
    proxied: Option<ureq::Agent>,
    proxy: Option<ureq::Proxy>,
    settings: Settings,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Self {
        let proxy = settings
            .proxy
            .as_ref()
            .and_then(|p| p.to_url())
            .and_then(|proxy_url| match ureq::Proxy::new(&proxy_url) {
                Ok(proxy) => Some(proxy),
                Err(e) => {
                    output::warning(&format!("ignoring invalid proxy settings: {e}"));
                    None
                }
            });
        let direct = ureq::AgentBuilder::new().user_agent(USER_AGENT).build();
        let proxied = proxy.clone().map(|proxy| {
            ureq::AgentBuilder::new()
                .user_agent(USER_AGENT)
                .proxy(proxy)
                .build()
        });
        Self {
            direct,
            proxied,
            proxy,
            settings: settings.clone(),
        }
    }

    fn use_proxy(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or_default();
        let proxied = self.proxy.is_some() && self.settings.proxy_for(host).is_some();
        if proxied {
            output::debug(&format!("using proxy for {host}"));
        }
        proxied
    }

    /// Agent for a URL: proxied unless the host is in `nonProxyHosts`.
    pub fn agent_for(&self, url: &Url) -> &ureq::Agent {
        match &self.proxied {
            Some(agent) if self.use_proxy(url) => agent,
            _ => &self.direct,
        }
    }

    /// Agent whose `timeout` applies to connecting and to every read.
    pub fn download_agent(&self, url: &Url, timeout: Duration) -> ureq::Agent {
        let builder = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout_connect(timeout)
            .timeout_read(timeout);
        match &self.proxy {
            Some(proxy) if self.use_proxy(url) => builder.proxy(proxy.clone()).build(),
            _ => builder.build(),
        }
    }

    /// GET a URL and return the body as a string.
    pub fn get_string(&self, url: &Url, timeout: Duration) -> Result<String, String> {
        self.agent_for(url)
            .get(url.as_str())
            .timeout(timeout)
            .call()
            .map_err(describe_error)?
            .into_string()
            .map_err(|e| format!("failed to read response: {e}"))
    }

    /// PUT a local file, with optional basic-auth header.
    pub fn put_file(
        &self,
        url: &Url,
        src: &Path,
        authorization: Option<&str>,
        timeout: Duration,
    ) -> Result<(), String> {
        let file = File::open(src).map_err(|e| format!("cannot read {}: {e}", src.display()))?;
        let length = file.metadata().map(|m| m.len()).unwrap_or(0);

        let mut request = self
            .agent_for(url)
            .put(url.as_str())
            .timeout(timeout)
            .set("Content-Length", &length.to_string());
        if let Some(auth) = authorization {
            request = request.set("Authorization", auth);
        }
        request.send(file).map_err(describe_error)?;
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, url: &Url, dest: &mut File, timeout: Duration) -> Result<u64, String> {
        let name = crate::helpers::internal::url_utils::extract_filename(url);
        let pb = progress::create_spinner(&format!("downloading {name}"));
        let _guard = ProgressGuard::new(&pb);

        let response = self
            .download_agent(url, timeout)
            .get(url.as_str())
            .call()
            .map_err(describe_error)?;

        if let Some(len) = response
            .header("content-length")
            .and_then(|s| s.parse().ok())
        {
            upgrade_to_bytes(&pb, len);
        }

        let mut reader = response.into_reader();
        let mut buffer = [0u8; 8192];
        let mut total_bytes = 0u64;

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .map_err(|e| format!("read error: {e}"))?;
            if bytes_read == 0 {
                break;
            }
            dest.write_all(&buffer[..bytes_read])
                .map_err(|e| format!("write error: {e}"))?;
            total_bytes += bytes_read as u64;
            pb.set_position(total_bytes);
        }

        Ok(total_bytes)
    }
}

/// `file://` URLs, copied from the local filesystem
pub struct FileTransport;

impl Transport for FileTransport {
    fn fetch(&self, url: &Url, dest: &mut File, _timeout: Duration) -> Result<u64, String> {
        let path = url
            .to_file_path()
            .map_err(|_| format!("not a local file URL: {url}"))?;
        let mut src = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => format!("resource not found: {}", path.display()),
            _ => format!("cannot read {}: {e}", path.display()),
        })?;
        std::io::copy(&mut src, dest).map_err(|e| format!("copy failed: {e}"))
    }
}

fn describe_error(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code @ (401 | 403), _) => {
            format!("authentication/authorization failed (HTTP {code})")
        }
        ureq::Error::Status(404, _) => "resource not found (HTTP 404)".to_string(),
        ureq::Error::Status(code, response) => {
            format!("HTTP {code} {}", response.status_text())
        }
        ureq::Error::Transport(t) => format!("connection failed: {t}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetch_to_string(transport: &dyn Transport, url: &Url) -> Result<String, String> {
        let mut tmp = NamedTempFile::new().unwrap();
        transport.fetch(url, tmp.as_file_mut(), Duration::from_secs(5))?;
        Ok(std::fs::read_to_string(tmp.path()).unwrap())
    }

    #[test]
    fn test_registry_by_scheme() {
        let transports = Transports::standard(&Settings::default());
        assert!(transports.get("http").is_some());
        assert!(transports.get("HTTPS").is_some());
        assert!(transports.get("file").is_some());
        assert!(transports.get("ftp").is_none());
    }

    #[test]
    fn test_file_transport() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "payload").unwrap();

        let url = Url::from_file_path(&src).unwrap();
        assert_eq!(fetch_to_string(&FileTransport, &url).unwrap(), "payload");

        let missing = Url::from_file_path(dir.path().join("missing")).unwrap();
        let err = fetch_to_string(&FileTransport, &missing).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[tokio::test]
    async fn test_http_fetch_and_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_string("jar-bytes"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/secret.jar"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let http = HttpTransport::new(&Settings::default());
        let ok = Url::parse(&format!("{}/ok.jar", server.uri())).unwrap();
        assert_eq!(fetch_to_string(&http, &ok).unwrap(), "jar-bytes");

        let secret = Url::parse(&format!("{}/secret.jar", server.uri())).unwrap();
        assert!(fetch_to_string(&http, &secret).unwrap_err().contains("401"));

        let missing = Url::parse(&format!("{}/missing.jar", server.uri())).unwrap();
        assert!(fetch_to_string(&http, &missing).unwrap_err().contains("404"));
    }

    /// Serve one response whose body is written a byte at a time.
    fn trickle_server(body: &'static [u8], pause: Duration) -> Url {
        use std::io::{BufRead, BufReader};
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
        Url::parse(&format!("http://{addr}/slow.bin")).unwrap()
    }

    #[test]
    fn test_slow_download_outlives_timeout() {
        let url = trickle_server(b"abcdef", Duration::from_millis(300));
        let http = HttpTransport::new(&Settings::default());
        let mut tmp = NamedTempFile::new().unwrap();

        let bytes = http
            .fetch(&url, tmp.as_file_mut(), Duration::from_millis(1000))
            .unwrap();
        assert_eq!(bytes, 6);
        assert_eq!(std::fs::read_to_string(tmp.path()).unwrap(), "abcdef");
    }

    #[test]
    fn test_stalled_download_times_out() {
        let url = trickle_server(b"ab", Duration::from_millis(1500));
        let http = HttpTransport::new(&Settings::default());
        let mut tmp = NamedTempFile::new().unwrap();

        let result = http.fetch(&url, tmp.as_file_mut(), Duration::from_millis(300));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_http_put_sends_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repo/a.jar"))
            .and(wiremock::matchers::header("Authorization", "Basic dTpw"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.jar");
        std::fs::write(&src, "x").unwrap();

        let http = HttpTransport::new(&Settings::default());
        let url = Url::parse(&format!("{}/repo/a.jar", server.uri())).unwrap();
        http.put_file(&url, &src, Some("Basic dTpw"), Duration::from_secs(5))
            .unwrap();
    }
}
