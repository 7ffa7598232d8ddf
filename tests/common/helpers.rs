#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dirmirror::http::{HttpClientConfig, Transport};
use dirmirror::MirrorBuilder;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Asserts that a file exists at the given path
pub fn assert_file_exists(path: &Path) {
    assert!(path.exists(), "File should exist at path: {:?}", path);
}

/// Asserts that a file has the expected content
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let actual = fs::read(path).expect("Failed to read file");
    assert_eq!(actual.len(), expected.len(), "File size mismatch at path: {:?}", path);
    assert!(actual == expected, "File content mismatch at path: {:?}", path);
}

/// Creates a file with the given content, with its parent directories
pub fn create_file(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(path, content).expect("Failed to write file");
    path.to_path_buf()
}

// === Listing Helpers ===

/// Renders an Apache-style index page linking to `entries`.
///
/// Includes the parent link and the column sort links real servers emit.
pub fn listing_html(entries: &[&str]) -> String {
    let mut html = String::from(
        "<html><head><title>Index of /</title></head><body><h1>Index of /</h1><pre>\
         <a href=\"?C=N;O=D\">Name</a> <a href=\"?C=M;O=A\">Last modified</a>\n\
         <a href=\"../\">Parent Directory</a>\n",
    );
    for entry in entries {
        html.push_str(&format!("<a href=\"{0}\">{0}</a>   01-Jan-2024 00:00   -\n", entry));
    }
    html.push_str("</pre></body></html>");
    html
}

pub fn listing_response(entries: &[&str]) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(listing_html(entries), "text/html; charset=utf-8")
}

/// Mounts a listing page at `page_path`.
pub async fn mount_listing(server: &MockServer, page_path: &str, entries: &[&str]) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(listing_response(entries))
        .mount(server)
        .await;
}

/// Mounts a plain file at `file_path`; range requests are ignored.
pub async fn mount_file(server: &MockServer, file_path: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(file_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

// === Responders ===

/// Serves a body honoring `Range: bytes=N-` and records every Range header.
#[derive(Clone)]
pub struct RangeResponder {
    body: Vec<u8>,
    pub ranges: Arc<Mutex<Vec<Option<String>>>>,
}

impl RangeResponder {
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            ranges: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn recorded_ranges(&self) -> Vec<Option<String>> {
        self.ranges.lock().unwrap().clone()
    }
}

impl Respond for RangeResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let range = request
            .headers
            .get("range")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        self.ranges.lock().unwrap().push(range.clone());

        let total = self.body.len();
        let start = range
            .as_deref()
            .and_then(|r| r.strip_prefix("bytes="))
            .and_then(|r| r.strip_suffix('-'))
            .and_then(|r| r.parse::<usize>().ok());

        match start {
            None => ResponseTemplate::new(200).set_body_bytes(self.body.clone()),
            Some(start) if start >= total => ResponseTemplate::new(416)
                .insert_header("content-range", format!("bytes */{}", total).as_str()),
            Some(start) => ResponseTemplate::new(206)
                .insert_header(
                    "content-range",
                    format!("bytes {}-{}/{}", start, total - 1, total).as_str(),
                )
                .set_body_bytes(self.body[start..].to_vec()),
        }
    }
}

// === Raw Server ===
//
// wiremock always sends complete bodies. The raw server can announce a length
// and then stop short, or send a body slowly.

/// What the raw server saw of a request.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub path: String,
    pub range: Option<String>,
}

/// How the raw server answers one request.
#[derive(Debug, Clone)]
pub struct RawReply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    cut_after: Option<usize>,
    chunk: usize,
    pause: Duration,
}

impl RawReply {
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
            cut_after: None,
            chunk: usize::MAX,
            pause: Duration::ZERO,
        }
    }

    pub fn html(body: String) -> Self {
        Self::new(200, body.into_bytes()).header("Content-Type", "text/html")
    }

    /// A 206 carrying `body[start..]`.
    pub fn partial(body: &[u8], start: usize) -> Self {
        let range = format!("bytes {}-{}/{}", start, body.len() - 1, body.len());
        Self::new(206, body[start..].to_vec()).header("Content-Range", &range)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Close the connection after `n` body bytes. The full length is still announced.
    pub fn cut_after(mut self, n: usize) -> Self {
        self.cut_after = Some(n);
        self
    }

    /// Write the body `chunk` bytes at a time, waiting `pause` after each write.
    pub fn trickle(mut self, chunk: usize, pause: Duration) -> Self {
        self.chunk = chunk.max(1);
        self.pause = pause;
        self
    }
}

/// A bare HTTP/1.1 server on a local port.
///
/// The handler gets each request and how many earlier requests hit the same
/// path.
pub struct RawServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<RawRequest>>>,
    task: JoinHandle<()>,
}

impl RawServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RawRequest, usize) -> RawReply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind raw server");
        let addr = listener.local_addr().expect("Failed to read local address");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler = Arc::new(handler);

        let recorded = requests.clone();
        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    // Write errors only mean the client went away.
                    let _ = serve_raw(socket, handler.as_ref(), &recorded).await;
                });
            }
        });

        Self {
            addr,
            requests,
            task,
        }
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RawRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// `Range` headers sent for `path`, in order.
    pub fn ranges_for(&self, path: &str) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .map(|r| r.range)
            .collect()
    }
}

impl Drop for RawServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_raw<F>(
    mut socket: TcpStream,
    handler: &F,
    recorded: &Mutex<Vec<RawRequest>>,
) -> std::io::Result<()>
where
    F: Fn(&RawRequest, usize) -> RawReply,
{
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }

    let text = String::from_utf8_lossy(&head).into_owned();
    let mut lines = text.lines();
    let path = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let range = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("range"))
        .map(|(_, value)| value.trim().to_string());
    let request = RawRequest { path, range };

    let attempt = {
        let mut seen = recorded.lock().unwrap();
        let attempt = seen.iter().filter(|r| r.path == request.path).count();
        seen.push(request.clone());
        attempt
    };
    let reply = handler(&request, attempt);

    let reason = match reply.status {
        200 => "OK",
        206 => "Partial Content",
        404 => "Not Found",
        416 => "Range Not Satisfiable",
        _ => "Unknown",
    };
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reason,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    socket.write_all(out.as_bytes()).await?;

    let end = reply
        .cut_after
        .unwrap_or(reply.body.len())
        .min(reply.body.len());
    for chunk in reply.body[..end].chunks(reply.chunk) {
        socket.write_all(chunk).await?;
        socket.flush().await?;
        if !reply.pause.is_zero() {
            tokio::time::sleep(reply.pause).await;
        }
    }
    if reply.cut_after.is_some() {
        // Let the client take the prefix before the connection drops.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    socket.shutdown().await
}

// === Configuration Helpers ===

/// A transport that gives up quickly.
pub fn create_test_transport() -> Transport {
    Transport::new(&create_test_http_config(), None).expect("Failed to create transport")
}

pub fn create_test_http_config() -> HttpClientConfig {
    HttpClientConfig {
        retries: 1,
        backoff: (Duration::from_millis(1), Duration::from_millis(5)),
        connect_timeout: Duration::from_secs(5),
        read_timeout: Duration::from_secs(5),
        ..HttpClientConfig::default()
    }
}

/// A hidden mirror of `url` writing into `output`, with short retries.
pub fn create_test_builder(url: &str, output: &Path) -> MirrorBuilder {
    MirrorBuilder::hidden()
        .url(url)
        .directory(output.to_path_buf())
        .retries(1)
        .backoff(Duration::from_millis(1), Duration::from_millis(5))
        .timeout(Duration::from_secs(5))
}
