//! Integration tests for `HttpFetcher` against a loopback HTTP server.
//!
//! Run with: `cargo test --test http_fetcher`

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::TempDir;

use modutil::transfer::{part_path, Fetcher, HttpFetcher, TransferError, TransferProgress};

const BODY: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// ============================================================================
// Helper Functions
// ============================================================================

/// A one-shot server that answers every request with `respond(request_head)`.
struct TestServer {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
    worker: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start<F>(connections: usize, respond: F) -> Self
    where
        F: Fn(&str) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/HDN/HDN_BASE.zip", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let worker = thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let head = read_head(&stream);
                seen.lock().unwrap().push(head.clone());
                let _ = stream.write_all(&respond(&head));
                let _ = stream.flush();
            }
        });

        Self {
            url,
            requests,
            worker: Some(worker),
        }
    }

    fn requests(&mut self) -> Vec<String> {
        if let Some(worker) = self.worker.take() {
            worker.join().unwrap();
        }
        self.requests.lock().unwrap().clone()
    }
}

fn read_head(stream: &TcpStream) -> String {
    let mut reader = BufReader::new(stream);
    let mut head = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
            break;
        }
        head.push_str(&line);
    }
    head
}

fn range_start(head: &str) -> Option<usize> {
    head.lines()
        .find(|line| line.to_ascii_lowercase().starts_with("range:"))
        .and_then(|line| line.split("bytes=").nth(1))
        .and_then(|spec| spec.trim().trim_end_matches('-').parse().ok())
}

fn response(status: &str, headers: &[(&str, String)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {}\r\nConnection: close\r\n", status);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str("\r\n");
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn ok_full(body: &[u8]) -> Vec<u8> {
    response("200 OK", &[("Content-Length", body.len().to_string())], body)
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::with_timeout(Duration::from_secs(10)).unwrap()
}

fn partial(dest: &Path, bytes: &[u8]) {
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    fs::write(part_path(dest), bytes).unwrap();
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_full_download() {
    let mut server = TestServer::start(1, |_| ok_full(BODY));
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("downloads/HDN_BASE.zip");
    let progress = TransferProgress::new();

    let size = fetcher().fetch(&server.url, &dest, &progress).unwrap();

    assert_eq!(size, BODY.len() as u64);
    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert!(!part_path(&dest).exists());
    assert_eq!(progress.total(), Some(BODY.len() as u64));
    assert_eq!(progress.transferred(), BODY.len() as u64);
    assert!(range_start(&server.requests()[0]).is_none());
}

#[test]
fn test_resumes_partial_download() {
    let mut server = TestServer::start(1, |head| match range_start(head) {
        Some(start) => {
            let rest = &BODY[start..];
            response(
                "206 Partial Content",
                &[
                    ("Content-Length", rest.len().to_string()),
                    (
                        "Content-Range",
                        format!("bytes {}-{}/{}", start, BODY.len() - 1, BODY.len()),
                    ),
                ],
                rest,
            )
        }
        None => ok_full(BODY),
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_BASE.zip");
    partial(&dest, &BODY[..10]);
    let progress = TransferProgress::new();

    fetcher().fetch(&server.url, &dest, &progress).unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(progress.total(), Some(BODY.len() as u64));
    assert_eq!(range_start(&server.requests()[0]), Some(10));
}

#[test]
fn test_restarts_when_range_ignored() {
    let mut server = TestServer::start(1, |_| ok_full(BODY));
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_BASE.zip");
    partial(&dest, b"stale bytes");

    fetcher()
        .fetch(&server.url, &dest, &TransferProgress::new())
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    assert_eq!(range_start(&server.requests()[0]), Some(11));
}

#[test]
fn test_restarts_when_range_not_satisfiable() {
    let mut server = TestServer::start(2, |head| match range_start(head) {
        Some(_) => response(
            "416 Range Not Satisfiable",
            &[("Content-Length", "0".to_string())],
            b"",
        ),
        None => ok_full(BODY),
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_BASE.zip");
    partial(&dest, &[0u8; 64]);

    fetcher()
        .fetch(&server.url, &dest, &TransferProgress::new())
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert!(range_start(&requests[1]).is_none());
}

#[test]
fn test_restarts_when_resumed_at_wrong_offset() {
    let mut server = TestServer::start(2, |head| match range_start(head) {
        Some(_) => response(
            "206 Partial Content",
            &[
                ("Content-Length", BODY.len().to_string()),
                (
                    "Content-Range",
                    format!("bytes 0-{}/{}", BODY.len() - 1, BODY.len()),
                ),
            ],
            BODY,
        ),
        None => ok_full(BODY),
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_BASE.zip");
    partial(&dest, &BODY[..10]);

    fetcher()
        .fetch(&server.url, &dest, &TransferProgress::new())
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), BODY);
    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(range_start(&requests[0]), Some(10));
    assert!(range_start(&requests[1]).is_none());
}

#[test]
fn test_not_found_is_a_status_error() {
    let server = TestServer::start(1, |_| {
        response("404 Not Found", &[("Content-Length", "0".to_string())], b"")
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_UPDATE_9.zip");

    let err = fetcher()
        .fetch(&server.url, &dest, &TransferProgress::new())
        .unwrap_err();

    assert!(matches!(err, TransferError::Status { status: 404, .. }));
    assert!(!dest.exists());
}

#[test]
fn test_truncated_body_never_reaches_destination() {
    let server = TestServer::start(1, |_| {
        response(
            "200 OK",
            &[("Content-Length", (BODY.len() * 4).to_string())],
            BODY,
        )
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("HDN_BASE.zip");

    let result = fetcher().fetch(&server.url, &dest, &TransferProgress::new());

    assert!(result.is_err());
    assert!(!dest.exists());
}
