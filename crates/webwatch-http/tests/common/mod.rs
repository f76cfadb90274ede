//! Minimal HTTP/1.1 server for fetcher integration tests.
//!
//! Answers every request with a fixed status and body, and records the raw
//! request head so tests can inspect headers such as `Authorization`.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A running test server
pub struct TestServer {
    /// Base URL, e.g. "http://127.0.0.1:12345/"
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Raw request heads received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Value of `name` in the most recent request, if present
    pub fn last_header(&self, name: &str) -> Option<String> {
        let requests = self.requests();
        let last = requests.last()?;
        last.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// Start a server answering `200 OK` with `body`
pub fn start(body: &[u8]) -> TestServer {
    start_with_status(200, "OK", body)
}

/// Start a server answering with the given status line and `body`
///
/// The server runs in a background thread until the process exits.
pub fn start_with_status(code: u16, reason: &str, body: &[u8]) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        code,
        reason,
        body.len()
    );
    let mut response = head.into_bytes();
    response.extend_from_slice(body);
    let response = Arc::new(response);

    let seen = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let response = Arc::clone(&response);
            let seen = Arc::clone(&seen);
            thread::spawn(move || handle(stream, &response, &seen));
        }
    });

    TestServer {
        url: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

/// A local URL nothing is listening on
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, response: &[u8], seen: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    if let Ok(request) = std::str::from_utf8(&buf[..n]) {
        seen.lock().unwrap().push(request.to_string());
    }
    let _ = stream.write_all(response);
    let _ = stream.flush();
}
