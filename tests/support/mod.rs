//! Minimal HTTP/1.1 stub server for driving real request attempts.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Behaviour {
    status: u16,
    delay: Duration,
    payload: String,
    keep_alive: bool,
    silent: bool, // accept and read, never answer
}

#[derive(Default)]
struct Counters {
    hits: AtomicUsize,
    connections: AtomicUsize,
    received: Mutex<Vec<Received>>,
}

pub struct StubServer {
    addr: SocketAddr,
    counters: Arc<Counters>,
}

impl StubServer {
    /// Answers every request with `status` after `delay`, one request per connection.
    pub fn start(status: u16, delay: Duration) -> Self {
        Self::spawn(Behaviour {
            status,
            delay,
            payload: "stub response body".to_string(),
            keep_alive: false,
            silent: false,
        })
    }

    /// Keeps connections open and serves requests on them until the client hangs up.
    pub fn keep_alive(status: u16, body_len: usize) -> Self {
        Self::spawn(Behaviour {
            status,
            delay: Duration::ZERO,
            payload: "x".repeat(body_len),
            keep_alive: true,
            silent: false,
        })
    }

    /// Accepts connections and never replies.
    pub fn silent() -> Self {
        Self::spawn(Behaviour {
            status: 0,
            delay: Duration::ZERO,
            payload: String::new(),
            keep_alive: false,
            silent: true,
        })
    }

    fn spawn(behaviour: Behaviour) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let counters = Arc::new(Counters::default());

        let shared = Arc::clone(&counters);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                shared.connections.fetch_add(1, Ordering::SeqCst);
                let (counters, behaviour) = (Arc::clone(&shared), behaviour.clone());
                thread::spawn(move || serve(stream, &behaviour, &counters));
            }
        });

        Self { addr, counters }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self) -> usize {
        self.counters.hits.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> usize {
        self.counters.connections.load(Ordering::SeqCst)
    }

    pub fn received(&self) -> Vec<Received> {
        self.counters.received.lock().unwrap().clone()
    }
}

/// A URL nothing listens on.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/", addr)
}

fn serve(mut stream: TcpStream, behaviour: &Behaviour, counters: &Counters) {
    let mut buf = Vec::new();
    loop {
        let Some(request) = read_request(&mut stream, &mut buf) else { return };
        counters.hits.fetch_add(1, Ordering::SeqCst);
        counters.received.lock().unwrap().push(request);

        if behaviour.silent {
            // hold the socket open until the client gives up
            let mut sink = [0u8; 1024];
            while matches!(stream.read(&mut sink), Ok(n) if n > 0) {}
            return;
        }

        thread::sleep(behaviour.delay);

        let connection = if behaviour.keep_alive { "keep-alive" } else { "close" };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: {}\r\n\r\n{}",
            behaviour.status,
            reason(behaviour.status),
            behaviour.payload.len(),
            connection,
            behaviour.payload
        );
        if stream.write_all(response.as_bytes()).is_err() || stream.flush().is_err() {
            return;
        }
        if !behaviour.keep_alive {
            return;
        }
    }
}

// Reads one request off the socket; bytes past it stay in `buf`.
fn read_request(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Option<Received> {
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find(buf, b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let method = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .unwrap_or_default()
        .to_string();
    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else { continue };
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => content_length = value.trim().parse().unwrap_or(0),
            "content-type" => content_type = Some(value.trim().to_string()),
            _ => {}
        }
    }

    while buf.len() < header_end + content_length {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    let end = buf.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&buf[header_end..end]).to_string();
    buf.drain(..end);

    Some(Received { method, content_type, body })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
