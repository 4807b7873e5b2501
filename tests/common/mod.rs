#![allow(dead_code)]

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A 24-bit uncompressed BMP with a simple gradient.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    for y in 0..height {
        let row_start = bytes.len();
        for x in 0..width {
            bytes.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 120]);
        }
        bytes.resize(row_start + row_stride as usize, 0);
    }

    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// A Pl@ntNet-shaped response body with `count` results of descending score.
pub fn plantnet_body(count: usize) -> String {
    let results: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "score": 0.9 - 0.07 * i as f64,
                "species": {
                    "scientificNameWithoutAuthor": format!("Species {}", i + 1),
                    "commonNames": [format!("Common {}", i + 1)],
                    "family": {"scientificNameWithoutAuthor": "Rosaceae"},
                    "genus": {"scientificNameWithoutAuthor": "Rosa"}
                },
                "images": [{"url": {"m": format!("https://bs.plantnet.org/image/m/{}", i + 1)}}]
            })
        })
        .collect();

    serde_json::json!({
        "query": {"project": "all", "organs": ["leaf"]},
        "results": results,
        "remainingIdentificationRequests": 499
    })
    .to_string()
}

/// What the stub server received.
#[derive(Debug, Default)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_contains(&self, needle: &[u8]) -> bool {
        self.body.windows(needle.len()).any(|window| window == needle)
    }
}

/// Single-shot HTTP server on localhost.
pub struct StubServer {
    pub base_url: String,
    handle: JoinHandle<RecordedRequest>,
}

impl StubServer {
    /// Answers the first request with `status` and `body`.
    pub fn respond(status: u16, body: &str) -> Self {
        Self::respond_bytes(status, body.as_bytes())
    }

    /// Answers the first request with `status` and a raw (possibly non-UTF-8) body.
    pub fn respond_bytes(status: u16, body: &[u8]) -> Self {
        let body = body.to_vec();
        Self::spawn(move |mut stream, recorded| {
            let head = format!(
                "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                body.len()
            );
            stream.write_all(head.as_bytes()).expect("write response head");
            stream.write_all(&body).expect("write response body");
            stream.flush().expect("flush response");
            recorded
        })
    }

    /// Reads the request and then stays silent for `delay`.
    pub fn stall(delay: Duration) -> Self {
        Self::spawn(move |_stream, recorded| {
            thread::sleep(delay);
            recorded
        })
    }

    fn spawn<F>(handler: F) -> Self
    where
        F: FnOnce(TcpStream, RecordedRequest) -> RecordedRequest + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("local addr");

        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept connection");
            let recorded = read_request(&stream);
            handler(stream, recorded)
        });

        Self {
            base_url: format!("http://{}/v2/identify", addr),
            handle,
        }
    }

    pub fn finish(self) -> RecordedRequest {
        self.handle.join().expect("stub server thread")
    }
}

fn read_request(stream: &TcpStream) -> RecordedRequest {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut recorded = RecordedRequest::default();

    reader
        .read_line(&mut recorded.request_line)
        .expect("read request line");
    recorded.request_line = recorded.request_line.trim_end().to_string();

    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read header");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            recorded
                .headers
                .push((key.trim().to_string(), value.trim().to_string()));
        }
    }

    let content_length = recorded
        .header("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).expect("read body");
    recorded.body = body;

    recorded
}

/// A localhost URL on which nothing is listening.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}/v2/identify", addr)
}
