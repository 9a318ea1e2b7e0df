use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread::JoinHandle;

/// One request as it arrived on the wire
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    /// Header names are lowercased
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body must be JSON")
    }
}

/// Reply sent back for one request
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn bytes(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            content_type: "application/octet-stream",
            body: body.to_vec(),
        }
    }
}

/// HTTP listener on 127.0.0.1 answering one connection per canned response,
/// in order, then shutting down.
pub struct LoopbackServer {
    addr: SocketAddr,
    handle: JoinHandle<Vec<CapturedRequest>>,
}

impl LoopbackServer {
    pub fn start(responses: Vec<CannedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind loopback listener");
        let addr = listener.local_addr().expect("listener address");
        let handle = std::thread::spawn(move || {
            responses
                .into_iter()
                .map(|response| {
                    let (stream, _) = listener.accept().expect("Failed to accept connection");
                    serve_one(stream, &response)
                })
                .collect()
        });
        Self { addr, handle }
    }

    /// Base URL without a trailing slash
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Wait for every canned response to be served and return the requests
    pub fn finish(self) -> Vec<CapturedRequest> {
        self.handle.join().expect("loopback server panicked")
    }
}

/// URL of a port nothing is listening on
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind loopback listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{}", addr)
}

fn serve_one(stream: TcpStream, response: &CannedResponse) -> CapturedRequest {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).expect("request line");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("header line");
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).expect("request body");

    let mut stream = reader.into_inner();
    let head = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.content_type,
        response.body.len()
    );
    stream.write_all(head.as_bytes()).expect("response head");
    stream.write_all(&response.body).expect("response body");
    stream.flush().expect("flush response");

    CapturedRequest {
        method,
        path,
        headers,
        body,
    }
}
