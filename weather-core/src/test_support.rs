//! One-shot HTTP server returning a canned response and capturing the request.

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

/// Request as seen on the wire.
#[derive(Debug)]
pub struct Captured {
    /// Request line and headers as sent.
    pub head: String,
    pub body: String,
}

impl Captured {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Serve exactly one request on 127.0.0.1 with `status` and `body`.
/// Returns the base URL and a handle resolving to the captured request.
pub async fn serve_once(status: u16, body: impl Into<String>) -> (String, JoinHandle<Captured>) {
    let body = body.into();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let captured = Captured {
            head,
            body: String::new(),
        };
        let len = captured
            .header("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut rest = buf[head_end + 4..].to_vec();
        while rest.len() < len {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            rest.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        Captured {
            body: String::from_utf8_lossy(&rest).into_owned(),
            ..captured
        }
    });

    (url, handle)
}
