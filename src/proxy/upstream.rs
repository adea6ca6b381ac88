//! Upstream connection and request forwarding.
//!
//! Relays a client request to the backend origin and reads the response
//! back. The request line is preserved verbatim, the Host header is
//! rewritten to the origin, and hop-by-hop headers are stripped in both
//! directions. There are no retries and no timeout override; a failure
//! propagates to the caller, which answers the client with 502.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::{Buf, BytesMut};
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::proxy::origin::TargetOrigin;
use crate::proxy::tls;

/// Default buffer size for upstream reads
const BUFFER_SIZE: usize = 8192;

/// Upper bound on upstream response header size
const MAX_HEADER_BYTES: usize = 64 * 1024;

/// Forwards requests to the configured backend origin.
pub struct ProxyHandler {
    origin: TargetOrigin,
    tls: TlsConnector,
}

impl ProxyHandler {
    pub fn new(origin: TargetOrigin) -> Result<Self> {
        let tls = TlsConnector::from(Arc::new(tls::insecure_client_config()?));
        Ok(Self { origin, tls })
    }

    pub fn origin(&self) -> &TargetOrigin {
        &self.origin
    }

    /// Forward a request to the origin and return its response.
    ///
    /// Connects per request, over TLS (verification disabled) for https
    /// origins and plain TCP otherwise.
    pub async fn forward(&self, request: &Request) -> Result<Response> {
        let stream = TcpStream::connect((self.origin.host(), self.origin.port()))
            .await
            .with_context(|| format!("Failed to connect to upstream {}", self.origin))?;

        tracing::trace!(origin = %self.origin, "Connected to upstream");

        if self.origin.is_tls() {
            let name = ServerName::try_from(self.origin.host().to_string())
                .context("Invalid upstream TLS server name")?;
            let stream = self
                .tls
                .connect(name, stream)
                .await
                .context("Upstream TLS handshake failed")?;
            self.exchange(stream, request).await
        } else {
            self.exchange(stream, request).await
        }
    }

    async fn exchange<S>(&self, mut stream: S, request: &Request) -> Result<Response>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let bytes = self.build_upstream_request(request);
        stream
            .write_all(&bytes)
            .await
            .context("Failed to send request upstream")?;
        stream.flush().await?;

        tracing::trace!("Request sent to upstream");

        read_response(&mut stream, request.method != Method::HEAD).await
    }

    /// Serialize the outbound request.
    ///
    /// Public so integration tests can assert on the exact bytes.
    pub fn build_upstream_request(&self, request: &Request) -> Vec<u8> {
        let mut headers = request.headers.clone();

        headers.retain(|k, _| !is_hop_by_hop(k));
        remove_header(&mut headers, "Host");

        // changeOrigin: the backend sees its own authority
        headers.insert("Host".to_string(), self.origin.host_header().to_string());

        // One connection per forwarded request
        headers.insert("Connection".to_string(), "close".to_string());

        if !request.body.is_empty() {
            remove_header(&mut headers, "Content-Length");
            headers.insert(
                "Content-Length".to_string(),
                request.body.len().to_string(),
            );
        }

        let path = if request.path.is_empty() {
            "/"
        } else {
            &request.path
        };

        let mut buffer = Vec::new();
        buffer.extend_from_slice(
            format!("{} {} {}\r\n", request.method.as_str(), path, request.version).as_bytes(),
        );
        for (key, value) in &headers {
            buffer.extend_from_slice(format!("{key}: {value}\r\n").as_bytes());
        }
        buffer.extend_from_slice(b"\r\n");
        buffer.extend_from_slice(&request.body);

        buffer
    }
}

/// Read a full HTTP response from an upstream stream.
///
/// `expect_body` is false for HEAD requests, whose responses carry headers
/// only regardless of Content-Length.
pub async fn read_response<S>(stream: &mut S, expect_body: bool) -> Result<Response>
where
    S: AsyncRead + Unpin,
{
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    let headers_end = loop {
        if let Some(pos) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        if buffer.len() > MAX_HEADER_BYTES {
            anyhow::bail!("Upstream response headers too large");
        }
        fill(stream, &mut buffer).await?;
    };

    let head = buffer.split_to(headers_end + 4);
    let (status, mut headers) = parse_response_head(&head)?;

    let chunked = header_value(&headers, "Transfer-Encoding")
        .map(|v| v.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false);
    let content_length =
        header_value(&headers, "Content-Length").and_then(|v| v.parse::<usize>().ok());

    let body = if !expect_body || !status.allows_body() {
        Vec::new()
    } else if chunked {
        read_chunked_body(stream, &mut buffer).await?
    } else if let Some(len) = content_length {
        read_sized_body(stream, &mut buffer, len).await?
    } else {
        read_until_close(stream, &mut buffer).await?
    };

    remove_hop_by_hop(&mut headers);
    if expect_body {
        // Re-derived from the body actually carried (chunked bodies arrive
        // without a Content-Length); the builder fills it in.
        remove_header(&mut headers, "Content-Length");
    }

    Ok(ResponseBuilder::new(status).headers(headers).body(body).build())
}

fn parse_response_head(head: &[u8]) -> Result<(StatusCode, HashMap<String, String>)> {
    let text =
        std::str::from_utf8(head).context("Invalid UTF-8 in upstream response headers")?;
    let mut lines = text.lines();

    let status_line = lines.next().context("Empty upstream response")?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts.next().context("Malformed upstream status line")?;
    let code: u16 = parts
        .next()
        .context("Malformed upstream status line")?
        .parse()
        .context("Invalid upstream status code")?;

    let mut headers = HashMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    Ok((StatusCode::from_u16(code), headers))
}

async fn read_sized_body<S>(stream: &mut S, buffer: &mut BytesMut, len: usize) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    while buffer.len() < len {
        fill(stream, buffer).await?;
    }
    Ok(buffer.split_to(len).to_vec())
}

async fn read_until_close<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    loop {
        let n = stream.read_buf(buffer).await?;
        if n == 0 {
            return Ok(buffer.split().to_vec());
        }
    }
}

async fn read_chunked_body<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    let mut body = Vec::new();

    loop {
        let line_end = loop {
            if let Some(pos) = find_crlf(buffer) {
                break pos;
            }
            fill(stream, buffer).await?;
        };

        let line = buffer.split_to(line_end + 2);
        let size_text = std::str::from_utf8(&line[..line_end])
            .context("Invalid chunk size line")?;
        let size_hex = size_text.split(';').next().unwrap_or("").trim();
        let size =
            usize::from_str_radix(size_hex, 16).context("Invalid chunk size")?;

        if size == 0 {
            // Trailer section: lines until the terminating empty line
            loop {
                let pos = loop {
                    if let Some(pos) = find_crlf(buffer) {
                        break pos;
                    }
                    fill(stream, buffer).await?;
                };
                buffer.advance(pos + 2);
                if pos == 0 {
                    return Ok(body);
                }
            }
        }

        while buffer.len() < size + 2 {
            fill(stream, buffer).await?;
        }
        body.extend_from_slice(&buffer[..size]);
        buffer.advance(size + 2); // chunk data + trailing CRLF
    }
}

async fn fill<S>(stream: &mut S, buffer: &mut BytesMut) -> Result<()>
where
    S: AsyncRead + Unpin,
{
    let n = stream.read_buf(buffer).await?;
    if n == 0 {
        anyhow::bail!("Upstream closed connection before complete response");
    }
    Ok(())
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn is_hop_by_hop(name: &str) -> bool {
    name.eq_ignore_ascii_case("connection")
        || name.eq_ignore_ascii_case("keep-alive")
        || name.eq_ignore_ascii_case("proxy-connection")
        || name.eq_ignore_ascii_case("transfer-encoding")
        || name.eq_ignore_ascii_case("upgrade")
        || name.eq_ignore_ascii_case("te")
        || name.eq_ignore_ascii_case("trailer")
}

fn remove_hop_by_hop(headers: &mut HashMap<String, String>) {
    headers.retain(|k, _| !is_hop_by_hop(k));
}

fn remove_header(headers: &mut HashMap<String, String>, name: &str) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
}

fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
