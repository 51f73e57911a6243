//! HTTP/1.1 request head parsing and response head formatting
//!
//! Socket handling lives in the firmware; this module only deals with
//! bytes and strings so it can be exercised on the host.

use core::fmt::Write;

fn reason_phrase(code: u16) -> &'static str {
    match code {
        101 => "Switching Protocols",
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        413 => "Request Entity Too Large",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// HTTP Content Type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    TextHtml,
    TextPlain,
    TextCss,
    JavaScript,
    Svg,
    Png,
    Icon,
    ApplicationOctetStream,
}

impl ContentType {
    /// Convert the content type to a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::TextHtml => "text/html",
            ContentType::TextPlain => "text/plain",
            ContentType::TextCss => "text/css",
            ContentType::JavaScript => "application/javascript",
            ContentType::Svg => "image/svg+xml",
            ContentType::Png => "image/png",
            ContentType::Icon => "image/x-icon",
            ContentType::ApplicationOctetStream => "application/octet-stream",
        }
    }

    /// Guess the content type from a file path extension
    pub fn from_path(path: &str) -> Self {
        let extension = path.rsplit_once('.').map_or("", |(_, ext)| ext);
        match extension {
            "html" | "htm" => ContentType::TextHtml,
            "css" => ContentType::TextCss,
            "js" => ContentType::JavaScript,
            "json" => ContentType::Json,
            "txt" => ContentType::TextPlain,
            "svg" => ContentType::Svg,
            "png" => ContentType::Png,
            "ico" => ContentType::Icon,
            _ => ContentType::ApplicationOctetStream,
        }
    }

    /// Whether the type is text and gets a charset parameter
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ContentType::TextHtml
                | ContentType::TextPlain
                | ContentType::TextCss
                | ContentType::JavaScript
                | ContentType::Json
        )
    }
}

/// HTTP socket connection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPolicy {
    Close,
    Upgrade,
}

impl ConnectionPolicy {
    fn as_str(&self) -> &'static str {
        match self {
            ConnectionPolicy::Close => "close",
            ConnectionPolicy::Upgrade => "Upgrade",
        }
    }
}

pub trait BufferedWriter {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error>;
}

/// HTTP Content Headers.
#[derive(Debug)]
pub struct ContentHeaders {
    content_type: ContentType,
    content_length: Option<usize>,
}

impl ContentHeaders {
    /// Create a new content headers with a content type.
    pub const fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            content_length: None,
        }
    }

    /// Set the content length.
    #[must_use]
    pub const fn with_length(mut self, content_length: usize) -> Self {
        self.content_length = Some(content_length);
        self
    }
}

impl BufferedWriter for ContentHeaders {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        write!(writer, "Content-Type: {}", self.content_type.as_str())?;
        if self.content_type.is_text() {
            write!(writer, "; charset=utf-8")?;
        }
        write!(writer, "\r\n")?;
        if let Some(content_length) = self.content_length {
            write!(writer, "Content-Length: {}\r\n", content_length)?;
        }
        Ok(())
    }
}

/// Response Headers.
#[derive(Debug)]
pub struct ResponseHeaders<'a> {
    status: u16,
    connection: ConnectionPolicy,
    content: Option<ContentHeaders>,
    websocket_accept: Option<&'a str>,
}

impl<'a> ResponseHeaders<'a> {
    /// Create empty response headers with a status code.
    pub const fn from_code(code: u16) -> Self {
        Self {
            status: code,
            connection: ConnectionPolicy::Close,
            content: None,
            websocket_accept: None,
        }
    }

    /// Set the success status code.
    pub const fn success() -> Self {
        Self::from_code(200)
    }

    /// Set the success no content status code.
    pub const fn success_no_content() -> Self {
        Self::from_code(204)
    }

    /// Set the not found status code.
    pub const fn not_found() -> Self {
        Self::from_code(404)
    }

    /// Set the service unavailable status code.
    pub const fn unavailable() -> Self {
        Self::from_code(503)
    }

    /// Set the too large status code.
    pub const fn too_large() -> Self {
        Self::from_code(413)
    }

    /// Accept a WebSocket upgrade with the computed accept key.
    pub const fn switching_protocols(accept: &'a str) -> Self {
        Self {
            status: 101,
            connection: ConnectionPolicy::Upgrade,
            content: None,
            websocket_accept: Some(accept),
        }
    }

    /// Set the content headers.
    #[must_use]
    pub const fn with_content(mut self, content: ContentHeaders) -> Self {
        self.content = Some(content);
        self
    }

    pub const fn status(&self) -> u16 {
        self.status
    }
}

impl BufferedWriter for ResponseHeaders<'_> {
    /// Write the response headers to a writer.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        let reason = reason_phrase(self.status);
        write!(writer, "HTTP/1.1 {} {}\r\n", self.status, reason)?;
        if let Some(content) = &self.content {
            content.write_to(writer)?;
        }
        if let Some(accept) = self.websocket_accept {
            write!(writer, "Upgrade: websocket\r\n")?;
            write!(writer, "Sec-WebSocket-Accept: {}\r\n", accept)?;
        }

        write!(writer, "Connection: {}\r\n", self.connection.as_str())?;
        write!(writer, "\r\n")?;
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Head,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "HEAD" => HttpMethod::Head,
            _ => return None,
        })
    }
}

/// Parsed request line and the headers the server cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: HttpMethod,
    pub path: &'a str,
    pub content_length: u32,
    /// `Sec-WebSocket-Key`, only set when the request asks for a
    /// WebSocket upgrade
    pub websocket_key: Option<&'a str>,
}

impl<'a> RequestHead<'a> {
    /// Parse the head of a request, everything before the blank line.
    pub fn parse(head: &'a str) -> Option<Self> {
        let (method, path, headers) = parse_request_line(head)?;
        let content_length = find_content_length(headers).unwrap_or(0);

        let wants_upgrade = find_header(headers, "upgrade")
            .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));
        let websocket_key = if wants_upgrade {
            find_header(headers, "sec-websocket-key")
        } else {
            None
        };

        Some(Self {
            method,
            path,
            content_length,
            websocket_key,
        })
    }

    /// Path without the query string
    pub fn route_path(&self) -> &'a str {
        self.path.split_once('?').map_or(self.path, |(path, _)| path)
    }
}

/// Parse the request line from the header string.
///
/// Returns the method, path, and rest of the header string.
pub fn parse_request_line(header_str: &str) -> Option<(HttpMethod, &str, &str)> {
    let line_end = header_str.find("\r\n").unwrap_or(header_str.len());
    let first_line = &header_str[..line_end];
    let mut parts = first_line.split_whitespace();
    let method = parts.next().and_then(HttpMethod::parse)?;
    let path = parts.next()?;
    let rest = header_str.get(line_end + 2..).unwrap_or("");

    Some((method, path, rest))
}

/// Find a header value by lowercase name.
pub fn find_header<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then_some(value.trim())
    })
}

/// Find the content length in the header string.
///
/// Returns the content length if found, otherwise None.
pub fn find_content_length(header: &str) -> Option<u32> {
    find_header(header, "content-length")?.parse::<u32>().ok()
}

/// Position right after the `\r\n\r\n` that ends a request head
pub fn head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}
