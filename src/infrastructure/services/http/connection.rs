use embassy_net::tcp::TcpSocket;
use embedded_io_async::Write as _;
use heapless::{String, Vec};

use myrtio_pixel_core::http::{
    BufferedWriter as _, HttpMethod, RequestHead, ResponseHeaders, find_content_length,
    head_end, parse_request_line,
};

use super::{HttpError, HttpResult};

/// Request head, including whatever body bytes arrived with it
pub const HEAD_BUFFER_SIZE: usize = 1024;
const RESPONSE_HEAD_SIZE: usize = 256;
const STREAM_CHUNK_SIZE: usize = 1024;

/// HTTP connection context
pub struct HttpConnection<'a> {
    socket: TcpSocket<'a>,
    method: HttpMethod,
    content_length: u32,
    head_end: usize,
    head_buf: Vec<u8, HEAD_BUFFER_SIZE>,
}

impl<'a> HttpConnection<'a> {
    /// Read the request head from a freshly accepted socket.
    pub(crate) async fn from_socket(mut socket: TcpSocket<'a>) -> Result<Self, HttpError> {
        let mut head_buf = Vec::<u8, HEAD_BUFFER_SIZE>::new();
        head_buf
            .resize_default(HEAD_BUFFER_SIZE)
            .map_err(|()| HttpError::HeadTooLarge)?;
        let mut filled = 0;
        let end = loop {
            if let Some(end) = head_end(&head_buf[..filled]) {
                break end;
            }
            if filled == head_buf.len() {
                return Err(HttpError::HeadTooLarge);
            }
            let n = socket.read(&mut head_buf[filled..]).await?;
            if n == 0 {
                return Err(HttpError::Closed);
            }
            filled += n;
        };
        head_buf.truncate(filled);

        let head_str = core::str::from_utf8(&head_buf[..end]).map_err(|_| HttpError::Parse)?;
        let (method, _, headers) = parse_request_line(head_str).ok_or(HttpError::Parse)?;
        let content_length = find_content_length(headers).unwrap_or(0);

        Ok(Self {
            socket,
            method,
            content_length,
            head_end: end,
            head_buf,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn content_length(&self) -> u32 {
        self.content_length
    }

    /// Parsed request head. Borrows the connection, read the body first.
    pub fn head(&self) -> Result<RequestHead<'_>, HttpError> {
        let head_str =
            core::str::from_utf8(&self.head_buf[..self.head_end]).map_err(|_| HttpError::Parse)?;
        RequestHead::parse(head_str).ok_or(HttpError::Parse)
    }

    /// Read the request body into `buf`.
    ///
    /// Returns the body length; `buf` must hold `content_length` bytes.
    pub async fn read_body_into(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        let length = self.content_length as usize;
        let body = buf.get_mut(..length).ok_or(HttpError::Read)?;

        let trailer = &self.head_buf[self.head_end..];
        let mut received = trailer.len().min(length);
        body[..received].copy_from_slice(&trailer[..received]);

        while received < length {
            let n = self.socket.read(&mut body[received..]).await?;
            if n == 0 {
                return Err(HttpError::Closed);
            }
            received += n;
        }
        self.head_buf.truncate(self.head_end);
        Ok(length)
    }

    /// Write the headers to the connection
    pub(crate) async fn write_headers(&mut self, headers: &ResponseHeaders<'_>) -> HttpResult {
        let mut head = String::<RESPONSE_HEAD_SIZE>::new();
        headers.write_to(&mut head)?;
        self.write_all(head.as_bytes()).await
    }

    /// Write the body to the connection
    pub(crate) async fn write_body(&mut self, body: &[u8]) -> HttpResult {
        for chunk in body.chunks(STREAM_CHUNK_SIZE) {
            self.write_all(chunk).await?;
        }
        Ok(())
    }

    async fn write_all(&mut self, buf: &[u8]) -> HttpResult {
        self.socket.write_all(buf).await?;
        self.socket.flush().await?;
        Ok(())
    }

    /// Hand the socket over after a protocol switch, with any bytes that
    /// followed the head.
    pub(crate) fn into_parts(self) -> (TcpSocket<'a>, Vec<u8, HEAD_BUFFER_SIZE>) {
        let mut trailer = Vec::new();
        // Same capacity as the head buffer
        let _ = trailer.extend_from_slice(&self.head_buf[self.head_end..]);
        (self.socket, trailer)
    }

    /// Send FIN once the response is out
    pub(crate) async fn close(mut self) {
        self.socket.close();
        let _ = self.socket.flush().await;
    }
}
