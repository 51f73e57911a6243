//! HTTP/1.1 and WebSocket transport over embassy-net TCP sockets

pub mod connection;
pub mod server;
pub mod websocket;

use myrtio_pixel_core::ws::WsError;

pub use connection::HttpConnection;
pub use server::{HttpHandler, HttpServer};
pub use websocket::WebSocketSession;

#[derive(Debug)]
pub enum HttpError {
    Accept,
    Read,
    Closed,
    Parse,
    HeadTooLarge,
    FormatHeaders,
    NoSubscriber,
    /// A WebSocket peer did not answer a ping
    PeerTimeout,
    WebSocket(WsError),
}

impl From<core::fmt::Error> for HttpError {
    fn from(_error: core::fmt::Error) -> Self {
        HttpError::FormatHeaders
    }
}

impl From<embassy_net::tcp::Error> for HttpError {
    fn from(err: embassy_net::tcp::Error) -> Self {
        match err {
            embassy_net::tcp::Error::ConnectionReset => HttpError::Closed,
        }
    }
}

impl From<WsError> for HttpError {
    fn from(err: WsError) -> Self {
        HttpError::WebSocket(err)
    }
}

pub type HttpResult = Result<(), HttpError>;
