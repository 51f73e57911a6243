use embassy_net::{Stack, tcp::TcpSocket};
use log::{debug, error, warn};

use myrtio_pixel_core::PeerId;

use super::connection::HttpConnection;
use super::{HttpError, HttpResult};
use crate::infrastructure::config;

#[allow(async_fn_in_trait)]
pub trait HttpHandler {
    /// A client connected on `peer`
    async fn on_accept(&self, _peer: PeerId) {}

    async fn handle_request(&self, peer: PeerId, conn: HttpConnection<'_>) -> HttpResult;

    /// The connection on `peer` is gone
    async fn on_close(&self, _peer: PeerId) {}
}

/// Accept loop of one peer slot
pub struct HttpServer<'a, T: HttpHandler> {
    handler: &'a T,
    peer: PeerId,
}

impl<'a, T: HttpHandler> HttpServer<'a, T> {
    pub fn new(handler: &'a T, peer: PeerId) -> Self {
        Self { handler, peer }
    }

    /// Serve connections one after another.
    ///
    /// Returns only if the socket cannot accept anymore.
    pub async fn listen_and_serve(
        &self,
        stack: Stack<'static>,
        port: u16,
        rx_buffer: &mut [u8],
        tx_buffer: &mut [u8],
    ) -> HttpResult {
        loop {
            let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
            socket.set_timeout(Some(config::SERVER.socket_timeout));

            if let Err(e) = socket.accept(port).await {
                error!("http_server: peer {} accept failed: {:?}", self.peer, e);
                return Err(HttpError::Accept);
            }
            debug!(
                "http_server: peer {} connection from {:?}",
                self.peer,
                socket.remote_endpoint()
            );
            self.handler.on_accept(self.peer).await;

            if let Err(e) = self.handle_connection(socket).await {
                warn!("http_server: peer {} connection error: {:?}", self.peer, e);
            }
            self.handler.on_close(self.peer).await;
        }
    }

    async fn handle_connection(&self, socket: TcpSocket<'_>) -> HttpResult {
        let connection = HttpConnection::from_socket(socket).await?;

        self.handler.handle_request(self.peer, connection).await
    }
}
