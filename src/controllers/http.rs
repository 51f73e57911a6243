//! HTTP side of the control plane
//!
//! Requests are turned into server events; the replies are written back
//! as HTTP responses or continue as a WebSocket session.

use log::{debug, warn};

use myrtio_pixel_core::http::{ContentHeaders, ContentType, HttpMethod, ResponseHeaders};
use myrtio_pixel_core::server::INDEX_PATH;
use myrtio_pixel_core::{AssetEntry, PeerId, Reply, Request, ServerEvent};

use super::dependencies::{PixelChannel, PixelControlServer};
use crate::infrastructure::services::AssetStore;
use crate::infrastructure::services::http::{
    HttpConnection, HttpError, HttpHandler, HttpResult, WebSocketSession,
};

/// Largest accepted request body
const MAX_BODY_SIZE: usize = 256;
const FILE_CHUNK_SIZE: usize = 512;

/// Served as `/index.html` when the asset partition has no bundle
const FALLBACK_INDEX: &[u8] = include_bytes!("../../assets/index.html");
const NOT_FOUND_BODY: &[u8] = b"Not Found";

pub struct ControlHttpController {
    server: PixelControlServer,
    channel: &'static PixelChannel,
    assets: &'static AssetStore,
}

impl ControlHttpController {
    pub const fn new(
        server: PixelControlServer,
        channel: &'static PixelChannel,
        assets: &'static AssetStore,
    ) -> Self {
        Self {
            server,
            channel,
            assets,
        }
    }

    async fn respond(&self, peer: PeerId, mut conn: HttpConnection<'_>) -> HttpResult {
        if conn.content_length() as usize > MAX_BODY_SIZE {
            warn!(
                "http: peer {} body of {} bytes rejected",
                peer,
                conn.content_length()
            );
            conn.write_headers(&ResponseHeaders::too_large()).await?;
            conn.close().await;
            return Ok(());
        }

        let mut body = [0u8; MAX_BODY_SIZE];
        let body_len = conn.read_body_into(&mut body).await?;
        let reply = {
            let head = conn.head()?;
            let request = Request {
                head,
                body: &body[..body_len],
            };
            self.server
                .dispatch(ServerEvent::Request { peer, request })
                .await
        };

        match reply {
            Reply::None => {}
            Reply::NoContent => {
                conn.write_headers(&ResponseHeaders::success_no_content())
                    .await?;
            }
            Reply::NotFound => write_not_found(&mut conn).await?,
            Reply::Unavailable => {
                conn.write_headers(&ResponseHeaders::unavailable()).await?;
            }
            Reply::Static(path) => {
                let head_only = conn.method() == HttpMethod::Head;
                self.serve_file(&mut conn, &path, head_only).await?;
            }
            Reply::Upgrade(key) => {
                conn.write_headers(&ResponseHeaders::switching_protocols(&key))
                    .await?;
                return self.upgrade(peer, conn).await;
            }
        }
        conn.close().await;
        Ok(())
    }

    async fn upgrade(&self, peer: PeerId, conn: HttpConnection<'_>) -> HttpResult {
        let subscriber = self
            .channel
            .subscriber()
            .map_err(|_| HttpError::NoSubscriber)?;
        let (socket, pending) = conn.into_parts();
        WebSocketSession::new(socket, subscriber, peer, &pending)?
            .run(&self.server)
            .await
    }

    async fn serve_file(
        &self,
        conn: &mut HttpConnection<'_>,
        path: &str,
        head_only: bool,
    ) -> HttpResult {
        let content_type = ContentType::from_path(path);
        let Some(entry) = self.assets.find(path).await else {
            if path == INDEX_PATH {
                debug!("http: serving built-in index");
                let headers = ResponseHeaders::success()
                    .with_content(ContentHeaders::new(content_type).with_length(FALLBACK_INDEX.len()));
                conn.write_headers(&headers).await?;
                if !head_only {
                    conn.write_body(FALLBACK_INDEX).await?;
                }
                return Ok(());
            }
            return write_not_found(conn).await;
        };

        let headers = ResponseHeaders::success()
            .with_content(ContentHeaders::new(content_type).with_length(entry.length as usize));
        conn.write_headers(&headers).await?;
        if !head_only {
            self.stream_file(conn, &entry).await?;
        }
        Ok(())
    }

    async fn stream_file(&self, conn: &mut HttpConnection<'_>, entry: &AssetEntry) -> HttpResult {
        let mut chunk = [0u8; FILE_CHUNK_SIZE];
        let mut position = 0u32;
        while position < entry.length {
            let n = match self.assets.read(entry, position, &mut chunk).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    // Headers are out, the client sees a short body
                    warn!("http: asset read failed at {}: {:?}", position, e);
                    return Err(HttpError::Read);
                }
            };
            conn.write_body(&chunk[..n]).await?;
            position += u32::try_from(n).map_err(|_| HttpError::Read)?;
        }
        Ok(())
    }
}

async fn write_not_found(conn: &mut HttpConnection<'_>) -> HttpResult {
    let headers = ResponseHeaders::not_found()
        .with_content(ContentHeaders::new(ContentType::TextPlain).with_length(NOT_FOUND_BODY.len()));
    conn.write_headers(&headers).await?;
    conn.write_body(NOT_FOUND_BODY).await
}

impl HttpHandler for ControlHttpController {
    async fn on_accept(&self, peer: PeerId) {
        self.server.dispatch(ServerEvent::Accept { peer }).await;
    }

    async fn handle_request(&self, peer: PeerId, conn: HttpConnection<'_>) -> HttpResult {
        self.respond(peer, conn).await
    }

    async fn on_close(&self, peer: PeerId) {
        self.server.dispatch(ServerEvent::Close { peer }).await;
    }
}
