use embassy_futures::select::{Either3, select3};
use embassy_net::tcp::TcpSocket;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::pubsub::Subscriber;
use embassy_time::Ticker;
use embedded_io_async::Write as _;
use log::{debug, info, warn};

use myrtio_pixel_core::fanout::{FRAME_CAPACITY, PeerFrame};
use myrtio_pixel_core::ws::{self, Opcode, WsError};
use myrtio_pixel_core::{ControlServer, Fanout, PeerId, ServerEvent};

use super::HttpError;
use crate::infrastructure::config;

/// Largest client frame, header included
const RX_FRAME_SIZE: usize = 512;
/// Largest server frame: 16 bit length header plus payload
const TX_FRAME_SIZE: usize = FRAME_CAPACITY + 4;

/// An upgraded connection exchanging text frames with one peer.
///
/// Incoming text frames go to the control server, frames published on the
/// fanout channel go out to the peer. The peer is pinged periodically and
/// dropped if a pong is still missing at the next ping.
pub struct WebSocketSession<'a, 's, M: RawMutex, const CAP: usize, const SUBS: usize> {
    socket: TcpSocket<'a>,
    subscriber: Subscriber<'s, M, PeerFrame, CAP, SUBS, 0>,
    peer: PeerId,
    rx: [u8; RX_FRAME_SIZE],
    filled: usize,
    ping: Ticker,
    awaiting_pong: bool,
}

impl<'a, 's, M: RawMutex, const CAP: usize, const SUBS: usize> WebSocketSession<'a, 's, M, CAP, SUBS> {
    /// Start a session on an upgraded socket.
    ///
    /// `pending` holds bytes that arrived together with the handshake.
    pub fn new(
        mut socket: TcpSocket<'a>,
        subscriber: Subscriber<'s, M, PeerFrame, CAP, SUBS, 0>,
        peer: PeerId,
        pending: &[u8],
    ) -> Result<Self, HttpError> {
        socket.set_timeout(Some(config::SERVER.websocket_timeout));
        socket.set_keep_alive(Some(config::SERVER.keep_alive));
        let mut rx = [0u8; RX_FRAME_SIZE];
        let filled = pending.len();
        rx.get_mut(..filled)
            .ok_or(WsError::TooLarge)?
            .copy_from_slice(pending);
        Ok(Self {
            socket,
            subscriber,
            peer,
            rx,
            filled,
            ping: Ticker::every(config::SERVER.ping_interval),
            awaiting_pong: false,
        })
    }

    /// Pump frames until the peer leaves or the connection fails
    pub async fn run<SM: RawMutex, F: Fanout>(
        mut self,
        server: &ControlServer<'_, SM, F>,
    ) -> Result<(), HttpError> {
        server
            .dispatch(ServerEvent::HandshakeDone { peer: self.peer })
            .await;

        let result = self.pump(server).await;
        self.socket.close();
        let _ = self.socket.flush().await;
        result
    }

    async fn pump<SM: RawMutex, F: Fanout>(
        &mut self,
        server: &ControlServer<'_, SM, F>,
    ) -> Result<(), HttpError> {
        loop {
            if !self.drain_frames(server).await? {
                info!("websocket: peer {} closed the session", self.peer);
                return Ok(());
            }

            let event = select3(
                self.socket.read(&mut self.rx[self.filled..]),
                self.subscriber.next_message_pure(),
                self.ping.next(),
            )
            .await;
            match event {
                Either3::First(Ok(0)) => return Ok(()),
                Either3::First(Ok(n)) => self.filled += n,
                Either3::First(Err(e)) => return Err(e.into()),
                Either3::Second(frame) => self.send(Opcode::Text, frame.as_bytes()).await?,
                Either3::Third(()) => {
                    if self.awaiting_pong {
                        warn!("websocket: peer {} missed a pong", self.peer);
                        return Err(HttpError::PeerTimeout);
                    }
                    self.send(Opcode::Ping, &[]).await?;
                    self.awaiting_pong = true;
                }
            }
        }
    }

    /// Handle every complete frame in the receive buffer.
    ///
    /// Returns `false` once the peer asked to close.
    async fn drain_frames<SM: RawMutex, F: Fanout>(
        &mut self,
        server: &ControlServer<'_, SM, F>,
    ) -> Result<bool, HttpError> {
        loop {
            let Some(frame) = ws::decode_frame(&mut self.rx[..self.filled])? else {
                if self.filled == self.rx.len() {
                    return Err(WsError::TooLarge.into());
                }
                return Ok(true);
            };

            let payload = frame.payload.clone();
            match frame.opcode {
                Opcode::Text if frame.fin => {
                    server
                        .dispatch(ServerEvent::Frame {
                            peer: self.peer,
                            payload: &self.rx[payload],
                        })
                        .await;
                }
                Opcode::Ping => {
                    let mut pong = [0u8; RX_FRAME_SIZE];
                    let len = payload.len();
                    pong[..len].copy_from_slice(&self.rx[payload]);
                    self.send(Opcode::Pong, &pong[..len]).await?;
                }
                Opcode::Pong => self.awaiting_pong = false,
                Opcode::Close => {
                    self.send(Opcode::Close, &[]).await?;
                    return Ok(false);
                }
                opcode => debug!("websocket: peer {} ignored {:?} frame", self.peer, opcode),
            }

            self.rx.copy_within(frame.consumed..self.filled, 0);
            self.filled -= frame.consumed;
        }
    }

    async fn send(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), HttpError> {
        let mut out = [0u8; TX_FRAME_SIZE];
        let n = ws::encode_frame(opcode, payload, &mut out)?;
        self.socket.write_all(&out[..n]).await?;
        self.socket.flush().await?;
        Ok(())
    }
}
