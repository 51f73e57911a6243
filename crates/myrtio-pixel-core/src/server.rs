//! Control server
//!
//! The transport turns socket activity into [`ServerEvent`]s and carries
//! out the [`Reply`] returned by [`ControlServer::dispatch`]. Dispatch is
//! the only place that mutates the shared device state from the network
//! side and the only place that decides what gets broadcast.

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::{self, raw::RawMutex};
use heapless::String;
use log::{debug, info, warn};

use crate::control::ControlUpdate;
use crate::fanout::Fanout;
use crate::http::{HttpMethod, RequestHead};
use crate::state::SharedDeviceState;
use crate::ws::{self, AcceptKey};

/// Control endpoint
pub const UPDATE_PATH: &str = "/update";

/// Index file served for `/`
pub const INDEX_PATH: &str = "/index.html";

/// Frame broadcast when a WebSocket peer completes its handshake
pub const JOIN_ANNOUNCEMENT: &str = "++ joined";

/// Longest static path the server resolves
pub const MAX_PATH_LENGTH: usize = 64;

/// Peer slots the session table can track
pub const MAX_PEERS: u8 = 32;

/// Connection slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerId(pub u8);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A complete HTTP request
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub head: RequestHead<'a>,
    pub body: &'a [u8],
}

/// Network events, in the order the transport observes them
#[derive(Debug, Clone, Copy)]
pub enum ServerEvent<'a> {
    /// A connection was accepted on a peer slot
    Accept { peer: PeerId },
    /// A full HTTP request was read
    Request { peer: PeerId, request: Request<'a> },
    /// The 101 response was sent, the connection is now a WebSocket peer
    HandshakeDone { peer: PeerId },
    /// A text frame arrived from a WebSocket peer
    Frame { peer: PeerId, payload: &'a [u8] },
    /// The connection is gone
    Close { peer: PeerId },
}

/// What the transport has to do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Nothing to send
    None,
    /// `204 No Content`
    NoContent,
    /// `101 Switching Protocols` with the accept key
    Upgrade(AcceptKey),
    /// Serve a file from the static asset store
    Static(String<MAX_PATH_LENGTH>),
    /// `404 Not Found`
    NotFound,
    /// `503 Service Unavailable`, no WebSocket session slot is left
    Unavailable,
}

/// Control plane dispatcher
pub struct ControlServer<'a, M: RawMutex, F: Fanout> {
    state: &'a SharedDeviceState<M>,
    fanout: F,
    /// Bit per peer slot holding a WebSocket session
    sessions: blocking_mutex::Mutex<M, Cell<u32>>,
    max_sessions: u8,
}

impl<'a, M: RawMutex, F: Fanout> ControlServer<'a, M, F> {
    pub const fn new(state: &'a SharedDeviceState<M>, fanout: F) -> Self {
        Self::with_max_sessions(state, fanout, MAX_PEERS)
    }

    /// Create a server that refuses WebSocket upgrades once
    /// `max_sessions` peers hold a session.
    pub const fn with_max_sessions(
        state: &'a SharedDeviceState<M>,
        fanout: F,
        max_sessions: u8,
    ) -> Self {
        Self {
            state,
            fanout,
            sessions: blocking_mutex::Mutex::new(Cell::new(0)),
            max_sessions,
        }
    }

    /// Number of peers holding a WebSocket session
    pub fn session_count(&self) -> u32 {
        self.sessions.lock(|sessions| sessions.get().count_ones())
    }

    /// Handle one event
    pub async fn dispatch(&self, event: ServerEvent<'_>) -> Reply {
        match event {
            ServerEvent::Accept { peer } => {
                info!("server: peer {} connected", peer);
                Reply::None
            }
            ServerEvent::Request { peer, request } => self.handle_request(peer, &request).await,
            ServerEvent::HandshakeDone { peer } => {
                info!("server: peer {} joined", peer);
                self.fanout.broadcast(JOIN_ANNOUNCEMENT);
                Reply::None
            }
            ServerEvent::Frame { peer, payload } => {
                match core::str::from_utf8(payload) {
                    Ok(text) => self.fanout.broadcast(text),
                    Err(_) => warn!("server: peer {} sent invalid utf-8", peer),
                }
                Reply::None
            }
            ServerEvent::Close { peer } => {
                info!("server: peer {} closed", peer);
                self.release_session(peer);
                Reply::None
            }
        }
    }

    async fn handle_request(&self, peer: PeerId, request: &Request<'_>) -> Reply {
        let head = &request.head;
        let path = head.route_path();
        debug!("server: peer {} {:?} {}", peer, head.method, head.path);

        match (head.method, path) {
            (HttpMethod::Post, UPDATE_PATH) => {
                self.apply_update(request.body).await;
                Reply::NoContent
            }
            (HttpMethod::Get, _) => match head.websocket_key {
                Some(key) if self.reserve_session(peer) => Reply::Upgrade(ws::accept_key(key)),
                Some(_) => {
                    warn!("server: peer {} upgrade refused, no session slot left", peer);
                    Reply::Unavailable
                }
                None => static_path(path),
            },
            (HttpMethod::Head, _) => static_path(path),
            _ => Reply::NotFound,
        }
    }

    /// Claim a session slot for `peer`, `false` if none is left
    fn reserve_session(&self, peer: PeerId) -> bool {
        let Some(bit) = session_bit(peer) else {
            return false;
        };
        self.sessions.lock(|sessions| {
            let active = sessions.get();
            if active & bit != 0 {
                return true;
            }
            if active.count_ones() >= u32::from(self.max_sessions) {
                return false;
            }
            sessions.set(active | bit);
            true
        })
    }

    fn release_session(&self, peer: PeerId) {
        if let Some(bit) = session_bit(peer) {
            self.sessions
                .lock(|sessions| sessions.set(sessions.get() & !bit));
        }
    }

    async fn apply_update(&self, body: &[u8]) {
        let update = ControlUpdate::from_form(body);
        info!(
            "server: update color {:?} mode {:?}",
            update.color, update.mode
        );

        if self.state.write(update.color, update.mode).await {
            self.fanout.broadcast(&update.status_line());
        }
    }
}

fn session_bit(peer: PeerId) -> Option<u32> {
    1u32.checked_shl(u32::from(peer.0))
}

/// Resolve a request path to a static asset path
fn static_path(path: &str) -> Reply {
    let path = if path == "/" { INDEX_PATH } else { path };
    if !path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
        return Reply::NotFound;
    }
    match String::try_from(path) {
        Ok(path) => Reply::Static(path),
        Err(()) => Reply::NotFound,
    }
}
