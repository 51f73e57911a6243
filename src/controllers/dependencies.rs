use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use myrtio_pixel_core::{ChannelFanout, ControlServer, PeerChannel, SharedDeviceState};

use super::ControlHttpController;
use crate::infrastructure::config::{self, FANOUT_DEPTH, SERVER_WORKERS, WEBSOCKET_SESSIONS};
use crate::infrastructure::services::AssetStore;

pub type PixelChannel = PeerChannel<CriticalSectionRawMutex, FANOUT_DEPTH, SERVER_WORKERS>;
pub type PixelFanout = ChannelFanout<'static, CriticalSectionRawMutex, FANOUT_DEPTH, SERVER_WORKERS>;
pub type PixelControlServer = ControlServer<'static, CriticalSectionRawMutex, PixelFanout>;

/// Color and mode shared by the render task and the server workers
pub static DEVICE_STATE: SharedDeviceState =
    SharedDeviceState::with_timeout(config::RENDER.lock_timeout);

pub(crate) static PEER_CHANNEL: PixelChannel = PeerChannel::new();

/// Static files, filled once at boot
pub static ASSETS: AssetStore = AssetStore::new();

/// Request handler shared by every server worker
pub static CONTROLLER: ControlHttpController = ControlHttpController::new(
    ControlServer::with_max_sessions(
        &DEVICE_STATE,
        ChannelFanout::new(&PEER_CHANNEL),
        WEBSOCKET_SESSIONS,
    ),
    &PEER_CHANNEL,
    &ASSETS,
);
