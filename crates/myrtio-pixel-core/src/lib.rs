#![cfg_attr(not(test), no_std)]

//! Pixel controller core
//!
//! Hardware independent part of the pixel firmware:
//! - `color` - four channel color and RGB <-> HSB conversion
//! - `state` - device state shared between render and network tasks
//! - `render` - animation state machine driving a [`PixelDriver`]
//! - `control` - `/update` form parsing and status lines
//! - `server` - event dispatch for the HTTP/WebSocket control plane
//! - `fanout` - text frame broadcast to WebSocket peers
//! - `http`, `ws` - protocol helpers for the transport
//! - `storage` - flash partition access and the static asset bundle

pub mod color;
pub mod control;
pub mod fanout;
pub mod http;
pub mod render;
pub mod server;
pub mod state;
pub mod storage;
pub mod ws;

pub use color::{Color, hsb_to_rgb, rgb_to_hsb};
pub use control::ControlUpdate;
pub use fanout::{ChannelFanout, Fanout, PeerChannel, PeerFrame};
pub use render::{Animator, FadeRamp, OutputError, PixelBuffer, PixelDriver, RenderLoop, RenderTimings};
pub use server::{ControlServer, PeerId, Reply, Request, ServerEvent};
pub use state::{AnimationMode, DeviceState, SharedDeviceState};
pub use storage::{
    AlignedReads, AssetBundle, AssetEntry, Partition, StorageError, StorageGeometry,
    StorageService,
};
