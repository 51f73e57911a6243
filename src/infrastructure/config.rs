#![allow(clippy::unreadable_literal)]

use embassy_time::Duration;

pub(crate) struct WifiConfig {
    pub ssid: &'static str,
    pub password: &'static str,
}

pub struct DeviceConfig {
    pub name: &'static str,
    pub hostname: &'static str,
}

pub(crate) struct RenderConfig {
    pub random_seed: u64,
    pub lock_timeout: Duration,
}

pub(crate) struct ServerConfig {
    pub port: u16,
    pub socket_timeout: Duration,
    /// Silence after which an upgraded socket is dropped
    pub websocket_timeout: Duration,
    pub keep_alive: Duration,
    /// Ping period, a peer missing one pong is dropped
    pub ping_interval: Duration,
}

/// Data partition holding the static asset bundle
pub(crate) struct DataPartitionConfig {
    pub offset: u32,
    pub size: u32,
    pub erase_block_size: u32,
    pub page_size: u32,
}

pub struct FirmwareConfig {
    pub version: &'static str,
}

/// Number of pixels on the strip
pub const PIXEL_COUNT: usize = 7;

/// Server worker tasks, one peer slot each
pub const SERVER_WORKERS: usize = 4;

/// Concurrent WebSocket sessions, one worker is left for plain HTTP
pub const WEBSOCKET_SESSIONS: u8 = 3;

#[allow(clippy::cast_lossless)]
const _: () = assert!((WEBSOCKET_SESSIONS as usize) < SERVER_WORKERS);

/// Frames buffered per WebSocket peer before the oldest are dropped
pub const FANOUT_DEPTH: usize = 8;

pub(crate) const WIFI: WifiConfig = WifiConfig {
    ssid: env!("WIFI_SSID"),
    password: env!("WIFI_PASSWORD"),
};

pub const DEVICE: DeviceConfig = DeviceConfig {
    name: "MyrtIO Pixel",
    hostname: "myrtio-pixel",
};

pub(crate) const RENDER: RenderConfig = RenderConfig {
    random_seed: 0x5EED_0F_A1,
    lock_timeout: Duration::from_millis(20),
};

pub(crate) const SERVER: ServerConfig = ServerConfig {
    port: 80,
    socket_timeout: Duration::from_secs(30),
    websocket_timeout: Duration::from_secs(60),
    keep_alive: Duration::from_secs(15),
    ping_interval: Duration::from_secs(20),
};

// Matches the `assets` entry in partitions.csv
pub(crate) const DATA: DataPartitionConfig = DataPartitionConfig {
    offset: 0x31_0000,
    size: 0xE_0000,
    erase_block_size: 64 * 1024,
    page_size: 256,
};

pub const FIRMWARE: FirmwareConfig = FirmwareConfig {
    version: env!("BUILD_VERSION"),
};

#[macro_export]
macro_rules! led_gpio {
    ($p:expr) => {
        $p.GPIO25
    };
}
