mod flash_storage;
mod led_ws2812;
mod network;
mod random;

pub use flash_storage::EspFlash;
pub use led_ws2812::EspLedDriver;
pub use network::{NetworkError, init_network_stack, wait_for_connection};
