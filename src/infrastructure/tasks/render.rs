use esp_hal::system::software_reset;
use log::error;

use myrtio_pixel_core::{RenderLoop, SharedDeviceState};

use crate::infrastructure::config;
use crate::infrastructure::drivers::EspLedDriver;

/// Drive the LED strip from the shared device state.
///
/// An output failure leaves the strip in an unknown state, the device
/// restarts.
#[embassy_executor::task]
pub async fn render_task(state: &'static SharedDeviceState, driver: EspLedDriver<'static>) {
    let mut render = RenderLoop::new(state, driver, config::RENDER.random_seed);
    let err = render.run().await;
    error!("render: output failed with {:?}, restarting", err);
    software_reset();
}
