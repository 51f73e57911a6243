use static_cell::make_static;

use esp_hal::xtensa_lx::interrupt;
use esp_hal::{gpio::interconnect::PeripheralOutput, peripherals::RMT, rmt::Rmt, time::Rate};
use esp_hal_smartled::{SmartLedsAdapter, buffer_size, smart_led_buffer};
use smart_leds::SmartLedsWrite;

use myrtio_pixel_core::{OutputError, PixelBuffer, PixelDriver};

use crate::infrastructure::config::PIXEL_COUNT;

/// WS2812 strip driven by the RMT peripheral.
///
/// The four channel [`Color`](myrtio_pixel_core::Color) is folded to RGB
/// before transmission.
pub struct EspLedDriver<'a> {
    adapter: SmartLedsAdapter<'a, { buffer_size(PIXEL_COUNT) }>,
}

impl<'a> EspLedDriver<'a> {
    /// Create a new ESP LED driver
    ///
    /// # Arguments
    /// * `rmt` - RMT peripheral
    /// * `pin` - GPIO pin connected to the LED data line
    pub fn new<O>(rmt: RMT<'a>, pin: O) -> Result<Self, esp_hal::rmt::Error>
    where
        O: PeripheralOutput<'a>,
    {
        let rmt = Rmt::new(rmt, Rate::from_mhz(80))?;

        let rmt_buffer = make_static!(smart_led_buffer!(PIXEL_COUNT));
        let adapter = SmartLedsAdapter::new(rmt.channel0, pin, rmt_buffer);

        Ok(Self { adapter })
    }
}

impl PixelDriver<PIXEL_COUNT> for EspLedDriver<'_> {
    fn push(&mut self, pixels: PixelBuffer<PIXEL_COUNT>) -> Result<(), OutputError> {
        let mut result = Ok(());
        // RMT timing breaks if the transfer is interrupted
        interrupt::free(|| {
            result = self.adapter.write(pixels.iter().map(|color| color.to_rgb8()));
        });
        result.map_err(|_| OutputError::Transmit)
    }
}
