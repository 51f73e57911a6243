//! Flash access for the asset partition.

use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};
use esp_storage::FlashStorage;
use log::warn;

use myrtio_pixel_core::{StorageError, StorageGeometry, StorageService};

use crate::infrastructure::config;

/// Whole SPI flash as a [`StorageService`].
///
/// Reads must be word aligned in address and length, wrap it in
/// [`myrtio_pixel_core::AlignedReads`] for byte granular access.
///
/// Erase blocks and pages follow the data partition layout, both are
/// multiples of the hardware sector.
pub struct EspFlash {
    flash: FlashStorage<'static>,
}

impl EspFlash {
    pub fn new(flash: FlashStorage<'static>) -> Self {
        Self { flash }
    }
}

impl StorageService for EspFlash {
    #[allow(clippy::cast_possible_truncation)]
    fn geometry(&self) -> StorageGeometry {
        StorageGeometry {
            size: self.flash.capacity() as u32,
            erase_block_size: config::DATA.erase_block_size,
            page_size: config::DATA.page_size,
        }
    }

    async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), StorageError> {
        self.flash.read(address, buffer).map_err(|e| {
            warn!("flash: read at {:#x} failed: {:?}", address, e);
            StorageError::DriverError
        })
    }

    async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StorageError> {
        self.flash.write(address, data).map_err(|e| {
            warn!("flash: write at {:#x} failed: {:?}", address, e);
            StorageError::DriverError
        })
    }

    async fn erase(&mut self, address: u32, length: u32) -> Result<(), StorageError> {
        let end = address.checked_add(length).ok_or(StorageError::OutOfBounds)?;
        self.flash.erase(address, end).map_err(|e| {
            warn!("flash: erase {:#x}..{:#x} failed: {:?}", address, end, e);
            StorageError::DriverError
        })
    }
}
