//! Static files from the asset partition.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use esp_storage::FlashStorage;
use log::{info, warn};

use myrtio_pixel_core::{AlignedReads, AssetBundle, AssetEntry, Partition, StorageError};

use crate::infrastructure::config;
use crate::infrastructure::drivers::EspFlash;

type FlashBundle = AssetBundle<Partition<AlignedReads<EspFlash>>>;

/// Asset bundle shared by the server workers.
///
/// Empty when the partition holds no valid bundle.
pub struct AssetStore {
    inner: Mutex<CriticalSectionRawMutex, Option<FlashBundle>>,
}

impl AssetStore {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Find a file by path
    pub async fn find(&self, path: &str) -> Option<AssetEntry> {
        let mut guard = self.inner.lock().await;
        let bundle = guard.as_mut()?;
        match bundle.find(path).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!("assets: lookup of {} failed: {:?}", path, e);
                None
            }
        }
    }

    /// Read the next chunk of `entry`, `0` at the end.
    ///
    /// The lock is released between chunks so slow clients do not stall
    /// other workers.
    pub async fn read(
        &self,
        entry: &AssetEntry,
        position: u32,
        buffer: &mut [u8],
    ) -> Result<usize, StorageError> {
        let mut guard = self.inner.lock().await;
        let bundle = guard.as_mut().ok_or(StorageError::InvalidData)?;
        bundle.read(entry, position, buffer).await
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Open the asset bundle on the data partition.
///
/// Leaves the store empty if the partition is missing or not a bundle.
pub async fn init_asset_store(store: &AssetStore, flash: FlashStorage<'static>) {
    let flash = AlignedReads::new(EspFlash::new(flash));
    let partition = match Partition::new(flash, config::DATA.offset, config::DATA.size) {
        Ok(partition) => partition,
        Err(e) => {
            warn!("assets: data partition unavailable: {:?}", e);
            return;
        }
    };
    match AssetBundle::open(partition).await {
        Ok(bundle) => {
            info!("assets: {} files", bundle.len());
            *store.inner.lock().await = Some(bundle);
        }
        Err(e) => warn!("assets: no bundle on data partition: {:?}", e),
    }
}
