//! Flash storage access and the static asset bundle
//!
//! Storage is an addressed region with read, write and erase-range
//! operations. [`Partition`] narrows a larger region to one partition,
//! [`AlignedReads`] lets word addressed flash serve byte granular reads and
//! [`AssetBundle`] looks up read-only files packed at the start of a region.

use log::{debug, warn};

/// Magic header of an asset bundle
const BUNDLE_MAGIC: u16 = 0xA55E;
/// Magic + entry count
const BUNDLE_HEADER_SIZE: u32 = 4;
/// Path field of a bundle entry, NUL padded
pub const BUNDLE_PATH_LENGTH: usize = 32;
/// Path + offset + length
const BUNDLE_ENTRY_SIZE: u32 = BUNDLE_PATH_LENGTH as u32 + 8;
/// Read granularity of word addressed flash
pub const READ_WORD_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The flash driver reported a failure
    DriverError,
    /// Access outside of the region
    OutOfBounds,
    /// Erase range not aligned to the erase block size
    Unaligned,
    InvalidMagicHeader,
    InvalidData,
}

/// Block and page layout of a storage region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageGeometry {
    /// Region size in bytes
    pub size: u32,
    /// Smallest erasable unit
    pub erase_block_size: u32,
    /// Logical page size
    pub page_size: u32,
}

impl StorageGeometry {
    /// Whether `length` bytes at `address` stay inside the region
    pub fn contains(&self, address: u32, length: u32) -> bool {
        address
            .checked_add(length)
            .is_some_and(|end| end <= self.size)
    }
}

/// Addressed byte storage with erase-range semantics
#[allow(async_fn_in_trait)]
pub trait StorageService {
    fn geometry(&self) -> StorageGeometry;
    async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), StorageError>;
    async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StorageError>;
    async fn erase(&mut self, address: u32, length: u32) -> Result<(), StorageError>;
}

fn len_u32(len: usize) -> Result<u32, StorageError> {
    u32::try_from(len).map_err(|_| StorageError::OutOfBounds)
}

/// Window over a larger storage, addressed from zero.
pub struct Partition<S: StorageService> {
    storage: S,
    offset: u32,
    size: u32,
}

impl<S: StorageService> Partition<S> {
    /// Create a partition of `size` bytes starting at `offset`.
    ///
    /// Fails if the window does not fit the underlying storage or does not
    /// start on an erase block boundary.
    pub fn new(storage: S, offset: u32, size: u32) -> Result<Self, StorageError> {
        let geometry = storage.geometry();
        if !geometry.contains(offset, size) {
            return Err(StorageError::OutOfBounds);
        }
        if offset % geometry.erase_block_size != 0 {
            return Err(StorageError::Unaligned);
        }
        Ok(Self {
            storage,
            offset,
            size,
        })
    }

    fn check(&self, address: u32, length: u32) -> Result<(), StorageError> {
        if self.geometry().contains(address, length) {
            Ok(())
        } else {
            Err(StorageError::OutOfBounds)
        }
    }
}

impl<S: StorageService> StorageService for Partition<S> {
    fn geometry(&self) -> StorageGeometry {
        StorageGeometry {
            size: self.size,
            ..self.storage.geometry()
        }
    }

    async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), StorageError> {
        self.check(address, len_u32(buffer.len())?)?;
        self.storage.read(self.offset + address, buffer).await
    }

    async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StorageError> {
        self.check(address, len_u32(data.len())?)?;
        self.storage.write(self.offset + address, data).await
    }

    async fn erase(&mut self, address: u32, length: u32) -> Result<(), StorageError> {
        self.check(address, length)?;
        let block = self.geometry().erase_block_size;
        if address % block != 0 || length % block != 0 {
            return Err(StorageError::Unaligned);
        }
        debug!("storage: erase {:#x}+{:#x}", address, length);
        self.storage.erase(self.offset + address, length).await
    }
}

/// Adapter for storages that only read whole words at word aligned
/// addresses.
///
/// Unaligned heads and tails are read through a one word scratch buffer,
/// the aligned middle goes straight into the caller's buffer. Writes and
/// erases are passed through.
pub struct AlignedReads<S: StorageService> {
    storage: S,
}

impl<S: StorageService> AlignedReads<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: StorageService> StorageService for AlignedReads<S> {
    fn geometry(&self) -> StorageGeometry {
        self.storage.geometry()
    }

    async fn read(&mut self, address: u32, buffer: &mut [u8]) -> Result<(), StorageError> {
        const WORD: usize = READ_WORD_SIZE as usize;
        let mut done = 0;
        while done < buffer.len() {
            let at = address
                .checked_add(len_u32(done)?)
                .ok_or(StorageError::OutOfBounds)?;
            let offset = at % READ_WORD_SIZE;
            let skip = offset as usize;
            let remaining = buffer.len() - done;

            if skip == 0 && remaining >= WORD {
                let n = remaining - remaining % WORD;
                self.storage.read(at, &mut buffer[done..done + n]).await?;
                done += n;
                continue;
            }

            let mut word = [0u8; WORD];
            self.storage.read(at - offset, &mut word).await?;
            let n = (WORD - skip).min(remaining);
            buffer[done..done + n].copy_from_slice(&word[skip..skip + n]);
            done += n;
        }
        Ok(())
    }

    async fn write(&mut self, address: u32, data: &[u8]) -> Result<(), StorageError> {
        self.storage.write(address, data).await
    }

    async fn erase(&mut self, address: u32, length: u32) -> Result<(), StorageError> {
        self.storage.erase(address, length).await
    }
}

/// File stored in an asset bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetEntry {
    /// Data offset from the start of the bundle
    pub offset: u32,
    pub length: u32,
}

/// Read-only file table packed at the start of a storage region.
///
/// Layout, little endian: `u16` magic, `u16` entry count, then per entry a
/// NUL padded path of [`BUNDLE_PATH_LENGTH`] bytes, `u32` data offset and
/// `u32` data length.
pub struct AssetBundle<S: StorageService> {
    storage: S,
    entries: u16,
}

impl<S: StorageService> AssetBundle<S> {
    /// Validate the bundle header
    pub async fn open(mut storage: S) -> Result<Self, StorageError> {
        let mut header = [0u8; BUNDLE_HEADER_SIZE as usize];
        storage.read(0, &mut header).await?;
        if u16::from_le_bytes([header[0], header[1]]) != BUNDLE_MAGIC {
            return Err(StorageError::InvalidMagicHeader);
        }
        let entries = u16::from_le_bytes([header[2], header[3]]);
        let table_end = BUNDLE_HEADER_SIZE + u32::from(entries) * BUNDLE_ENTRY_SIZE;
        if !storage.geometry().contains(0, table_end) {
            return Err(StorageError::InvalidData);
        }
        debug!("storage: asset bundle with {} entries", entries);
        Ok(Self { storage, entries })
    }

    /// Number of files in the bundle
    pub fn len(&self) -> usize {
        usize::from(self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Find a file by absolute path
    pub async fn find(&mut self, path: &str) -> Result<Option<AssetEntry>, StorageError> {
        if path.len() > BUNDLE_PATH_LENGTH {
            return Ok(None);
        }
        let mut raw = [0u8; BUNDLE_ENTRY_SIZE as usize];
        for index in 0..u32::from(self.entries) {
            let address = BUNDLE_HEADER_SIZE + index * BUNDLE_ENTRY_SIZE;
            self.storage.read(address, &mut raw).await?;

            let name = &raw[..BUNDLE_PATH_LENGTH];
            let name_len = name.iter().position(|&b| b == 0).unwrap_or(BUNDLE_PATH_LENGTH);
            if &name[..name_len] != path.as_bytes() {
                continue;
            }

            let field = |at: usize| u32::from_le_bytes([raw[at], raw[at + 1], raw[at + 2], raw[at + 3]]);
            let entry = AssetEntry {
                offset: field(BUNDLE_PATH_LENGTH),
                length: field(BUNDLE_PATH_LENGTH + 4),
            };
            let fits = entry
                .offset
                .checked_add(entry.length)
                .is_some_and(|end| end <= self.storage.geometry().size);
            if !fits {
                warn!("storage: asset {} points outside the bundle", path);
                return Err(StorageError::InvalidData);
            }
            return Ok(Some(entry));
        }
        Ok(None)
    }

    /// Read the part of `entry` starting at `position` into `buffer`.
    ///
    /// Returns the number of bytes read, `0` at the end of the file.
    pub async fn read(
        &mut self,
        entry: &AssetEntry,
        position: u32,
        buffer: &mut [u8],
    ) -> Result<usize, StorageError> {
        if position >= entry.length {
            return Ok(0);
        }
        let remaining = (entry.length - position) as usize;
        let n = remaining.min(buffer.len());
        self.storage
            .read(entry.offset + position, &mut buffer[..n])
            .await?;
        Ok(n)
    }
}
