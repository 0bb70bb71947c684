//! In-memory flash image
//!
//! The whole image lives in memory for the duration of a run. It starts out
//! erased (`0xFF`), gets overlaid with the current contents of the image
//! file, is modified by partition writes, and is written back in full at the
//! very end. The file on disk is never touched before that final save.
//!
//! Every access is bounds checked up front: an access that would cross the
//! end of the buffer is rejected as a whole and leaves the buffer unchanged.

use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::FlashGeometry;
use crate::translate::{self, PhysicalRegion};

/// Value of an erased flash byte
pub const ERASED: u8 = 0xFF;

/// Flash image buffer
///
/// Not safe for concurrent mutation; a single owner holds it for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
}

impl ImageBuffer {
    /// Allocate an erased image for `requested_size` logical bytes
    ///
    /// For NAND the buffer is inflated by one OOB area per whole page.
    pub fn allocate(requested_size: u64, geometry: &FlashGeometry) -> Result<Self> {
        let size = translate::physical_size(geometry, requested_size)?;
        Self::erased(size)
    }

    /// Allocate an erased image of exactly `size` physical bytes
    pub fn erased(size: u64) -> Result<Self> {
        if size == 0 {
            return Err(Error::ZeroSizeImage);
        }
        let len = usize::try_from(size)
            .map_err(|_| Error::Config(format!("image size {} does not fit in memory", size)))?;
        Ok(Self {
            bytes: vec![ERASED; len],
        })
    }

    /// Build an image from existing contents
    ///
    /// With an explicit `requested_size` (logical bytes) the image is
    /// allocated as in [`ImageBuffer::allocate`] and the first
    /// `min(existing.len(), size)` bytes are copied in. Without one, the
    /// existing contents are taken as a complete physical image.
    pub fn with_contents(
        requested_size: Option<u64>,
        existing: &[u8],
        geometry: &FlashGeometry,
    ) -> Result<Self> {
        let mut image = match requested_size {
            Some(size) => Self::allocate(size, geometry)?,
            None => Self::erased(existing.len() as u64)?,
        };
        let len = existing.len().min(image.bytes.len());
        image.bytes[..len].copy_from_slice(&existing[..len]);
        Ok(image)
    }

    /// Load the image file at `path`, or start from an erased image if absent
    pub fn open(
        path: impl AsRef<Path>,
        requested_size: Option<u64>,
        geometry: &FlashGeometry,
    ) -> Result<Self> {
        let path = path.as_ref();
        let existing = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Image file {} does not exist yet", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(Error::ImageIo {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        let image = Self::with_contents(requested_size, &existing, geometry)?;
        info!(
            "Image {}: {} bytes ({} bytes from existing file)",
            path.display(),
            image.len(),
            existing.len().min(image.len())
        );
        Ok(image)
    }

    /// Truncate the file at `path` and write the whole image to it
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.bytes).map_err(|e| Error::ImageIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }

    /// Size of the image in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image is empty (never true for an allocated image)
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of the image in bytes, as u64
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whole image contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Check that `length` bytes at `offset` lie inside the image
    pub fn check_range(&self, offset: u64, length: u64) -> Result<Range<usize>> {
        let out_of_bounds = || Error::OutOfBounds {
            offset,
            length,
            size: self.size(),
        };
        let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
        if end > self.size() {
            return Err(out_of_bounds());
        }
        // Both bounds are <= len(), so they fit in usize
        Ok(offset as usize..end as usize)
    }

    /// Check that a whole partition region lies inside the image
    pub fn check_region(&self, region: &PhysicalRegion) -> Result<Range<usize>> {
        self.check_range(region.physical_offset, region.physical_length)
    }

    /// Reset `length` bytes at `offset` to the erased state
    pub fn erase(&mut self, offset: u64, length: u64) -> Result<()> {
        let range = self.check_range(offset, length)?;
        self.bytes[range].fill(ERASED);
        Ok(())
    }

    /// Borrow `length` bytes at `offset`
    pub fn read_slice(&self, offset: u64, length: u64) -> Result<&[u8]> {
        let range = self.check_range(offset, length)?;
        Ok(&self.bytes[range])
    }

    /// Copy `data` into the image at `offset`
    pub fn write_slice(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let range = self.check_range(offset, data.len() as u64)?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_nand_inflates() {
        let geometry = FlashGeometry::nand(512).unwrap();
        let image = ImageBuffer::allocate(4096, &geometry).unwrap();
        assert_eq!(image.len(), 4096 + 8 * 16);
        assert!(image.as_bytes().iter().all(|&b| b == ERASED));
    }

    #[test]
    fn test_allocate_nor_unchanged() {
        let geometry = FlashGeometry::nor(512).unwrap();
        let image = ImageBuffer::allocate(4096, &geometry).unwrap();
        assert_eq!(image.len(), 4096);
    }

    #[test]
    fn test_zero_size() {
        let geometry = FlashGeometry::nor(512).unwrap();
        assert!(matches!(
            ImageBuffer::allocate(0, &geometry),
            Err(Error::ZeroSizeImage)
        ));
        assert!(matches!(
            ImageBuffer::with_contents(None, &[], &geometry),
            Err(Error::ZeroSizeImage)
        ));
    }

    #[test]
    fn test_with_contents_overlay() {
        let geometry = FlashGeometry::nor(512).unwrap();

        // Existing file shorter than the requested image
        let image = ImageBuffer::with_contents(Some(8), &[1, 2, 3], &geometry).unwrap();
        assert_eq!(image.as_bytes(), &[1, 2, 3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);

        // Existing file longer than the requested image
        let image = ImageBuffer::with_contents(Some(2), &[1, 2, 3], &geometry).unwrap();
        assert_eq!(image.as_bytes(), &[1, 2]);

        // Size inferred from the existing file
        let image = ImageBuffer::with_contents(None, &[1, 2, 3], &geometry).unwrap();
        assert_eq!(image.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_inferred_size_is_not_inflated() {
        let geometry = FlashGeometry::nand(512).unwrap();
        let existing = vec![0u8; 1056];
        let image = ImageBuffer::with_contents(None, &existing, &geometry).unwrap();
        assert_eq!(image.len(), 1056);
    }

    #[test]
    fn test_bounds_checked_access() {
        let geometry = FlashGeometry::nor(512).unwrap();
        let mut image = ImageBuffer::allocate(16, &geometry).unwrap();

        image.write_slice(4, &[0xAA; 4]).unwrap();
        assert_eq!(image.read_slice(4, 4).unwrap(), &[0xAA; 4]);

        let before = image.clone();
        assert!(matches!(
            image.write_slice(14, &[0; 4]),
            Err(Error::OutOfBounds {
                offset: 14,
                length: 4,
                size: 16
            })
        ));
        assert!(image.erase(8, 9).is_err());
        assert!(image.read_slice(u64::MAX, 2).is_err());
        assert_eq!(image, before);

        image.erase(0, 16).unwrap();
        assert!(image.as_bytes().iter().all(|&b| b == ERASED));
    }

    #[test]
    fn test_open_missing_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flash.img");
        let geometry = FlashGeometry::nor(512).unwrap();

        assert!(matches!(
            ImageBuffer::open(&path, None, &geometry),
            Err(Error::ZeroSizeImage)
        ));
        assert!(!path.exists());

        let mut image = ImageBuffer::open(&path, Some(32), &geometry).unwrap();
        image.write_slice(0, b"flash").unwrap();
        image.save(&path).unwrap();

        let reopened = ImageBuffer::open(&path, None, &geometry).unwrap();
        assert_eq!(reopened, image);
    }
}
