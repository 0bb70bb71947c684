//! Logical to physical address translation
//!
//! Partitions are described in logical space, which counts payload bytes
//! only. On NAND every page in the image is followed by its OOB area, so a
//! logical offset is shifted by one OOB area per whole page before it:
//!
//! ```text
//! logical:   | page 0 | page 1 | page 2 |
//! physical:  | page 0 |oob| page 1 |oob| page 2 |oob|
//! ```
//!
//! On NOR the two spaces are identical.

use crate::error::{Error, Result};
use crate::geometry::FlashGeometry;

/// Location of a partition inside the image buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalRegion {
    /// Byte offset inside the image buffer
    pub physical_offset: u64,
    /// Number of pages (or NOR chunks) spanned by the partition
    pub page_count: u64,
    /// Bytes occupied inside the image buffer, OOB areas included
    pub physical_length: u64,
}

impl PhysicalRegion {
    /// End offset (exclusive) inside the image buffer
    pub fn end(&self) -> Result<u64> {
        self.physical_offset
            .checked_add(self.physical_length)
            .ok_or(Error::OutOfBounds {
                offset: self.physical_offset,
                length: self.physical_length,
                size: u64::MAX,
            })
    }

    /// Whether the region fits in an image of `size` bytes
    pub fn fits(&self, size: u64) -> bool {
        self.end().is_ok_and(|end| end <= size)
    }
}

/// Map a logical partition onto the image buffer
pub fn translate(
    geometry: &FlashGeometry,
    logical_offset: u64,
    logical_length: u64,
) -> Result<PhysicalRegion> {
    let page_size = u64::from(geometry.page_size());
    let page_count = logical_length.div_ceil(page_size);

    let overflow = || Error::OutOfBounds {
        offset: logical_offset,
        length: logical_length,
        size: u64::MAX,
    };

    match geometry {
        FlashGeometry::Nor { .. } => Ok(PhysicalRegion {
            physical_offset: logical_offset,
            page_count,
            physical_length: logical_length,
        }),
        FlashGeometry::Nand(_) => {
            let oob_size = u64::from(geometry.oob_size());
            let physical_offset = (logical_offset / page_size)
                .checked_mul(oob_size)
                .and_then(|gap| logical_offset.checked_add(gap))
                .ok_or_else(overflow)?;
            let physical_length = page_count
                .checked_mul(geometry.stride())
                .ok_or_else(overflow)?;
            Ok(PhysicalRegion {
                physical_offset,
                page_count,
                physical_length,
            })
        }
    }
}

/// Physical size of an image holding `logical_size` payload bytes
///
/// NAND images reserve one OOB area per whole page.
pub fn physical_size(geometry: &FlashGeometry, logical_size: u64) -> Result<u64> {
    let page_size = u64::from(geometry.page_size());
    let oob_size = u64::from(geometry.oob_size());
    (logical_size / page_size)
        .checked_mul(oob_size)
        .and_then(|gap| logical_size.checked_add(gap))
        .ok_or(Error::OutOfBounds {
            offset: 0,
            length: logical_size,
            size: u64::MAX,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nand512() -> FlashGeometry {
        FlashGeometry::nand(512).unwrap()
    }

    #[test]
    fn test_nand_first_page() {
        let region = translate(&nand512(), 0, 512).unwrap();
        assert_eq!(region.physical_offset, 0);
        assert_eq!(region.page_count, 1);
        assert_eq!(region.physical_length, 528);
    }

    #[test]
    fn test_nand_oob_gap_shift() {
        let region = translate(&nand512(), 512, 512).unwrap();
        assert_eq!(region.physical_offset, 528);

        let region = translate(&nand512(), 0x20000, 0x1000).unwrap();
        assert_eq!(region.physical_offset, 0x20000 + 256 * 16);
        assert_eq!(region.page_count, 8);
        assert_eq!(region.physical_length, 8 * 528);
    }

    #[test]
    fn test_nand_partial_page_rounds_up() {
        let region = translate(&nand512(), 0, 513).unwrap();
        assert_eq!(region.page_count, 2);
        assert_eq!(region.physical_length, 2 * 528);

        let region = translate(&nand512(), 0, 0).unwrap();
        assert_eq!(region.page_count, 0);
        assert_eq!(region.physical_length, 0);
    }

    #[test]
    fn test_nand_large_page() {
        let geometry = FlashGeometry::nand(2048).unwrap();
        let region = translate(&geometry, 4096, 2048).unwrap();
        assert_eq!(region.physical_offset, 4096 + 2 * 64);
        assert_eq!(region.physical_length, 2112);
    }

    #[test]
    fn test_nor_identity() {
        let geometry = FlashGeometry::nor(512).unwrap();
        let region = translate(&geometry, 1000, 1000).unwrap();
        assert_eq!(region.physical_offset, 1000);
        assert_eq!(region.physical_length, 1000);
        assert_eq!(region.page_count, 2);
    }

    #[test]
    fn test_overflow_is_error() {
        assert!(matches!(
            translate(&nand512(), u64::MAX - 10, 1),
            Err(Error::OutOfBounds { .. })
        ));
        let region = PhysicalRegion {
            physical_offset: u64::MAX,
            page_count: 1,
            physical_length: 1,
        };
        assert!(!region.fits(u64::MAX));
    }

    #[test]
    fn test_physical_size() {
        assert_eq!(physical_size(&nand512(), 1024).unwrap(), 1056);
        assert_eq!(physical_size(&nand512(), 1000).unwrap(), 1016);
        let nor = FlashGeometry::nor(512).unwrap();
        assert_eq!(physical_size(&nor, 1000).unwrap(), 1000);
    }
}
