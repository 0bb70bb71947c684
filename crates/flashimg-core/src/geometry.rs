//! Flash geometry
//!
//! The geometry is selected once at startup and passed by reference to
//! everything that needs to know how the image is striped.

use std::fmt;

use crate::ecc::EccLayout;
use crate::error::{Error, Result};

/// Default NOR chunk size used when streaming payload files
pub const DEFAULT_NOR_CHUNK: u32 = 512;

/// Largest accepted NOR chunk size; one chunk is buffered per write
pub const MAX_NOR_CHUNK: u32 = 1024 * 1024;

/// Kind of flash, as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashType {
    /// Paged flash with OOB areas
    #[default]
    Nand,
    /// Linear flash
    Nor,
}

/// Physical organisation of the flash image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashGeometry {
    /// Linear flash, streamed in chunks of `chunk_size` bytes
    Nor {
        /// Chunk size used when copying payloads
        chunk_size: u32,
    },
    /// Paged flash where each page is followed by an OOB area
    Nand(&'static EccLayout),
}

impl FlashGeometry {
    /// NOR geometry with the given chunk size
    pub fn nor(chunk_size: u32) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("NOR chunk size must be non-zero".into()));
        }
        if chunk_size > MAX_NOR_CHUNK {
            return Err(Error::Config(format!(
                "NOR chunk size {} exceeds the {} byte maximum",
                chunk_size, MAX_NOR_CHUNK
            )));
        }
        Ok(Self::Nor { chunk_size })
    }

    /// NAND geometry for a supported page size
    pub fn nand(page_size: u32) -> Result<Self> {
        EccLayout::for_page_size(page_size).map(Self::Nand)
    }

    /// Build a geometry from command line style parameters
    ///
    /// NAND requires a page size; NOR falls back to [`DEFAULT_NOR_CHUNK`].
    pub fn from_params(flash_type: FlashType, page_size: Option<u32>) -> Result<Self> {
        match flash_type {
            FlashType::Nand => {
                let page_size = page_size
                    .ok_or_else(|| Error::Config("page size is required for NAND".into()))?;
                Self::nand(page_size)
            }
            FlashType::Nor => Self::nor(page_size.unwrap_or(DEFAULT_NOR_CHUNK)),
        }
    }

    /// Payload bytes per page (or per chunk for NOR)
    pub fn page_size(&self) -> u32 {
        match self {
            Self::Nor { chunk_size } => *chunk_size,
            Self::Nand(layout) => layout.page_size,
        }
    }

    /// OOB bytes following each page (0 for NOR)
    pub fn oob_size(&self) -> u32 {
        match self {
            Self::Nor { .. } => 0,
            Self::Nand(layout) => layout.oob_size,
        }
    }

    /// Physical bytes occupied by one page and its OOB area
    pub fn stride(&self) -> u64 {
        u64::from(self.page_size()) + u64::from(self.oob_size())
    }

    /// ECC placement, if this geometry has OOB areas
    pub fn ecc_layout(&self) -> Option<&'static EccLayout> {
        match self {
            Self::Nor { .. } => None,
            Self::Nand(layout) => Some(layout),
        }
    }
}

impl fmt::Display for FlashGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nor { chunk_size } => write!(f, "NOR ({} byte chunks)", chunk_size),
            Self::Nand(layout) => write!(
                f,
                "NAND ({}+{} byte pages, {} ECC bytes)",
                layout.page_size,
                layout.oob_size,
                layout.ecc_bytes()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_params() {
        let nand = FlashGeometry::from_params(FlashType::Nand, Some(2048)).unwrap();
        assert_eq!(nand.page_size(), 2048);
        assert_eq!(nand.oob_size(), 64);
        assert_eq!(nand.stride(), 2112);

        let nor = FlashGeometry::from_params(FlashType::Nor, None).unwrap();
        assert_eq!(nor.page_size(), DEFAULT_NOR_CHUNK);
        assert_eq!(nor.oob_size(), 0);
        assert!(nor.ecc_layout().is_none());
    }

    #[test]
    fn test_missing_or_bad_page_size() {
        assert!(matches!(
            FlashGeometry::from_params(FlashType::Nand, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            FlashGeometry::from_params(FlashType::Nand, Some(1024)),
            Err(Error::UnsupportedGeometry(1024))
        ));
        assert!(FlashGeometry::nor(0).is_err());
    }

    #[test]
    fn test_nor_chunk_limit() {
        assert!(FlashGeometry::nor(MAX_NOR_CHUNK).is_ok());
        assert!(matches!(
            FlashGeometry::from_params(FlashType::Nor, Some(4_000_000_000)),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_display() {
        let nand = FlashGeometry::nand(512).unwrap();
        assert_eq!(nand.to_string(), "NAND (512+16 byte pages, 6 ECC bytes)");
    }
}
