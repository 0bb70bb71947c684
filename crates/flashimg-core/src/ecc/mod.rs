//! ECC placement for NAND out-of-band areas
//!
//! Each supported NAND page size has a fixed OOB size and a fixed list of
//! OOB byte offsets that receive the ECC bytes. One ECC group of 3 bytes is
//! produced per 256-byte span of the page, and group `n` lands at
//! `ecc_offsets[n * 3..n * 3 + 3]`. All other OOB bytes stay erased.

pub mod hamming;

use crate::error::{Error, Result};

pub use hamming::{ECC_BYTES, ECC_SPAN};

/// ECC placement for one NAND page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EccLayout {
    /// Page size in bytes
    pub page_size: u32,
    /// OOB size in bytes
    pub oob_size: u32,
    /// OOB byte offsets holding ECC bytes, in group order
    pub ecc_offsets: &'static [u8],
}

/// Small page NAND with 256-byte pages
pub const ECC_LAYOUT_256: EccLayout = EccLayout {
    page_size: 256,
    oob_size: 8,
    ecc_offsets: &[0, 1, 2],
};

/// Small page NAND with 512-byte pages
pub const ECC_LAYOUT_512: EccLayout = EccLayout {
    page_size: 512,
    oob_size: 16,
    ecc_offsets: &[0, 1, 2, 3, 6, 7],
};

/// Large page NAND with 2048-byte pages
pub const ECC_LAYOUT_2048: EccLayout = EccLayout {
    page_size: 2048,
    oob_size: 64,
    ecc_offsets: &[
        40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61,
        62, 63,
    ],
};

/// Every supported placement, keyed by page size
pub const ECC_LAYOUTS: &[EccLayout] = &[ECC_LAYOUT_256, ECC_LAYOUT_512, ECC_LAYOUT_2048];

impl EccLayout {
    /// Look up the placement for a page size
    pub fn for_page_size(page_size: u32) -> Result<&'static EccLayout> {
        ECC_LAYOUTS
            .iter()
            .find(|layout| layout.page_size == page_size)
            .ok_or(Error::UnsupportedGeometry(page_size))
    }

    /// Number of ECC bytes per page
    pub fn ecc_bytes(&self) -> usize {
        self.ecc_offsets.len()
    }

    /// Build the OOB area for one page of data
    ///
    /// `page` must be exactly `page_size` bytes; callers pad short pages
    /// with `0xFF` beforehand.
    pub fn build_oob(&self, page: &[u8]) -> Vec<u8> {
        debug_assert_eq!(page.len(), self.page_size as usize);

        let mut oob = vec![0xFF; self.oob_size as usize];
        for (group, span) in page.chunks_exact(ECC_SPAN).enumerate() {
            let Ok(span) = <&[u8; ECC_SPAN]>::try_from(span) else {
                continue;
            };
            let code = hamming::calculate(span);
            let offsets = &self.ecc_offsets[group * ECC_BYTES..(group + 1) * ECC_BYTES];
            for (&offset, byte) in offsets.iter().zip(code) {
                oob[offset as usize] = byte;
            }
        }
        oob
    }
}
