//! flashimg-core - Core library for building raw flash images
//!
//! This crate lays partitions out inside a flat flash image and copies
//! payload files in and out of them. Two kinds of flash are supported:
//!
//! - **NOR** - the image is a contiguous linear space
//! - **NAND** - every page is followed by an out-of-band (OOB) area that
//!   carries the Hamming ECC bytes of that page
//!
//! Partitions are described in *logical* space (payload bytes only). The
//! [`translate`] module maps them onto *physical* offsets inside the striped
//! image, and [`ops`] streams pages between payload files and the
//! [`image::ImageBuffer`].
//!
//! # Example
//!
//! ```ignore
//! use flashimg_core::{geometry::FlashGeometry, image::ImageBuffer, layout::PartitionTable, ops};
//!
//! let geometry = FlashGeometry::nand(512)?;
//! let table = PartitionTable::from_file("partitions.txt")?;
//! let mut image = ImageBuffer::open("flash.img", Some(64 * 1024 * 1024), &geometry)?;
//!
//! ops::write_partition_file(&mut image, &table, &geometry, "kernel", "zImage".as_ref(), &mut ops::NoProgress)?;
//! image.save("flash.img")?;
//! ```
//!
//! # Ownership
//!
//! An [`image::ImageBuffer`] is not safe for concurrent mutation. A single
//! owner holds it for the whole run and every mutating operation takes
//! `&mut ImageBuffer`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod ecc;
pub mod error;
pub mod geometry;
pub mod image;
pub mod layout;
pub mod ops;
pub mod size;
pub mod translate;

pub use error::{Error, Result};
