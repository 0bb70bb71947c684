//! Error types for flashimg-core

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    /// Page size has no entry in the ECC placement table
    #[error("unsupported page size {0} (supported: 256, 512, 2048)")]
    UnsupportedGeometry(u32),

    /// Bad or missing configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// No explicit size was given and there is no existing image to size from
    #[error("image size is zero (no size given and no existing image file)")]
    ZeroSizeImage,

    // Partition table errors
    /// Malformed partition table record
    #[error("partition table line {line}: {message}")]
    PartitionTable {
        /// 1-based line number of the bad record (0 for whole-file errors)
        line: usize,
        /// What was wrong with the record
        message: String,
    },

    /// The same partition name appears twice in the table
    #[error("duplicate partition name '{0}'")]
    DuplicatePartition(String),

    /// Two partitions share physical bytes under the active geometry
    #[error("partitions '{first}' and '{second}' overlap in the image")]
    PartitionOverlap {
        /// Earlier partition in table order
        first: String,
        /// Later partition in table order
        second: String,
    },

    /// No partition with this name exists
    #[error("partition '{0}' not found")]
    PartitionNotFound(String),

    // Capacity errors
    /// Access would run past the end of the image
    #[error("access of {length:#x} bytes at {offset:#x} exceeds image size {size:#x}")]
    OutOfBounds {
        /// Physical start offset of the access
        offset: u64,
        /// Length of the access in bytes
        length: u64,
        /// Size of the image buffer
        size: u64,
    },

    /// Payload file does not fit in its partition
    #[error("file too big for partition '{partition}' ({size} bytes, capacity {capacity} bytes)")]
    FileTooBig {
        /// Target partition
        partition: String,
        /// Size of the payload file (or bytes seen so far when streaming)
        size: u64,
        /// Payload capacity of the partition
        capacity: u64,
    },

    // I/O errors
    /// Failure opening, reading or writing a partition payload file
    #[error("payload file {}: {source}", path.display())]
    PayloadIo {
        /// Payload file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failure reading or writing the image file itself
    #[error("image file {}: {source}", path.display())]
    ImageIo {
        /// Image file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Whether the run may continue with the next action after this error
    ///
    /// Only an unknown partition name is recoverable; everything else aborts
    /// the run before the image is written back.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PartitionNotFound(_))
    }

    /// Whether this error is raised before any image mutation can happen
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedGeometry(_)
                | Self::Config(_)
                | Self::ZeroSizeImage
                | Self::PartitionTable { .. }
                | Self::DuplicatePartition(_)
                | Self::PartitionOverlap { .. }
        )
    }
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
