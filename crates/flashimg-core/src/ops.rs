//! Partition read/write operations
//!
//! Each action runs through the same steps:
//!
//! 1. **Locate** - find the partition by name and translate it to a
//!    physical region, rejecting regions that run past the image end
//! 2. **Validate** - (write) reject payloads larger than the partition
//! 3. **Erase** - (write) reset the whole physical region to `0xFF`
//! 4. **Stream** - copy page sized chunks between the payload and the
//!    image. Writes pad the last page with `0xFF` and, on NAND, fill the
//!    following OOB area with ECC bytes. Reads copy payload bytes verbatim
//!    and skip the OOB areas.
//!
//! Nothing is rolled back when an action fails half way; callers abort the
//! run and never save the image.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::FlashGeometry;
use crate::image::{ImageBuffer, ERASED};
use crate::layout::{Partition, PartitionTable};
use crate::translate::PhysicalRegion;

/// Direction of a partition action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Copy partition contents out of the image into a file
    Read,
    /// Copy a file into the partition
    Write,
}

/// One requested partition action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    /// Name of the target partition
    pub partition: String,
    /// Local payload file
    pub path: PathBuf,
    /// Read or write
    pub direction: Direction,
}

impl Action {
    /// Create a read action
    pub fn read(partition: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            partition: partition.into(),
            path: path.into(),
            direction: Direction::Read,
        }
    }

    /// Create a write action
    pub fn write(partition: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            partition: partition.into(),
            path: path.into(),
            direction: Direction::Write,
        }
    }
}

/// A partition resolved to its place in the image
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Partition table entry
    pub partition: &'a Partition,
    /// Physical location inside the image
    pub region: PhysicalRegion,
}

/// Summary of a completed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferStats {
    /// Partition name
    pub partition: String,
    /// Read or write
    pub direction: Direction,
    /// Pages (or NOR chunks) transferred
    pub pages: u64,
    /// Payload bytes transferred
    pub bytes: u64,
    /// Physical location of the partition
    pub region: PhysicalRegion,
}

impl fmt::Display for TransferStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (verb, preposition) = match self.direction {
            Direction::Read => ("Read", "from"),
            Direction::Write => ("Wrote", "to"),
        };
        write!(
            f,
            "{} {} page{} ({} bytes) {} partition {} (physical {:#x}..{:#x})",
            verb,
            self.pages,
            if self.pages == 1 { "" } else { "s" },
            self.bytes,
            preposition,
            self.partition,
            self.region.physical_offset,
            self.region.physical_offset.saturating_add(self.region.physical_length)
        )
    }
}

/// Callback for progress reporting during partition actions
pub trait TransferProgress {
    /// Called before the first page is transferred
    fn start(&mut self, partition: &Partition, direction: Direction, total_bytes: u64);

    /// Called after each page with the running byte count
    fn progress(&mut self, bytes_done: u64);

    /// Called when the action is complete
    fn complete(&mut self, stats: &TransferStats);
}

/// A no-op progress reporter
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn start(&mut self, _partition: &Partition, _direction: Direction, _total_bytes: u64) {}
    fn progress(&mut self, _bytes_done: u64) {}
    fn complete(&mut self, _stats: &TransferStats) {}
}

/// Find a partition and check that its physical region fits in the image
pub fn locate<'a>(
    image: &ImageBuffer,
    table: &'a PartitionTable,
    geometry: &FlashGeometry,
    name: &str,
) -> Result<Target<'a>> {
    let partition = table.get(name)?;
    let region = partition.physical(geometry)?;

    info!(
        "Partition {} found ({:#x} bytes @ {:#x}, physical {:#x} bytes @ {:#x})",
        partition.name,
        partition.length,
        partition.offset,
        region.physical_length,
        region.physical_offset
    );

    image.check_region(&region)?;
    Ok(Target { partition, region })
}

/// Write a payload into a located partition
///
/// `payload_len`, when known, is checked against the partition capacity
/// before anything is erased. Payloads of unknown length are checked while
/// streaming.
pub fn write_payload<R: Read + ?Sized, P: TransferProgress + ?Sized>(
    image: &mut ImageBuffer,
    geometry: &FlashGeometry,
    target: &Target<'_>,
    payload: &mut R,
    payload_len: Option<u64>,
    payload_path: &Path,
    progress: &mut P,
) -> Result<TransferStats> {
    let partition = target.partition;
    let region = target.region;
    let capacity = partition.capacity(geometry);

    let too_big = |size: u64| Error::FileTooBig {
        partition: partition.name.clone(),
        size,
        capacity,
    };

    if let Some(len) = payload_len {
        if len > capacity {
            return Err(too_big(len));
        }
    }

    debug!("Erasing partition {}", partition.name);
    image.erase(region.physical_offset, region.physical_length)?;

    let page_size = geometry.page_size() as usize;
    let ecc = geometry.ecc_layout();
    let mut page = vec![ERASED; page_size];
    let mut offset = region.physical_offset;
    let mut pages = 0u64;
    let mut bytes = 0u64;

    progress.start(partition, Direction::Write, payload_len.unwrap_or(capacity));

    loop {
        let n = read_page(payload, &mut page).map_err(|e| Error::PayloadIo {
            path: payload_path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        if bytes + n as u64 > capacity {
            return Err(too_big(bytes + n as u64));
        }
        page[n..].fill(ERASED);

        match ecc {
            Some(ecc) => {
                image.write_slice(offset, &page)?;
                image.write_slice(offset + page_size as u64, &ecc.build_oob(&page))?;
                offset += geometry.stride();
            }
            None => {
                image.write_slice(offset, &page[..n])?;
                offset += n as u64;
            }
        }

        pages += 1;
        bytes += n as u64;
        progress.progress(bytes);

        if n < page_size {
            break;
        }
    }

    let stats = TransferStats {
        partition: partition.name.clone(),
        direction: Direction::Write,
        pages,
        bytes,
        region,
    };
    debug!("{}", stats);
    progress.complete(&stats);
    Ok(stats)
}

/// Copy the contents of a located partition into `out`
///
/// NAND partitions yield `page_count` whole pages; OOB areas are skipped and
/// no ECC is checked. NOR partitions yield exactly their logical length.
pub fn read_payload<W: Write + ?Sized, P: TransferProgress + ?Sized>(
    image: &ImageBuffer,
    geometry: &FlashGeometry,
    target: &Target<'_>,
    out: &mut W,
    payload_path: &Path,
    progress: &mut P,
) -> Result<TransferStats> {
    let partition = target.partition;
    let region = target.region;
    let page_size = u64::from(geometry.page_size());
    let total = partition.capacity(geometry);

    let io_err = |e: io::Error| Error::PayloadIo {
        path: payload_path.to_path_buf(),
        source: e,
    };

    progress.start(partition, Direction::Read, total);

    let mut offset = region.physical_offset;
    let mut pages = 0u64;
    let mut bytes = 0u64;
    while bytes < total {
        let len = page_size.min(total - bytes);
        out.write_all(image.read_slice(offset, len)?).map_err(io_err)?;

        offset += geometry.stride();
        pages += 1;
        bytes += len;
        progress.progress(bytes);
    }
    out.flush().map_err(io_err)?;

    let stats = TransferStats {
        partition: partition.name.clone(),
        direction: Direction::Read,
        pages,
        bytes,
        region,
    };
    debug!("{}", stats);
    progress.complete(&stats);
    Ok(stats)
}

/// Write the file at `path` into partition `name`
pub fn write_partition_file<P: TransferProgress + ?Sized>(
    image: &mut ImageBuffer,
    table: &PartitionTable,
    geometry: &FlashGeometry,
    name: &str,
    path: &Path,
    progress: &mut P,
) -> Result<TransferStats> {
    let target = locate(image, table, geometry, name)?;

    let io_err = |e: io::Error| Error::PayloadIo {
        path: path.to_path_buf(),
        source: e,
    };
    let file = File::open(path).map_err(io_err)?;
    let len = file.metadata().map_err(io_err)?.len();
    let mut reader = BufReader::new(file);

    write_payload(
        image,
        geometry,
        &target,
        &mut reader,
        Some(len),
        path,
        progress,
    )
}

/// Read partition `name` into a new file at `path`
pub fn read_partition_file<P: TransferProgress + ?Sized>(
    image: &ImageBuffer,
    table: &PartitionTable,
    geometry: &FlashGeometry,
    name: &str,
    path: &Path,
    progress: &mut P,
) -> Result<TransferStats> {
    let target = locate(image, table, geometry, name)?;

    let file = File::create(path).map_err(|e| Error::PayloadIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    read_payload(image, geometry, &target, &mut writer, path, progress)
}

/// Run one action against the image
pub fn run_action<P: TransferProgress + ?Sized>(
    image: &mut ImageBuffer,
    table: &PartitionTable,
    geometry: &FlashGeometry,
    action: &Action,
    progress: &mut P,
) -> Result<TransferStats> {
    match action.direction {
        Direction::Write => write_partition_file(
            image,
            table,
            geometry,
            &action.partition,
            &action.path,
            progress,
        ),
        Direction::Read => read_partition_file(
            image,
            table,
            geometry,
            &action.partition,
            &action.path,
            progress,
        ),
    }
}

/// Fill `page` from `reader`, stopping early only at end of input
fn read_page<R: Read + ?Sized>(reader: &mut R, page: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < page.len() {
        match reader.read(&mut page[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
