//! Partition table types

use crate::error::{Error, Result};
use crate::geometry::FlashGeometry;
use crate::translate::{self, PhysicalRegion};

/// A named region of logical flash space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// Name of the partition
    pub name: String,
    /// Start offset in logical (payload only) bytes
    pub offset: u64,
    /// Length in logical bytes
    pub length: u64,
}

impl Partition {
    /// Create a new partition
    pub fn new(name: impl Into<String>, offset: u64, length: u64) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
        }
    }

    /// End offset (exclusive) in logical space, saturating on overflow
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }

    /// Check if this partition shares image bytes with another
    ///
    /// NAND partitions occupy whole pages, so two partitions that are
    /// disjoint in logical space still collide when one of them does not
    /// end on a page boundary.
    pub fn overlaps(&self, other: &Partition, geometry: &FlashGeometry) -> bool {
        if self.length == 0 || other.length == 0 {
            return false;
        }
        match (self.physical(geometry), other.physical(geometry)) {
            (Ok(a), Ok(b)) => {
                let a_end = a.end().unwrap_or(u64::MAX);
                let b_end = b.end().unwrap_or(u64::MAX);
                a.physical_offset < b_end && b.physical_offset < a_end
            }
            _ => self.offset < other.end() && other.offset < self.end(),
        }
    }

    /// Location of this partition inside the image for `geometry`
    pub fn physical(&self, geometry: &FlashGeometry) -> Result<PhysicalRegion> {
        translate::translate(geometry, self.offset, self.length)
    }

    /// Payload bytes this partition can hold
    ///
    /// NAND partitions always hold whole pages, so the capacity is rounded
    /// up to the page size. NOR partitions hold exactly their length.
    pub fn capacity(&self, geometry: &FlashGeometry) -> u64 {
        match geometry {
            FlashGeometry::Nor { .. } => self.length,
            FlashGeometry::Nand(_) => self
                .length
                .div_ceil(u64::from(geometry.page_size()))
                .saturating_mul(u64::from(geometry.page_size())),
        }
    }
}

/// Where the partition table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableSource {
    /// Whitespace separated text file
    Text,
    /// TOML file
    Toml,
    /// Built in code
    Manual,
}

/// Ordered set of uniquely named partitions
#[derive(Debug, Clone)]
pub struct PartitionTable {
    /// Optional name for this table
    pub name: Option<String>,
    /// Source of this table
    pub source: TableSource,
    partitions: Vec<Partition>,
}

impl PartitionTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self::with_source(TableSource::Manual)
    }

    /// Create a table with a specific source
    pub fn with_source(source: TableSource) -> Self {
        Self {
            name: None,
            source,
            partitions: Vec::new(),
        }
    }

    /// Append a partition, rejecting duplicate names
    pub fn add(&mut self, partition: Partition) -> Result<()> {
        if self.find(&partition.name).is_some() {
            return Err(Error::DuplicatePartition(partition.name));
        }
        self.partitions.push(partition);
        Ok(())
    }

    /// Find a partition by exact name
    pub fn find(&self, name: &str) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.name == name)
    }

    /// Find a partition by name, or fail with [`Error::PartitionNotFound`]
    pub fn get(&self, name: &str) -> Result<&Partition> {
        self.find(name)
            .ok_or_else(|| Error::PartitionNotFound(name.to_string()))
    }

    /// Partitions in table order
    pub fn iter(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.iter()
    }

    /// Get the number of partitions
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Pairs of partitions that share image bytes under `geometry`
    pub fn overlapping(&self, geometry: &FlashGeometry) -> Vec<(&Partition, &Partition)> {
        let mut pairs = Vec::new();
        for (i, a) in self.partitions.iter().enumerate() {
            for b in self.partitions.iter().skip(i + 1) {
                if a.overlaps(b, geometry) {
                    pairs.push((a, b));
                }
            }
        }
        pairs
    }
}

impl Default for PartitionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a PartitionTable {
    type Item = &'a Partition;
    type IntoIter = std::slice::Iter<'a, Partition>;

    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}
