//! Plain text partition tables
//!
//! One partition per line, three whitespace separated fields:
//!
//! ```text
//! # name     offset     length
//! boot       0x0        0x20000
//! kernel     0x20000    0x200000
//! rootfs     0x220000   0x1DE0000
//! ```
//!
//! Offsets and lengths use [`parse_number`] syntax. Blank lines and text
//! after `#` are ignored. Any other malformed line fails the whole table.

use std::fs;
use std::path::Path;

use log::debug;

use super::{Partition, PartitionTable, TableSource};
use crate::error::{Error, Result};
use crate::size::parse_number;

impl PartitionTable {
    /// Load a text partition table from a file
    pub fn from_text_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::PartitionTable {
            line: 0,
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_text_str(&content)
    }

    /// Parse a text partition table
    pub fn from_text_str(content: &str) -> Result<Self> {
        let mut table = PartitionTable::with_source(TableSource::Text);

        for (index, raw) in content.lines().enumerate() {
            let line = index + 1;
            let record = raw.split('#').next().unwrap_or("").trim();
            if record.is_empty() {
                continue;
            }

            let partition = parse_record(record).map_err(|message| Error::PartitionTable {
                line,
                message,
            })?;
            debug!(
                "Partition '{}' offset {:#x} length {:#x}",
                partition.name, partition.offset, partition.length
            );
            table.add(partition)?;
        }

        Ok(table)
    }
}

fn parse_record(record: &str) -> std::result::Result<Partition, String> {
    let fields: Vec<&str> = record.split_whitespace().collect();
    let &[name, offset, length] = fields.as_slice() else {
        return Err(format!(
            "expected 'name offset length', found {} field(s)",
            fields.len()
        ));
    };

    let offset = parse_number(offset).map_err(|e| format!("bad offset: {}", e))?;
    let length = parse_number(length).map_err(|e| format!("bad length: {}", e))?;
    Ok(Partition::new(name, offset, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        let text = "\
# name   offset   length
boot     0        0x20000
kernel   0x20000  2097152   # trailing comment

rootfs   0x220000 0
";
        let table = PartitionTable::from_text_str(text).unwrap();
        assert_eq!(table.source, TableSource::Text);
        assert_eq!(table.len(), 3);

        let kernel = table.get("kernel").unwrap();
        assert_eq!(kernel.offset, 0x20000);
        assert_eq!(kernel.length, 2 * 1024 * 1024);

        let names: Vec<&str> = table.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["boot", "kernel", "rootfs"]);
    }

    #[test]
    fn test_malformed_line_is_fatal() {
        let text = "boot 0 1024\nkernel 1024\nrootfs 2048 1024\n";
        match PartitionTable::from_text_str(text) {
            Err(Error::PartitionTable { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }

        let text = "boot zero 1024\n";
        assert!(matches!(
            PartitionTable::from_text_str(text),
            Err(Error::PartitionTable { line: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_is_fatal() {
        let text = "boot 0 1024\nboot 1024 1024\n";
        assert!(matches!(
            PartitionTable::from_text_str(text),
            Err(Error::DuplicatePartition(_))
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = PartitionTable::from_text_str("\n# nothing here\n").unwrap();
        assert!(table.is_empty());
    }
}
