//! Partition tables
//!
//! A partition table names regions of logical flash space. Tables can be:
//!
//! - Loaded from whitespace separated text files (`name offset length`)
//! - Loaded from TOML files
//! - Built in code with [`PartitionTable::add`]
//!
//! Names are unique within a table; a duplicate is rejected at load time.
//! Overlaps depend on the flash geometry and are checked with
//! [`PartitionTable::overlapping`] once the geometry is known.
//!
//! ```ignore
//! let table = PartitionTable::from_file("partitions.txt")?;
//! let kernel = table.get("kernel")?;
//! let region = kernel.physical(&geometry)?;
//! ```

mod text;
mod toml;
mod types;

use std::path::Path;

pub use types::*;

use crate::error::Result;

impl PartitionTable {
    /// Load a partition table, choosing the format from the file extension
    ///
    /// Files ending in `.toml` are parsed as TOML, anything else as text.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_file(path)
        } else {
            Self::from_text_file(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_from_file_dispatch() {
        let dir = tempfile::tempdir().unwrap();

        let text = dir.path().join("parts.txt");
        fs::write(&text, "boot 0 1024\n").unwrap();
        let table = PartitionTable::from_file(&text).unwrap();
        assert_eq!(table.source, TableSource::Text);

        let toml = dir.path().join("parts.TOML");
        fs::write(
            &toml,
            "[[partition]]\nname = \"boot\"\noffset = 0\nlength = 1024\n",
        )
        .unwrap();
        let table = PartitionTable::from_file(&toml).unwrap();
        assert_eq!(table.source, TableSource::Toml);
        assert_eq!(table.get("boot").unwrap().length, 1024);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PartitionTable::from_file("/nonexistent/parts.txt"),
            Err(crate::Error::PartitionTable { line: 0, .. })
        ));
    }
}
