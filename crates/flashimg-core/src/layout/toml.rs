//! TOML partition table parsing
//!
//! Parses partition tables in TOML format:
//!
//! ```toml
//! [table]
//! name = "Board A"
//!
//! [[partition]]
//! name = "boot"
//! offset = 0x000000
//! length = "128 KiB"
//!
//! [[partition]]
//! name = "kernel"
//! offset = "0x20000"
//! length = 0x200000
//! ```

use std::fs;
use std::path::Path;

use super::{Partition, PartitionTable, TableSource};
use crate::error::{Error, Result};
use crate::size::parse_size;

/// TOML table file structure
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlTableFile {
    table: Option<TomlTableMeta>,
    #[serde(default)]
    partition: Vec<TomlPartition>,
}

/// Table metadata
#[derive(Debug, serde::Deserialize)]
struct TomlTableMeta {
    name: Option<String>,
}

/// Partition definition in TOML
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPartition {
    name: String,
    #[serde(deserialize_with = "deserialize_size")]
    offset: u64,
    #[serde(deserialize_with = "deserialize_size")]
    length: u64,
}

/// Deserialize a u64 given as an integer or as a hex/size string
fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrStr {
        Int(u64),
        Str(String),
    }

    match IntOrStr::deserialize(deserializer)? {
        IntOrStr::Int(n) => Ok(n),
        IntOrStr::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

impl PartitionTable {
    /// Load a partition table from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::PartitionTable {
            line: 0,
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a partition table from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlTableFile = toml::from_str(content).map_err(|e| Error::PartitionTable {
            line: line_of(content, e.span().map(|span| span.start)),
            message: e.message().to_string(),
        })?;

        let mut table = PartitionTable::with_source(TableSource::Toml);
        table.name = file.table.and_then(|meta| meta.name);

        for entry in file.partition {
            table.add(Partition::new(entry.name, entry.offset, entry.length))?;
        }

        Ok(table)
    }
}

/// 1-based line number of a byte offset, 0 when unknown
fn line_of(content: &str, offset: Option<usize>) -> usize {
    offset.map_or(0, |offset| {
        content[..offset.min(content.len())].matches('\n').count() + 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[table]
name = "Test Table"

[[partition]]
name = "boot"
offset = 0x000000
length = "128 KiB"

[[partition]]
name = "kernel"
offset = "0x20000"
length = 0x200000
"#;
        let table = PartitionTable::from_toml_str(toml).unwrap();
        assert_eq!(table.name.as_deref(), Some("Test Table"));
        assert_eq!(table.source, TableSource::Toml);
        assert_eq!(table.len(), 2);

        let boot = table.get("boot").unwrap();
        assert_eq!(boot.offset, 0);
        assert_eq!(boot.length, 128 * 1024);

        let kernel = table.get("kernel").unwrap();
        assert_eq!(kernel.offset, 0x20000);
        assert_eq!(kernel.length, 0x200000);
    }

    #[test]
    fn test_toml_errors() {
        let missing_length = r#"
[[partition]]
name = "boot"
offset = 0
"#;
        assert!(matches!(
            PartitionTable::from_toml_str(missing_length),
            Err(Error::PartitionTable { .. })
        ));

        let duplicate = r#"
[[partition]]
name = "boot"
offset = 0
length = 1024

[[partition]]
name = "boot"
offset = 1024
length = 1024
"#;
        assert!(matches!(
            PartitionTable::from_toml_str(duplicate),
            Err(Error::DuplicatePartition(_))
        ));
    }
}
