//! Partition map listing

use flashimg_core::geometry::FlashGeometry;
use flashimg_core::layout::{PartitionTable, TableSource};
use flashimg_core::size::format_size;

/// Print the partition table with its physical placement
pub fn print_partitions(table: &PartitionTable, geometry: &FlashGeometry, image_size: u64) {
    println!("Partition Map");
    println!("=============");

    if let Some(name) = &table.name {
        println!("Name:     {}", name);
    }
    println!(
        "Source:   {}",
        match table.source {
            TableSource::Text => "text file",
            TableSource::Toml => "TOML file",
            TableSource::Manual => "none",
        }
    );
    println!("Geometry: {}", geometry);
    println!("Image:    {} bytes ({})", image_size, format_size(image_size));

    println!("\nPartitions ({}):", table.len());
    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>10} {:>8} {:>5}",
        "Name", "Offset", "Length", "Phys off", "Phys len", "Pages", "Fits"
    );
    println!("{:-<75}", "");

    for partition in table {
        match partition.physical(geometry) {
            Ok(region) => println!(
                "{:<16} {:#010x} {:#010x} {:#010x} {:#010x} {:>8} {:>5}",
                partition.name,
                partition.offset,
                partition.length,
                region.physical_offset,
                region.physical_length,
                region.page_count,
                if region.fits(image_size) { "yes" } else { "NO" }
            ),
            Err(e) => println!(
                "{:<16} {:#010x} {:#010x} {}",
                partition.name, partition.offset, partition.length, e
            ),
        }
    }
}
