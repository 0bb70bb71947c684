//! CLI argument parsing

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use flashimg_core::geometry::FlashType;
use flashimg_core::ops::Action;
use flashimg_core::size::parse_size;
use std::path::PathBuf;

/// Parse a size with optional K/M/G suffix
fn parse_size_arg(s: &str) -> Result<u64, String> {
    parse_size(s)
}

/// A `PARTITION,FILE` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFile {
    pub partition: String,
    pub path: PathBuf,
}

/// Parse a `PARTITION,FILE` pair
fn parse_partition_file(s: &str) -> Result<PartitionFile, String> {
    match s.split_once(',') {
        Some((partition, path)) if !partition.is_empty() && !path.is_empty() => {
            Ok(PartitionFile {
                partition: partition.to_string(),
                path: PathBuf::from(path),
            })
        }
        _ => Err(format!("expected PARTITION,FILE, got '{}'", s)),
    }
}

/// Flash type selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlashTypeArg {
    /// Paged flash with OOB/ECC areas
    Nand,
    /// Linear flash without OOB
    Nor,
}

impl From<FlashTypeArg> for FlashType {
    fn from(arg: FlashTypeArg) -> Self {
        match arg {
            FlashTypeArg::Nand => FlashType::Nand,
            FlashTypeArg::Nor => FlashType::Nor,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "flashimg")]
#[command(author, version, about = "Raw NAND/NOR flash image builder", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Image file to create or edit
    #[arg(short, long)]
    pub image: PathBuf,

    /// Logical image size (e.g. 64M, 0x4000000); defaults to the existing image size
    #[arg(short = 'm', long, value_parser = parse_size_arg)]
    pub size: Option<u64>,

    /// Partition table file (text, or TOML with a .toml extension)
    #[arg(short, long)]
    pub partitions: Option<PathBuf>,

    /// Flash type
    #[arg(short = 't', long, value_enum, default_value = "nand")]
    pub flash_type: FlashTypeArg,

    /// Page size in bytes (NAND: 256, 512 or 2048; NOR: copy chunk size)
    #[arg(short = 's', long)]
    pub page_size: Option<u32>,

    /// Read a partition into a file (PARTITION,FILE); may be repeated
    #[arg(short, long, value_name = "PARTITION,FILE", value_parser = parse_partition_file)]
    pub read: Vec<PartitionFile>,

    /// Write a file into a partition (PARTITION,FILE); may be repeated
    #[arg(short, long, value_name = "PARTITION,FILE", value_parser = parse_partition_file)]
    pub write: Vec<PartitionFile>,

    /// Treat unknown partition names as fatal errors
    #[arg(long)]
    pub strict: bool,

    /// Print the partition map before running actions
    #[arg(short, long)]
    pub list: bool,
}

impl Cli {
    /// Parse the process arguments, keeping read/write actions in order
    pub fn parse_with_actions() -> (Self, Vec<Action>) {
        let matches = Self::command().get_matches();
        let cli = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
        let actions = cli.ordered_actions(&matches);
        (cli, actions)
    }

    /// Merge `--read` and `--write` into a single list in command line order
    pub fn ordered_actions(&self, matches: &ArgMatches) -> Vec<Action> {
        let mut indexed: Vec<(usize, Action)> = Vec::new();

        if let Some(indices) = matches.indices_of("read") {
            for (index, pf) in indices.zip(&self.read) {
                indexed.push((index, Action::read(pf.partition.clone(), pf.path.clone())));
            }
        }
        if let Some(indices) = matches.indices_of("write") {
            for (index, pf) in indices.zip(&self.write) {
                indexed.push((index, Action::write(pf.partition.clone(), pf.path.clone())));
            }
        }

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, action)| action).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flashimg_core::ops::Direction;

    fn parse(args: &[&str]) -> (Cli, Vec<Action>) {
        let matches = Cli::command().try_get_matches_from(args).unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        let actions = cli.ordered_actions(&matches);
        (cli, actions)
    }

    #[test]
    fn test_actions_keep_order() {
        let (_, actions) = parse(&[
            "flashimg", "-i", "flash.img", "-s", "512", "-w", "boot,boot.bin", "-r",
            "kernel,k.out", "-w", "kernel,zImage",
        ]);
        let summary: Vec<(&str, Direction)> = actions
            .iter()
            .map(|a| (a.partition.as_str(), a.direction))
            .collect();
        assert_eq!(
            summary,
            [
                ("boot", Direction::Write),
                ("kernel", Direction::Read),
                ("kernel", Direction::Write),
            ]
        );
        assert_eq!(actions[2].path, PathBuf::from("zImage"));
    }

    #[test]
    fn test_size_suffix() {
        let (cli, _) = parse(&["flashimg", "-i", "flash.img", "-m", "64M", "-t", "nor"]);
        assert_eq!(cli.size, Some(64 * 1024 * 1024));
        assert_eq!(cli.flash_type, FlashTypeArg::Nor);
    }

    #[test]
    fn test_image_required() {
        assert!(Cli::command().try_get_matches_from(["flashimg", "-s", "512"]).is_err());
    }

    #[test]
    fn test_bad_action() {
        assert!(Cli::command()
            .try_get_matches_from(["flashimg", "-i", "x", "-w", "boot"])
            .is_err());
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
