//! Top-level run: load the table, check it, run the actions, save the image

use super::list;
use crate::cli::Cli;
use flashimg_core::geometry::FlashGeometry;
use flashimg_core::image::ImageBuffer;
use flashimg_core::layout::{Partition, PartitionTable};
use flashimg_core::ops::{self, Action, Direction, TransferProgress, TransferStats};
use flashimg_core::Error;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar with a phase message
fn create_progress_bar_with_phase(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Progress reporter using indicatif progress bars
#[derive(Default)]
pub struct IndicatifProgress {
    current_bar: Option<ProgressBar>,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransferProgress for IndicatifProgress {
    fn start(&mut self, partition: &Partition, direction: Direction, total_bytes: u64) {
        let phase = match direction {
            Direction::Read => format!("Reading {}", partition.name),
            Direction::Write => format!("Writing {}", partition.name),
        };
        let pb = create_progress_bar_with_phase(total_bytes, &phase)
            .unwrap_or_else(|_| ProgressBar::new(total_bytes));
        self.current_bar = Some(pb);
    }

    fn progress(&mut self, bytes_done: u64) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(bytes_done);
        }
    }

    fn complete(&mut self, stats: &TransferStats) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_and_clear();
        }
        println!("{}", stats);
    }
}

/// Load everything the command line names, run the actions, and save
///
/// Geometry and partition table problems are reported before the image is
/// opened. The image file is only written back when every action succeeded.
pub fn execute(cli: &Cli, actions: &[Action]) -> Result<(), Error> {
    let geometry = FlashGeometry::from_params(cli.flash_type.into(), cli.page_size)?;
    log::info!("Flash geometry: {}", geometry);

    let table = match &cli.partitions {
        Some(path) => {
            let table = PartitionTable::from_file(path)?;
            log::info!("Loaded {} partitions from {}", table.len(), path.display());
            table
        }
        None => PartitionTable::new(),
    };
    check_overlaps(&table, &geometry, cli.strict)?;

    let mut image = ImageBuffer::open(&cli.image, cli.size, &geometry)?;

    if cli.list {
        list::print_partitions(&table, &geometry, image.size());
    }

    run_actions(&mut image, &table, &geometry, actions, cli.strict)?;

    image.save(&cli.image)?;
    Ok(())
}

/// Report partitions that share image bytes under `geometry`
///
/// Overlaps are warnings unless `strict` is set.
pub fn check_overlaps(
    table: &PartitionTable,
    geometry: &FlashGeometry,
    strict: bool,
) -> Result<(), Error> {
    for (a, b) in table.overlapping(geometry) {
        if strict {
            return Err(Error::PartitionOverlap {
                first: a.name.clone(),
                second: b.name.clone(),
            });
        }
        log::warn!(
            "Partitions '{}' and '{}' overlap in the image; writing one erases part of the other",
            a.name,
            b.name
        );
    }
    Ok(())
}

/// Run every action in order
///
/// An unknown partition is skipped with a warning unless `strict` is set.
/// Any other failure stops the run immediately.
pub fn run_actions(
    image: &mut ImageBuffer,
    table: &PartitionTable,
    geometry: &FlashGeometry,
    actions: &[Action],
    strict: bool,
) -> Result<(), Error> {
    let mut progress = IndicatifProgress::new();

    for action in actions {
        match ops::run_action(image, table, geometry, action, &mut progress) {
            Ok(_) => {}
            Err(e) if e.is_recoverable() && !strict => {
                log::warn!("{}, skipping {}", e, action.path.display());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
