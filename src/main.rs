//! flashimg - Build and edit raw NAND/NOR flash images
//!
//! Reads an existing image (or starts from an erased one), runs the
//! requested partition reads and writes in command line order, and writes
//! the image back only when every action succeeded.
//!
//! # Example
//!
//! ```text
//! flashimg -i nand.img -m 64M -p partitions.txt -t nand -s 2048 \
//!     -w boot,u-boot.bin -w kernel,zImage -r env,env.bin
//! ```

mod cli;
mod commands;

use cli::Cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (cli, actions) = Cli::parse_with_actions();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match commands::run::execute(&cli, &actions) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            // Bad parameters or tables exit like a usage error
            if e.is_configuration() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
