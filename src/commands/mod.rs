//! CLI command implementations
//!
//! - `run` executes the ordered list of partition actions
//! - `list` prints the partition map for the selected geometry

pub mod list;
pub mod run;
