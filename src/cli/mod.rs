//! CLI module for BoxTrim
//!
//! This module handles command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::config_initialization::CliOverrides;

/// BoxTrim interactive video trimmer
///
/// Plays every video in the source folder, letterboxed to a square, and
/// writes the segments you mark to the output folder.
///
/// Keys: s start segment, e end segment, f/Right forward, p/Left back,
/// space pause, q/Esc quit.
#[derive(Parser, Debug)]
#[command(name = "boxtrim")]
#[command(about = "BoxTrim - Interactive letterbox video trimmer")]
#[command(version)]
pub struct Cli {
    /// Folder containing the source videos
    #[arg(short, long, env = "BOXTRIM_SOURCE")]
    pub source: Option<PathBuf>,

    /// Folder receiving the trimmed segments
    #[arg(short, long, env = "BOXTRIM_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Side of the square output in pixels (even)
    #[arg(short, long, env = "BOXTRIM_TARGET_SIZE")]
    pub target_size: Option<u32>,
}

impl Cli {
    /// Values that override the config file and environment
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            source_dir: self.source.clone(),
            output_dir: self.output.clone(),
            target_size: self.target_size,
        }
    }
}
