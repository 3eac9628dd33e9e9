//! BoxTrim Interactive Video Trimmer
//!
//! Plays every video in a folder letterboxed into a square preview and
//! writes the segments marked by the operator as square MP4 files.
//!
//! # Usage
//!
//! ```bash
//! boxtrim --source videos --output trimmed --target-size 448
//! ```
//!
//! Keys: `s` start segment, `e` end segment, `f`/`→` forward, `p`/`←` back,
//! space pause, `q`/`Esc` quit.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use boxtrim::adapters::{
    LibavEncoderBackend, LibavSourceProvider, TerminalKeys, TerminalPreview, TomlConfigAdapter,
};
use boxtrim::app::discover_videos;
use boxtrim::cli::Cli;
use boxtrim::config_initialization::ENV_CONFIG;
use boxtrim::ports::PreviewSurface;
use boxtrim::utils::logging::init_logging;
use boxtrim::{BatchInteractor, KeyCommandDispatcher, SessionConfig};

/// Main entry point for the BoxTrim application
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve configuration: CLI > Env > File > Defaults
    let explicit = std::env::var_os(ENV_CONFIG).map(Into::into);
    let working_dir = std::env::current_dir().context("Cannot read working directory")?;
    let config_path = TomlConfigAdapter::locate(explicit, &working_dir)?;
    let file = config_path
        .as_deref()
        .map(TomlConfigAdapter::load)
        .transpose()?;
    let config = SessionConfig::resolve(file, |name| std::env::var(name).ok(), &cli.to_overrides())?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Cannot create output folder {}", config.output_dir.display())
    })?;
    init_logging(&config.logging)?;

    info!("Starting BoxTrim");
    if let Some(path) = &config_path {
        info!("Loaded configuration from: {}", path.display());
    }
    if !config.env_overrides.is_empty() {
        info!(
            "Applied {} environment variable overrides: {}",
            config.env_overrides.len(),
            config.env_overrides.join(", ")
        );
    }
    info!(
        source = %config.source_dir.display(),
        output = %config.output_dir.display(),
        target_size = config.target_size,
        date_tag = %config.date_tag,
        "Configuration resolved"
    );

    let videos = discover_videos(&config)
        .with_context(|| format!("Cannot list videos in {}", config.source_dir.display()))?;
    if videos.is_empty() {
        info!("No videos found in {}", config.source_dir.display());
        println!("No videos found in {}", config.source_dir.display());
        return Ok(());
    }

    boxtrim::init()?;
    let provider = LibavSourceProvider::new();
    let backend = LibavEncoderBackend::new();
    let mut preview = TerminalPreview::open()?;
    let mut dispatcher = KeyCommandDispatcher::new(TerminalKeys::new());

    let outcome = BatchInteractor::new(&config, &provider, &backend, &mut preview, &mut dispatcher)
        .run(&videos);

    // Restore the terminal before anything is printed
    preview.close();

    match outcome {
        Ok(report) => {
            for session in &report.sessions {
                for segment in &session.segments {
                    println!(
                        "Saved: {} ({} frames, {})",
                        segment.path.display(),
                        segment.frames_written,
                        segment.encoder
                    );
                }
            }
            for skipped in &report.skipped {
                println!("Skipped: {}", skipped.display());
            }

            if report.quit {
                println!("User exited.");
            } else {
                println!("Processing complete.");
            }
            info!("BoxTrim completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Batch aborted: {}", e);
            Err(e.into())
        }
    }
}
