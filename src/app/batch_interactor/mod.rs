// Batch interactor - Runs one trim session per source file in sorted order

use std::path::PathBuf;

use tracing::{info, warn};

use crate::app::dispatcher::KeyCommandDispatcher;
use crate::app::trim_interactor::TrimSessionController;
use crate::config_initialization::SessionConfig;
use crate::domain::model::BatchReport;
use crate::error::TrimResult;
use crate::ports::*;
use crate::utils::path::{display_name, list_videos};

/// Videos in the configured source folder, sorted by file name
pub fn discover_videos(config: &SessionConfig) -> TrimResult<Vec<PathBuf>> {
    list_videos(&config.source_dir, &config.extensions)
}

/// Interactor for trimming every video in the source folder
pub struct BatchInteractor<'a, SP, B, P, I>
where
    SP: SourceProvider,
    B: EncoderBackend,
    P: PreviewSurface,
    I: KeyInput,
{
    config: &'a SessionConfig,
    provider: &'a SP,
    backend: &'a B,
    preview: &'a mut P,
    dispatcher: &'a mut KeyCommandDispatcher<I>,
}

impl<'a, SP, B, P, I> BatchInteractor<'a, SP, B, P, I>
where
    SP: SourceProvider,
    B: EncoderBackend,
    P: PreviewSurface,
    I: KeyInput,
{
    /// Create new batch interactor with injected ports
    pub fn new(
        config: &'a SessionConfig,
        provider: &'a SP,
        backend: &'a B,
        preview: &'a mut P,
        dispatcher: &'a mut KeyCommandDispatcher<I>,
    ) -> Self {
        Self {
            config,
            provider,
            backend,
            preview,
            dispatcher,
        }
    }

    /// Process `videos` in order.
    ///
    /// Files that cannot be opened or have no frames are skipped. A quit
    /// command ends the batch after its session has cleaned up; any other
    /// session error aborts the batch.
    pub fn run(&mut self, videos: &[PathBuf]) -> TrimResult<BatchReport> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let mut report = BatchReport::default();

        for (position, path) in videos.iter().enumerate() {
            info!("Opening {} ({}/{})", display_name(path), position + 1, videos.len());

            let source = match self.provider.open(path) {
                Ok(source) => source,
                Err(e) if e.is_skippable() => {
                    warn!("Skipping {}: {}", display_name(path), e);
                    report.skipped.push(path.clone());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let controller = TrimSessionController::new(
                self.config,
                path,
                source,
                self.backend,
                &mut *self.preview,
                &mut *self.dispatcher,
            );
            let session = controller.run()?;
            let quit = session.quit;
            report.sessions.push(session);

            if quit {
                report.quit = true;
                break;
            }
        }

        info!(
            "Batch finished: {} processed, {} skipped, {} segments written",
            report.sessions.len(),
            report.skipped.len(),
            report.segment_count()
        );
        Ok(report)
    }
}
