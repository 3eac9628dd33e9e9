//! Segment output naming and writing

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub mod writer;

pub use writer::SegmentWriter;

/// Derives segment file paths for one source video
#[derive(Debug, Clone, PartialEq)]
pub struct OutputNaming {
    output_dir: PathBuf,
    date_tag: String,
}

impl OutputNaming {
    /// Create a naming scheme rooted at `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, date_tag: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            date_tag: date_tag.into(),
        }
    }

    /// `{stem}_normal_{date_tag}_{trim_index}.mp4` inside the output folder
    pub fn segment_path(&self, source: &Path, trim_index: u32) -> PathBuf {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "segment".to_string());

        self.output_dir
            .join(format!("{}_normal_{}_{}.mp4", stem, self.date_tag, trim_index))
    }
}

/// Date tag in the form `17_october`
pub fn date_tag_for(date: NaiveDate) -> String {
    date.format("%-d_%B").to_string().to_lowercase()
}

/// Date tag for today in local time
pub fn today_date_tag() -> String {
    date_tag_for(chrono::Local::now().date_naive())
}
