// Adapters - External system implementations

pub mod encoder_libav;
pub mod source_libav;
pub mod terminal;
pub mod toml_config;

// Re-export adapters
pub use encoder_libav::{LibavEncoderBackend, LibavSegmentSink};
pub use source_libav::{LibavFrameSource, LibavSourceProvider};
pub use terminal::{TerminalKeys, TerminalPreview};
pub use toml_config::TomlConfigAdapter;
