//! Frame normalization engine

pub mod letterbox;

pub use letterbox::{LetterboxLayout, LetterboxResizer};
