//! Letterbox resizing to a fixed square canvas

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::domain::model::Frame;

/// Aspect-preserving scale-to-fit followed by centered black padding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxResizer {
    target_size: u32,
}

/// Where the scaled content lands inside the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxLayout {
    pub content_width: u32,
    pub content_height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
}

impl LetterboxResizer {
    /// Create a resizer producing `target_size x target_size` frames
    pub fn new(target_size: u32) -> Self {
        Self { target_size }
    }

    /// Compute the content size and offsets for a source of `width x height`
    pub fn layout(&self, width: u32, height: u32) -> LetterboxLayout {
        let target = self.target_size;
        if width == 0 || height == 0 || target == 0 {
            return LetterboxLayout {
                content_width: 0,
                content_height: 0,
                x_offset: target / 2,
                y_offset: target / 2,
            };
        }

        let scale = target as f64 / width.max(height) as f64;
        let content_width = ((width as f64 * scale).round() as u32).clamp(1, target);
        let content_height = ((height as f64 * scale).round() as u32).clamp(1, target);

        LetterboxLayout {
            content_width,
            content_height,
            x_offset: (target - content_width) / 2,
            y_offset: (target - content_height) / 2,
        }
    }

    /// Resize a frame onto the square canvas, keeping its index
    pub fn resize(&self, frame: &Frame) -> Frame {
        Frame::new(frame.index, self.resize_image(&frame.image))
    }

    /// Resize an RGB image onto the square canvas
    pub fn resize_image(&self, source: &RgbImage) -> RgbImage {
        let (width, height) = source.dimensions();
        let layout = self.layout(width, height);
        let mut canvas = RgbImage::new(self.target_size, self.target_size);

        if layout.content_width == 0 || layout.content_height == 0 {
            return canvas;
        }

        if (layout.content_width, layout.content_height) == (width, height) {
            imageops::replace(&mut canvas, source, layout.x_offset as i64, layout.y_offset as i64);
        } else {
            let scaled = imageops::resize(
                source,
                layout.content_width,
                layout.content_height,
                FilterType::Lanczos3,
            );
            imageops::replace(&mut canvas, &scaled, layout.x_offset as i64, layout.y_offset as i64);
        }

        canvas
    }
}
