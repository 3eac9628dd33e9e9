//! FFmpeg frame source using libav bindings
//!
//! Demuxes the best video stream, decodes it and converts every frame to
//! packed RGB24 at its native resolution.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use ffmpeg::codec::context::Context as CodecContext;
use ffmpeg::decoder::Video as VideoDecoder;
use ffmpeg::format::context::Input;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::Rational;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::domain::model::{Frame, VideoInfo, DEFAULT_FPS};
use crate::domain::rules::SeekPolicy;
use crate::error::{TrimError, TrimResult};
use crate::ports::{FrameSource, SourceProvider};

/// Microseconds per second, the unit of container-level timestamps
const AV_TIME_BASE: f64 = 1_000_000.0;

/// Opens sources through FFmpeg; `crate::init` must have run first
#[derive(Debug, Default)]
pub struct LibavSourceProvider;

impl LibavSourceProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SourceProvider for LibavSourceProvider {
    type Source = LibavFrameSource;

    fn open(&self, path: &Path) -> TrimResult<LibavFrameSource> {
        LibavFrameSource::open(path)
    }
}

/// Decoder state that exists only while the source is open
struct DecodeState {
    input: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalingContext>,
    eof_sent: bool,
}

/// Sequential, seekable frame source backed by libavformat/libavcodec
pub struct LibavFrameSource {
    path: PathBuf,
    state: Option<DecodeState>,
    stream_index: usize,
    time_base: Rational,
    start_pts: i64,
    info: VideoInfo,
    position: u64,
    /// Frames below this index are decoded and discarded after a seek
    skip_until: Option<u64>,
    exhausted: bool,
}

impl LibavFrameSource {
    /// Open a video file, failing with `CannotOpen` or `EmptyVideo`
    pub fn open(path: &Path) -> TrimResult<Self> {
        let cannot_open = |message: String| TrimError::CannotOpen {
            path: path.display().to_string(),
            message,
        };

        if !path.is_file() {
            return Err(cannot_open("file not found".to_string()));
        }

        let input = ffmpeg::format::input(&path).map_err(|e| cannot_open(e.to_string()))?;

        let stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| cannot_open("no video stream".to_string()))?;
        let stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = match stream.start_time() {
            // AV_NOPTS_VALUE
            i64::MIN => 0,
            start => start,
        };

        let fps = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let decoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.decoder().video())
            .map_err(|e| cannot_open(format!("failed to create decoder: {}", e)))?;
        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(cannot_open("video stream has no dimensions".to_string()));
        }

        let frame_count = Self::frame_count(
            stream.frames(),
            stream.duration(),
            time_base,
            input.duration(),
            fps,
        );
        drop(stream);

        let info = VideoInfo::new(fps, frame_count, width, height);
        if info.is_empty() {
            return Err(TrimError::EmptyVideo {
                path: path.display().to_string(),
            });
        }

        info!(
            path = %path.display(),
            width,
            height,
            fps,
            frame_count,
            "Opened source"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: Some(DecodeState {
                input,
                decoder,
                scaler: None,
                eof_sent: false,
            }),
            stream_index,
            time_base,
            start_pts,
            info,
            position: 0,
            skip_until: None,
            exhausted: false,
        })
    }

    /// Container-reported frame count, else an estimate from the duration
    fn frame_count(
        nb_frames: i64,
        stream_duration: i64,
        time_base: Rational,
        container_duration: i64,
        fps: f64,
    ) -> u64 {
        if nb_frames > 0 {
            return nb_frames as u64;
        }

        let fps = if fps > 0.0 { fps } else { DEFAULT_FPS };
        let seconds = if stream_duration > 0 {
            stream_duration as f64 * f64::from(time_base)
        } else if container_duration > 0 {
            container_duration as f64 / AV_TIME_BASE
        } else {
            0.0
        };

        (seconds * fps).round().max(0.0) as u64
    }

    /// Frame index derived from a presentation timestamp
    fn index_for(&self, frame: &VideoFrame) -> u64 {
        let fps = self.info.effective_fps(DEFAULT_FPS);
        match frame.timestamp().or_else(|| frame.pts()) {
            Some(pts) => {
                let seconds = (pts - self.start_pts) as f64 * f64::from(self.time_base);
                (seconds * fps).round().max(0.0) as u64
            }
            None => self.position,
        }
    }

    /// Pull the next decoded frame out of libav, feeding packets as needed
    fn decode_next(&mut self) -> TrimResult<Option<VideoFrame>> {
        let stream_index = self.stream_index;
        let Some(state) = self.state.as_mut() else {
            return Ok(None);
        };

        loop {
            let mut decoded = VideoFrame::empty();
            if state.decoder.receive_frame(&mut decoded).is_ok() {
                return Ok(Some(decoded));
            }
            if state.eof_sent {
                return Ok(None);
            }

            match state.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != stream_index {
                        continue;
                    }
                    match state.decoder.send_packet(&packet) {
                        Ok(()) => {}
                        Err(ffmpeg::Error::InvalidData) => {
                            warn!("Skipping corrupt packet in {}", self.path.display());
                        }
                        Err(e) => {
                            return Err(TrimError::Decode {
                                message: format!("{}: {}", self.path.display(), e),
                            })
                        }
                    }
                }
                None => {
                    state.decoder.send_eof().map_err(|e| TrimError::Decode {
                        message: format!("{}: failed to flush decoder: {}", self.path.display(), e),
                    })?;
                    state.eof_sent = true;
                }
            }
        }
    }

    /// Convert a decoded frame to a packed RGB image
    fn to_rgb(&mut self, decoded: &VideoFrame) -> TrimResult<RgbImage> {
        let state = self.state.as_mut().ok_or_else(|| TrimError::Decode {
            message: "source closed".to_string(),
        })?;
        let (width, height) = (decoded.width(), decoded.height());

        let rebuild = match &state.scaler {
            Some(scaler) => {
                scaler.input().width != width
                    || scaler.input().height != height
                    || scaler.input().format != decoded.format()
            }
            None => true,
        };
        if rebuild {
            debug!("Creating scaler {:?} {}x{} -> RGB24", decoded.format(), width, height);
            state.scaler = Some(ScalingContext::get(
                decoded.format(),
                width,
                height,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )?);
        }

        let mut rgb = VideoFrame::empty();
        if let Some(scaler) = state.scaler.as_mut() {
            scaler.run(decoded, &mut rgb)?;
        }

        let stride = rgb.stride(0);
        let row_bytes = width as usize * 3;
        let data = rgb.data(0);
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }

        RgbImage::from_raw(width, height, buffer).ok_or_else(|| TrimError::Decode {
            message: format!("frame buffer too small for {}x{}", width, height),
        })
    }
}

impl FrameSource for LibavFrameSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn next_frame(&mut self) -> TrimResult<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }

        while let Some(decoded) = self.decode_next()? {
            let index = self.index_for(&decoded);
            if let Some(target) = self.skip_until {
                if index < target {
                    continue;
                }
                self.skip_until = None;
            }

            let image = self.to_rgb(&decoded)?;
            // Timestamps can repeat or jump; the cursor only moves forward
            let index = index.max(self.position);
            self.position = index + 1;
            return Ok(Some(Frame::new(index, image)));
        }

        self.exhausted = true;
        Ok(None)
    }

    fn seek(&mut self, target: i64) -> TrimResult<u64> {
        let target = SeekPolicy::clamp_absolute(target, self.info.frame_count);
        let Some(state) = self.state.as_mut() else {
            return Ok(self.position);
        };

        if target >= self.info.frame_count {
            self.position = target;
            self.exhausted = true;
            return Ok(target);
        }

        let fps = self.info.effective_fps(DEFAULT_FPS);
        let timestamp = (target as f64 / fps * AV_TIME_BASE) as i64;
        state.input.seek(timestamp, ..timestamp).map_err(|e| TrimError::Decode {
            message: format!("{}: seek to frame {} failed: {}", self.path.display(), target, e),
        })?;
        state.decoder.flush();
        state.eof_sent = false;

        self.skip_until = Some(target);
        self.position = target;
        self.exhausted = false;
        debug!("Seeked {} to frame {}", self.path.display(), target);
        Ok(target)
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            debug!("Closed source {}", self.path.display());
        }
        self.exhausted = true;
    }
}

impl Drop for LibavFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    if rate.numerator() > 0 && rate.denominator() > 0 {
        Some(f64::from(rate))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::encoder_libav::LibavEncoderBackend;
    use crate::domain::model::EncoderCandidate;
    use crate::ports::{EncoderBackend, FrameSink, SinkSpec};
    use image::Rgb;
    use tempfile::TempDir;

    /// Encode `frames` 64x64 frames at 30 fps with the built-in mpeg4 encoder
    fn write_clip(path: &Path, frames: u64) {
        crate::init().unwrap();
        let spec = SinkSpec {
            path: path.to_path_buf(),
            fps: 30.0,
            width: 64,
            height: 64,
        };
        let mut sink = LibavEncoderBackend::new()
            .open_sink(EncoderCandidate::Mpeg4, &spec)
            .unwrap();
        for index in 0..frames {
            let shade = (index * 4) as u8;
            let image = RgbImage::from_pixel(64, 64, Rgb([shade, 64, 255 - shade]));
            sink.write(&Frame::new(index, image)).unwrap();
        }
        sink.finish().unwrap();
    }

    #[test]
    fn test_frame_count_prefers_container_value() {
        assert_eq!(
            LibavFrameSource::frame_count(250, 0, Rational::new(1, 1000), 0, 25.0),
            250
        );
    }

    #[test]
    fn test_frame_count_estimated_from_stream_duration() {
        // 4 seconds in a 1/1000 time base at 30 fps
        assert_eq!(
            LibavFrameSource::frame_count(0, 4000, Rational::new(1, 1000), 0, 30.0),
            120
        );
    }

    #[test]
    fn test_frame_count_estimated_from_container_duration() {
        assert_eq!(
            LibavFrameSource::frame_count(0, 0, Rational::new(1, 1000), 2_000_000, 0.0),
            60
        );
        assert_eq!(LibavFrameSource::frame_count(0, 0, Rational::new(1, 1000), 0, 30.0), 0);
    }

    #[test]
    fn test_rational_to_f64() {
        assert_eq!(rational_to_f64(Rational::new(30000, 1001)).map(|f| (f * 100.0).round()), Some(2997.0));
        assert_eq!(rational_to_f64(Rational::new(0, 1)), None);
        assert_eq!(rational_to_f64(Rational::new(0, 0)), None);
    }

    #[test]
    fn test_missing_file_cannot_open() {
        let dir = TempDir::new().unwrap();
        let result = LibavFrameSource::open(&dir.path().join("missing.mp4"));
        assert!(matches!(result, Err(TrimError::CannotOpen { .. })));
    }

    #[test]
    fn test_garbage_file_cannot_open() {
        crate::init().unwrap();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.mp4");
        std::fs::write(&path, b"definitely not a video").unwrap();

        let result = LibavFrameSource::open(&path);
        assert!(matches!(result, Err(TrimError::CannotOpen { .. })));
    }

    #[test]
    fn test_decodes_every_frame_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        write_clip(&path, 60);

        let mut source = LibavFrameSource::open(&path).unwrap();
        assert_eq!(source.info().frame_count, 60);
        assert_eq!((source.info().width, source.info().height), (64, 64));
        assert!((source.info().fps - 30.0).abs() < 0.01);

        let mut indices = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            assert_eq!(frame.dimensions(), (64, 64));
            indices.push(frame.index);
        }
        assert_eq!(indices, (0..60).collect::<Vec<u64>>());
        assert_eq!(source.position(), 60);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_seek_lands_on_target_frame() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        write_clip(&path, 60);
        let mut source = LibavFrameSource::open(&path).unwrap();

        // Mid-GOP target: frames after the keyframe are decoded and dropped
        assert_eq!(source.seek(30).unwrap(), 30);
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.index, 30);
        assert_eq!(source.position(), 31);

        assert_eq!(source.seek(-5).unwrap(), 0);
        assert_eq!(source.next_frame().unwrap().unwrap().index, 0);

        // Past the end the source is exhausted until the next seek back
        assert_eq!(source.seek(1_000).unwrap(), 60);
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.seek(59).unwrap(), 59);
        assert_eq!(source.next_frame().unwrap().unwrap().index, 59);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        write_clip(&path, 10);
        let mut source = LibavFrameSource::open(&path).unwrap();
        source.next_frame().unwrap();

        source.close();
        source.close();
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(source.seek(5).unwrap(), 1);
    }
}
