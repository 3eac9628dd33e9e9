//! FFmpeg segment encoder using libav bindings
//!
//! Each sink owns one MP4 output with a single video stream. Frames arrive
//! as packed RGB24 and are converted to YUV420P before encoding.

use ffmpeg_next as ffmpeg;
use ffmpeg::codec::{self, Id};
use ffmpeg::encoder::Video as VideoEncoder;
use ffmpeg::format::context::Output;
use ffmpeg::format::{self, Pixel};
use ffmpeg::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::{Codec, Dictionary, Packet, Rational};
use tracing::{debug, info};

use crate::domain::model::{EncoderCandidate, Frame};
use crate::error::{TrimError, TrimResult};
use crate::ports::{EncoderBackend, FrameSink, SinkSpec};

/// Creates libav-backed segment sinks; `crate::init` must have run first
#[derive(Debug, Default)]
pub struct LibavEncoderBackend;

impl LibavEncoderBackend {
    pub fn new() -> Self {
        Self
    }

    /// Look up the libav codec behind a candidate
    fn find_codec(candidate: EncoderCandidate) -> Option<Codec> {
        match candidate {
            EncoderCandidate::Libx264 => ffmpeg::encoder::find_by_name("libx264"),
            EncoderCandidate::H264 => ffmpeg::encoder::find(Id::H264),
            EncoderCandidate::OpenH264 => ffmpeg::encoder::find_by_name("libopenh264"),
            EncoderCandidate::Mpeg4 => ffmpeg::encoder::find(Id::MPEG4),
        }
    }

    /// Private options for the encoder that will actually run
    fn encoder_options(codec: &Codec) -> Dictionary<'static> {
        let mut options = Dictionary::new();
        match codec.name() {
            "libx264" => {
                options.set("crf", "18");
                options.set("preset", "medium");
            }
            "mpeg4" => {
                options.set("qscale", "3");
            }
            _ => {}
        }
        options
    }
}

impl EncoderBackend for LibavEncoderBackend {
    type Sink = LibavSegmentSink;

    fn open_sink(&self, candidate: EncoderCandidate, spec: &SinkSpec) -> TrimResult<LibavSegmentSink> {
        let codec = Self::find_codec(candidate).ok_or_else(|| TrimError::Encode {
            message: format!("Encoder {} is not available in this FFmpeg build", candidate),
        })?;
        LibavSegmentSink::open(codec, spec)
    }
}

/// One open MP4 segment
pub struct LibavSegmentSink {
    octx: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    encoder_time_base: Rational,
    next_pts: i64,
    width: u32,
    height: u32,
    finished: bool,
}

impl LibavSegmentSink {
    fn open(codec: Codec, spec: &SinkSpec) -> TrimResult<Self> {
        let encode_err = |what: &str, e: ffmpeg::Error| TrimError::Encode {
            message: format!("{} for {}: {}", what, spec.path.display(), e),
        };

        let mut octx = format::output(&spec.path).map_err(|e| encode_err("Failed to create output", e))?;
        let global_header = octx
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let frame_rate = frame_rate_for(spec.fps);
        let time_base = frame_rate.invert();

        let mut encoder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| encode_err("Failed to create encoder", e))?;
        encoder.set_width(spec.width);
        encoder.set_height(spec.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(frame_rate));
        if global_header {
            encoder.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder
            .open_as_with(codec, LibavEncoderBackend::encoder_options(&codec))
            .map_err(|e| encode_err("Failed to open encoder", e))?;

        let mut ost = octx
            .add_stream(codec)
            .map_err(|e| encode_err("Failed to add stream", e))?;
        ost.set_parameters(&encoder);
        ost.set_time_base(time_base);

        let mut container_opts = Dictionary::new();
        container_opts.set("movflags", "faststart");
        octx.write_header_with(container_opts)
            .map_err(|e| encode_err("Failed to write header", e))?;

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            spec.width,
            spec.height,
            Pixel::YUV420P,
            spec.width,
            spec.height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| encode_err("Failed to create scaler", e))?;

        info!(
            path = %spec.path.display(),
            codec = codec.name(),
            fps = spec.fps,
            "Encoder initialized: {}x{}",
            spec.width,
            spec.height
        );

        Ok(Self {
            octx,
            encoder,
            scaler,
            encoder_time_base: time_base,
            next_pts: 0,
            width: spec.width,
            height: spec.height,
            finished: false,
        })
    }

    /// Drain every packet the encoder has ready into the container
    fn drain_packets(&mut self) -> TrimResult<()> {
        let stream_time_base = self
            .octx
            .stream(0)
            .map(|stream| stream.time_base())
            .unwrap_or(self.encoder_time_base);

        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet.write_interleaved(&mut self.octx).map_err(|e| TrimError::Encode {
                message: format!("Failed to write packet: {}", e),
            })?;
        }
        Ok(())
    }
}

impl FrameSink for LibavSegmentSink {
    fn write(&mut self, frame: &Frame) -> TrimResult<()> {
        if self.finished {
            return Err(TrimError::Encode {
                message: "Segment already finalized".to_string(),
            });
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(TrimError::FrameSizeMismatch {
                expected: (self.width, self.height),
                actual: frame.dimensions(),
            });
        }

        let mut rgb = VideoFrame::new(Pixel::RGB24, self.width, self.height);
        let stride = rgb.stride(0);
        let row_bytes = self.width as usize * 3;
        let pixels = frame.image.as_raw();
        let plane = rgb.data_mut(0);
        for row in 0..self.height as usize {
            let src = row * row_bytes;
            let dst = row * stride;
            plane[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
        }

        let mut yuv = VideoFrame::empty();
        self.scaler.run(&rgb, &mut yuv)?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder.send_frame(&yuv).map_err(|e| TrimError::Encode {
            message: format!("Failed to send frame to encoder: {}", e),
        })?;
        self.drain_packets()
    }

    fn finish(&mut self) -> TrimResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        self.encoder.send_eof().map_err(|e| TrimError::Encode {
            message: format!("Failed to flush encoder: {}", e),
        })?;
        self.drain_packets()?;
        self.octx.write_trailer().map_err(|e| TrimError::Encode {
            message: format!("Failed to write trailer: {}", e),
        })?;
        debug!("Segment finalized after {} frames", self.next_pts);
        Ok(())
    }
}

impl Drop for LibavSegmentSink {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.finish() {
                tracing::error!("Failed to finalize segment on drop: {}", e);
            }
        }
    }
}

/// Frame rate as an exact rational, kept to millihertz precision
fn frame_rate_for(fps: f64) -> Rational {
    let millis = (fps * 1000.0).round().clamp(1.0, i32::MAX as f64) as i32;
    Rational::new(millis, 1000).reduce()
}
