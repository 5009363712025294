use crate::error::BbmError;
use crate::format::{Frame, Geometry, BACKGROUND};
use crate::layout::{LedLayout, CHAOSKNOTEN};

/// Converts raw *.bbm pixel data to and from the per-LED brightness model.
///
/// Decoding samples one green-channel pixel per LED. Encoding paints every
/// LED's brightness back over its write offsets on a solid background —
/// a visualization of the sculpture, not a lossless inverse: only the
/// brightness vector survives a decode/encode round trip.
#[derive(Clone, Copy)]
pub struct FrameCodec {
    geometry: Geometry,
    background: [u8; 3],
    layout: &'static LedLayout,
}

impl FrameCodec {
    pub fn new(geometry: Geometry, background: [u8; 3], layout: &'static LedLayout) -> Self {
        Self {
            geometry,
            background,
            layout,
        }
    }

    /// Codec for the one supported configuration: 51x66 RGB frames and
    /// the 42-LED Chaosknoten layout on a blue background.
    pub fn chaosknoten() -> Self {
        Self::new(Geometry::CHAOSKNOTEN, BACKGROUND, &CHAOSKNOTEN)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn layout(&self) -> &'static LedLayout {
        self.layout
    }

    /// Parse one frame from its duration and raw pixel data.
    pub fn decode_frame(&self, duration: u16, data: &[u8]) -> Result<Frame, BbmError> {
        let expected = self.geometry.frame_len();
        if data.len() != expected {
            return Err(BbmError::MalformedFrame {
                expected,
                actual: data.len(),
            });
        }
        let leds = self
            .layout
            .read_offsets
            .iter()
            .map(|&off| data[off * 3 + 1])
            .collect();
        Ok(Frame { duration, leds })
    }

    /// Render one frame back to raw pixel data, returning its duration
    /// and a buffer of exactly `geometry.frame_len()` bytes.
    pub fn encode_frame(&self, frame: &Frame) -> (u16, Vec<u8>) {
        let pixel_count = self.geometry.frame_len() / 3;
        let mut data = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            data.extend_from_slice(&self.background);
        }
        for (i, outs) in self.layout.write_offsets.iter().enumerate() {
            for &off in outs.iter() {
                data[off * 3] = frame.leds[i];
                data[off * 3 + 1] = frame.leds[i];
                data[off * 3 + 2] = 0;
            }
        }
        (frame.duration, data)
    }
}
