use std::io::Write;

use crate::codec::FrameCodec;
use crate::error::BbmError;
use crate::format::{Movie, FRAME_DATA_OFFSET, FRAME_MARKER, MAGIC};

/// Serializes movies back to the *.bbm container.
pub struct BbmWriter<W: Write> {
    writer: W,
    codec: FrameCodec,
}

impl<W: Write> BbmWriter<W> {
    pub fn new(writer: W, codec: FrameCodec) -> Self {
        Self { writer, codec }
    }

    /// Write the whole movie, flush, and hand back the inner writer.
    pub fn write_movie(mut self, movie: &Movie) -> Result<W, BbmError> {
        let g = self.codec.geometry();

        // main header
        self.writer.write_all(&MAGIC.to_be_bytes())?;
        self.writer.write_all(&g.height.to_be_bytes())?;
        self.writer.write_all(&g.width.to_be_bytes())?;
        self.writer.write_all(&g.channels.to_be_bytes())?;
        self.writer.write_all(&g.maxval.to_be_bytes())?;

        // main information
        self.writer
            .write_all(&(movie.frames.len() as u32).to_be_bytes())?;
        self.writer
            .write_all(&movie.total_duration().to_be_bytes())?;
        self.writer.write_all(&FRAME_DATA_OFFSET.to_be_bytes())?;

        // frame start marker, no other sub-headers
        self.writer.write_all(&FRAME_MARKER.to_be_bytes())?;

        for frame in &movie.frames {
            let (duration, data) = self.codec.encode_frame(frame);
            self.writer.write_all(&duration.to_be_bytes())?;
            self.writer.write_all(&data)?;
        }

        self.writer.flush()?;
        Ok(self.writer)
    }
}
