use std::io::{self, Read};

use crate::codec::FrameCodec;
use crate::error::BbmError;
use crate::format::{Movie, FRAME_MARKER, MAGIC};

/// Parses *.bbm movies.
pub struct BbmReader<R: Read> {
    reader: R,
    codec: FrameCodec,
}

impl<R: Read> BbmReader<R> {
    pub fn new(reader: R, codec: FrameCodec) -> Self {
        Self { reader, codec }
    }

    /// Read the whole movie. Any failure aborts the parse; no partial
    /// movie is returned.
    pub fn read_movie(mut self) -> Result<Movie, BbmError> {
        // main header
        let magic = self.read_u32()?;
        if magic != MAGIC {
            return Err(BbmError::InvalidMagic { found: magic });
        }
        let height = self.read_u16()?;
        let width = self.read_u16()?;
        let channels = self.read_u16()?;
        let maxval = self.read_u16()?;
        let geometry = *self.codec.geometry();
        if (height, width, channels, maxval)
            != (
                geometry.height,
                geometry.width,
                geometry.channels,
                geometry.maxval,
            )
        {
            return Err(BbmError::InvalidFormat {
                height,
                width,
                channels,
                maxval,
            });
        }

        // main information; total duration and frame pointer are not
        // needed to locate the frames
        let frame_count = self.read_u32()?;
        let _total_duration = self.read_u32()?;
        let _frame_ptr = self.read_u32()?;

        // skip additional sub-headers until the frame start marker
        loop {
            let sub_magic = self.read_u32()?;
            if sub_magic == FRAME_MARKER {
                break;
            }
            let sub_size = self.read_u16()?;
            if sub_size < 6 {
                return Err(BbmError::TruncatedHeader);
            }
            self.skip(sub_size as u64 - 6)?;
        }

        // frame records
        let frame_len = self.codec.geometry().frame_len();
        let mut data = vec![0u8; frame_len];
        let mut frames = Vec::with_capacity(frame_count as usize);
        for _ in 0..frame_count {
            let duration = self.read_frame_u16()?;
            self.reader
                .read_exact(&mut data)
                .map_err(map_frame_eof)?;
            frames.push(self.codec.decode_frame(duration, &data)?);
        }

        Ok(Movie { frames })
    }

    fn read_u16(&mut self) -> Result<u16, BbmError> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&mut self) -> Result<u32, BbmError> {
        let mut buf = [0u8; 4];
        self.reader.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Like `read_u16`, but a short read means the frame region ended
    /// before `frame_count` records were seen.
    fn read_frame_u16(&mut self) -> Result<u16, BbmError> {
        let mut buf = [0u8; 2];
        self.reader.read_exact(&mut buf).map_err(map_frame_eof)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn skip(&mut self, n: u64) -> Result<(), BbmError> {
        let copied = io::copy(&mut self.reader.by_ref().take(n), &mut io::sink())?;
        if copied < n {
            return Err(BbmError::TruncatedHeader);
        }
        Ok(())
    }
}

fn map_frame_eof(err: io::Error) -> BbmError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        BbmError::TruncatedFrame
    } else {
        BbmError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Geometry;

    /// Build a well-formed movie file with the given frame payloads,
    /// optionally inserting extra sub-headers before the frame marker.
    fn bbm_bytes(frames: &[(u16, Vec<u8>)], sub_headers: &[&[u8]]) -> Vec<u8> {
        let g = Geometry::CHAOSKNOTEN;
        let mut buf = Vec::new();
        buf.extend(MAGIC.to_be_bytes());
        buf.extend(g.height.to_be_bytes());
        buf.extend(g.width.to_be_bytes());
        buf.extend(g.channels.to_be_bytes());
        buf.extend(g.maxval.to_be_bytes());
        buf.extend((frames.len() as u32).to_be_bytes());
        let total: u32 = frames.iter().map(|(d, _)| *d as u32).sum();
        buf.extend(total.to_be_bytes());
        buf.extend(24u32.to_be_bytes());
        for payload in sub_headers {
            buf.extend(0x4D455441u32.to_be_bytes()); // arbitrary magic
            buf.extend(((payload.len() + 6) as u16).to_be_bytes());
            buf.extend(*payload);
        }
        buf.extend(FRAME_MARKER.to_be_bytes());
        for (duration, data) in frames {
            buf.extend(duration.to_be_bytes());
            buf.extend(data);
        }
        buf
    }

    fn reader(bytes: Vec<u8>) -> BbmReader<io::Cursor<Vec<u8>>> {
        BbmReader::new(io::Cursor::new(bytes), FrameCodec::chaosknoten())
    }

    #[test]
    fn reads_frames_and_durations() {
        let g = Geometry::CHAOSKNOTEN;
        let mut data = vec![0u8; g.frame_len()];
        data[408 * 3 + 1] = 0x77; // green of LED 0's read pixel
        let bytes = bbm_bytes(&[(100, data), (250, vec![0u8; g.frame_len()])], &[]);

        let movie = reader(bytes).read_movie().unwrap();
        assert_eq!(movie.frames.len(), 2);
        assert_eq!(movie.frames[0].duration, 100);
        assert_eq!(movie.frames[0].leds[0], 0x77);
        assert_eq!(movie.frames[1].duration, 250);
        assert_eq!(movie.total_duration(), 350);
    }

    #[test]
    fn skips_unknown_sub_headers() {
        let g = Geometry::CHAOSKNOTEN;
        let bytes = bbm_bytes(
            &[(100, vec![0u8; g.frame_len()])],
            &[b"some metadata".as_slice(), &[]],
        );
        let movie = reader(bytes).read_movie().unwrap();
        assert_eq!(movie.frames.len(), 1);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = bbm_bytes(&[], &[]);
        bytes[0] = 0;
        match reader(bytes).read_movie() {
            Err(BbmError::InvalidMagic { found }) => assert_eq!(found, 0x0054_2666),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_geometry_before_frames() {
        let mut bytes = bbm_bytes(&[], &[]);
        // height 51 -> 52
        bytes[4..6].copy_from_slice(&52u16.to_be_bytes());
        match reader(bytes).read_movie() {
            Err(BbmError::InvalidFormat { height, .. }) => assert_eq!(height, 52),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn rejects_undersized_sub_header() {
        let mut bytes = bbm_bytes(&[], &[]);
        // replace the frame marker with a sub-header of size 5
        let marker_at = bytes.len() - 4;
        bytes.truncate(marker_at);
        bytes.extend(0x4D455441u32.to_be_bytes());
        bytes.extend(5u16.to_be_bytes());
        assert!(matches!(
            reader(bytes).read_movie(),
            Err(BbmError::TruncatedHeader)
        ));
    }

    #[test]
    fn rejects_truncated_frame_data() {
        let g = Geometry::CHAOSKNOTEN;
        let mut bytes = bbm_bytes(&[(100, vec![0u8; g.frame_len()])], &[]);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(
            reader(bytes).read_movie(),
            Err(BbmError::TruncatedFrame)
        ));
    }

    #[test]
    fn rejects_missing_frames() {
        let mut bytes = bbm_bytes(&[], &[]);
        // claim one frame but provide none
        bytes[12..16].copy_from_slice(&1u32.to_be_bytes());
        assert!(matches!(
            reader(bytes).read_movie(),
            Err(BbmError::TruncatedFrame)
        ));
    }
}
