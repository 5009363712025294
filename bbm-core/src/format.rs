/// Magic number at the start of every *.bbm file.
pub const MAGIC: u32 = 0x2354_2666;

/// Sub-header magic ("frms") marking the start of frame data.
pub const FRAME_MARKER: u32 = 0x6672_6D73;

/// Frame-data offset written into the main info block. The original
/// tooling emits this as a constant rather than recomputing it.
pub const FRAME_DATA_OFFSET: u32 = 24;

/// Duration of a default-constructed frame, in milliseconds.
pub const DEFAULT_FRAME_DURATION: u16 = 100;

/// Background color (RGB) for pixels not covered by any LED on encode.
pub const BACKGROUND: [u8; 3] = [0, 0, 255];

/// Pixel-grid geometry of a movie. The container format carries these
/// fields in its main header; only one configuration is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub height: u16,
    pub width: u16,
    pub channels: u16,
    pub maxval: u16,
}

impl Geometry {
    /// The 51x66 RGB grid the Chaosknoten movies use.
    pub const CHAOSKNOTEN: Geometry = Geometry {
        height: 51,
        width: 66,
        channels: 3,
        maxval: 255,
    };

    /// Byte length of one frame's pixel data.
    pub fn frame_len(&self) -> usize {
        self.height as usize * self.width as usize * self.channels as usize
    }
}

/// One movie frame: a display duration plus the brightness of every
/// logical LED, extracted from the frame's pixel data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Display duration in milliseconds.
    pub duration: u16,
    /// Brightness per logical LED, 0..=255.
    pub leds: Vec<u8>,
}

impl Frame {
    /// A dark frame with the default duration.
    pub fn new(led_count: usize) -> Self {
        Self {
            duration: DEFAULT_FRAME_DURATION,
            leds: vec![0; led_count],
        }
    }
}

/// An ordered sequence of frames.
#[derive(Clone, Debug, Default)]
pub struct Movie {
    pub frames: Vec<Frame>,
}

impl Movie {
    /// Sum of all frame durations in milliseconds.
    pub fn total_duration(&self) -> u32 {
        self.frames.iter().map(|f| f.duration as u32).sum()
    }
}
