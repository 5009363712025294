use std::io;

/// Errors raised while parsing or converting *.bbm movies.
#[derive(Debug, thiserror::Error)]
pub enum BbmError {
    #[error("invalid magic 0x{found:08X} != 0x23542666")]
    InvalidMagic { found: u32 },

    #[error("invalid format {width}x{height}-{channels}/{maxval}")]
    InvalidFormat {
        height: u16,
        width: u16,
        channels: u16,
        maxval: u16,
    },

    #[error("truncated sub-header")]
    TruncatedHeader,

    #[error("truncated frame")]
    TruncatedFrame,

    #[error("malformed frame data: {actual} bytes, expected {expected}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
