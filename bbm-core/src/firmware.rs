//! Firmware encoding of movies for the sculpture controller.
//!
//! Two stream layouts exist in the wild: the current controller takes one
//! duration byte plus nibble-packed brightness per frame; the older one
//! compresses frames with run-length encoding and deduplicates repeated
//! frames through back-references. Both are supported.

use std::io::{self, Write};

use crate::format::{Frame, Movie};

const TYPE_PLAIN: u8 = 0x00;
const TYPE_RLE: u8 = 0x10;
const TYPE_BACK_REF: u8 = 0x20;
const END_MARKER: u8 = 0xF0;

/// Largest value of the 12-bit duration and back-reference fields.
const FIELD_MAX: u32 = 0x3FF;

/// Which firmware stream layout to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FwVariant {
    /// One duration byte + nibble-packed brightness per frame,
    /// terminated by a two-zero-byte record.
    Simple,
    /// Run-length compression, back-references and a 0xF0 end marker.
    Compressed,
}

/// One encoded frame of the compressed stream. The type code lives in the
/// high bits of the first wire byte; in memory it is an explicit variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FwRecord {
    /// Nibble-packed brightness, no compression.
    Plain { duration: u16, data: Vec<u8> },
    /// Run-length encoded nibble stream.
    Rle { duration: u16, data: Vec<u8> },
    /// Byte distance back to an identical earlier frame.
    BackRef { back: u16 },
}

impl FwRecord {
    /// Serialize to the bit-packed wire form.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            FwRecord::Plain { duration, data } => tagged(TYPE_PLAIN, *duration, data),
            FwRecord::Rle { duration, data } => tagged(TYPE_RLE, *duration, data),
            FwRecord::BackRef { back } => tagged(TYPE_BACK_REF, *back, &[]),
        }
    }

    /// Length of the wire form without materializing it.
    pub fn encoded_len(&self) -> usize {
        match self {
            FwRecord::Plain { data, .. } | FwRecord::Rle { data, .. } => 2 + data.len(),
            FwRecord::BackRef { .. } => 2,
        }
    }
}

/// Pack a type code and 12-bit field into two header bytes, then the payload.
fn tagged(code: u8, field: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + data.len());
    out.push(code | ((field >> 8) as u8 & 0x0F));
    out.push((field & 0xFF) as u8);
    out.extend_from_slice(data);
    out
}

/// Pack brightness high nibbles two per byte, LED 0 in the high half of
/// byte 0. A trailing half byte (odd LED count) keeps the high half.
fn nibble_pack(leds: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(leds.len().div_ceil(2));
    let mut half = None;
    for &led in leds {
        let val = led >> 4;
        match half.take() {
            None => half = Some(val),
            Some(hi) => data.push(hi << 4 | val),
        }
    }
    if let Some(hi) = half {
        data.push(hi << 4);
    }
    data
}

/// Run-length encode the brightness high nibbles: one byte per run,
/// `(count-1) << 4 | value`, runs capped at 16.
fn nibble_rle(leds: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    let Some(&first) = leds.first() else {
        return data;
    };
    let mut val = first >> 4;
    let mut count = 0u8;
    for &led in leds {
        let nib = led >> 4;
        if nib == val && count < 0x10 {
            count += 1;
        } else {
            data.push((count - 1) << 4 | val);
            val = nib;
            count = 1;
        }
    }
    data.push((count - 1) << 4 | val);
    data
}

/// Duration in 6 ms steps, clamped to the 12-bit field.
fn duration_code(duration: u16) -> u16 {
    ((duration as u32 + 3) / 6).clamp(1, FIELD_MAX) as u16
}

/// Duration in 10 ms steps, clamped to one byte.
fn simple_duration(duration: u16) -> u8 {
    ((duration as u32 + 5) / 10).clamp(1, 255) as u8
}

/// Encode one frame for the compressed stream, picking RLE only when it
/// is strictly shorter than the plain packing.
pub fn encode_frame(frame: &Frame) -> FwRecord {
    let duration = duration_code(frame.duration);
    let plain = nibble_pack(&frame.leds);
    let rle = nibble_rle(&frame.leds);
    if rle.len() < plain.len() {
        FwRecord::Rle {
            duration,
            data: rle,
        }
    } else {
        FwRecord::Plain {
            duration,
            data: plain,
        }
    }
}

/// Encode all frames for the compressed stream, replacing a frame with a
/// back-reference when an identical earlier frame lies within reach of
/// the 12-bit distance field.
pub fn encode_movie(movie: &Movie) -> Vec<FwRecord> {
    let mut records: Vec<FwRecord> = Vec::new();
    let mut total_len = 0usize;
    for frame in &movie.frames {
        let mut record = encode_frame(frame);
        let mut offset = 0usize;
        for earlier in &records {
            if !matches!(earlier, FwRecord::BackRef { .. }) && *earlier == record {
                // distance from just past our two header bytes back to
                // the start of the matched record
                let back = total_len - offset + 2;
                if back <= FIELD_MAX as usize {
                    record = FwRecord::BackRef { back: back as u16 };
                    break;
                }
                // out of reach; a closer identical frame may follow
            }
            offset += earlier.encoded_len();
        }
        total_len += record.encoded_len();
        records.push(record);
    }
    records
}

/// Encode one frame for the simple stream.
pub fn encode_frame_simple(frame: &Frame) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + frame.leds.len().div_ceil(2));
    out.push(simple_duration(frame.duration));
    out.extend(nibble_pack(&frame.leds));
    out
}

/// Build the complete firmware byte stream as one byte record per frame
/// plus the variant's terminator record.
pub fn firmware_records(movie: &Movie, variant: FwVariant) -> Vec<Vec<u8>> {
    match variant {
        FwVariant::Simple => {
            let mut records: Vec<Vec<u8>> =
                movie.frames.iter().map(encode_frame_simple).collect();
            records.push(vec![0, 0]);
            records
        }
        FwVariant::Compressed => {
            let mut records: Vec<Vec<u8>> = encode_movie(movie)
                .iter()
                .map(FwRecord::to_bytes)
                .collect();
            let total: usize = records.iter().map(Vec::len).sum();
            let mut end = vec![END_MARKER];
            if (total + end.len()) % 2 != 0 {
                end.push(0); // loader wants an even stream length
            }
            records.push(end);
            records
        }
    }
}

/// Write the firmware stream as an assembler include file, one `.db` line
/// per up to 8 bytes, each record starting a fresh line.
pub fn write_include<W: Write>(writer: &mut W, movie: &Movie, variant: FwVariant) -> io::Result<()> {
    for record in firmware_records(movie, variant) {
        for chunk in record.chunks(8) {
            let vals: Vec<String> = chunk.iter().map(|b| format!("0x{b:02X}")).collect();
            writeln!(writer, "        .db     {}", vals.join(","))?;
        }
    }
    Ok(())
}
