//! WAV encoding and decoding.

use crate::FormatError;
use ns_ir::{AudioBlock, Sample, SampleAsset, SAMPLE_RATE};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::error;

const FORMAT_PCM: u16 = 1;
const FORMAT_FLOAT: u16 = 3;

// --- Writing ---

/// Write rendered blocks as 16-bit stereo PCM at the engine rate.
pub fn write_wav(w: &mut impl Write, blocks: &[AudioBlock]) -> std::io::Result<()> {
    w.write_all(&blocks_to_wav(blocks))
}

pub fn blocks_to_wav(blocks: &[AudioBlock]) -> Vec<u8> {
    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let frames = blocks.len() * ns_ir::BLOCK_SIZE;
    let data_size = (frames * block_align as usize) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    buf.extend_from_slice(&(SAMPLE_RATE * block_align as u32).to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for s in blocks.iter().flat_map(AudioBlock::iter) {
        buf.extend_from_slice(&to_i16(s.left).to_le_bytes());
        buf.extend_from_slice(&to_i16(s.right).to_le_bytes());
    }
    buf
}

fn to_i16(x: f32) -> i16 {
    (x.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

// --- Reading ---

/// Decode a WAV file into an asset, or log why not and return an empty one.
///
/// Consumers treat the empty asset as silence.
pub fn load_wav(data: &[u8], name: &str) -> SampleAsset {
    match decode_wav(data, name) {
        Ok(asset) => asset,
        Err(err) => {
            error!(name, %err, "could not load sample");
            SampleAsset::empty(name)
        }
    }
}

/// Read and decode a WAV file, named after its stem.
///
/// The asset remembers `path` as its source even when it is empty, so a
/// project that refers to a missing file keeps the reference on save.
pub fn read_wav_file(path: &Path) -> SampleAsset {
    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("sample");
    let asset = match fs::read(path) {
        Ok(data) => load_wav(&data, name),
        Err(err) => {
            error!(path = %path.display(), %err, "could not read sample");
            SampleAsset::empty(name)
        }
    };
    asset.with_source(&path.to_string_lossy())
}

/// Decode 8/16-bit PCM or 32-bit float WAV, mono or stereo, at 44.1 kHz.
pub fn decode_wav(data: &[u8], name: &str) -> Result<SampleAsset, FormatError> {
    let header = parse_header(data)?;
    let end = (header.data_offset + header.data_size).min(data.len());
    let raw = &data[header.data_offset..end];

    let read: fn(&[u8]) -> f32 = match (header.format, header.bits_per_sample) {
        (FORMAT_PCM, 8) => |b| (b[0] as f32 - 128.0) / 128.0,
        (FORMAT_PCM, 16) => |b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0,
        (FORMAT_FLOAT, 32) => |b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
        (format, bits) => {
            return Err(FormatError::Unsupported(format!("format {format} at {bits} bits")))
        }
    };

    let width = header.bits_per_sample as usize / 8;
    let frame_len = width * header.num_channels as usize;
    let frames = raw
        .chunks_exact(frame_len)
        .map(|frame| {
            let left = read(&frame[..width]);
            let right = if header.num_channels == 2 { read(&frame[width..]) } else { left };
            Sample::new(left, right)
        })
        .collect();
    Ok(SampleAsset::new(name, frames))
}

struct WavHeader {
    format: u16,
    num_channels: u16,
    bits_per_sample: u16,
    data_offset: usize,
    data_size: usize,
}

fn parse_header(data: &[u8]) -> Result<WavHeader, FormatError> {
    if data.len() < 12 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<(u16, u16, u32, u16)> = None;
    let mut data_chunk: Option<(usize, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32_le(data, pos + 4) as usize;

        if chunk_id == b"fmt " {
            if chunk_size < 16 || pos + 24 > data.len() {
                return Err(FormatError::UnexpectedEof);
            }
            let format = read_u16_le(data, pos + 8);
            let channels = read_u16_le(data, pos + 10);
            let rate = read_u32_le(data, pos + 12);
            let bits = read_u16_le(data, pos + 22);
            fmt = Some((format, channels, rate, bits));
        } else if chunk_id == b"data" {
            data_chunk = Some((pos + 8, chunk_size));
        }

        pos = pos.saturating_add(8 + chunk_size);
        if pos % 2 != 0 {
            pos += 1;
        }
    }

    let (format, num_channels, sample_rate, bits_per_sample) =
        fmt.ok_or(FormatError::InvalidHeader)?;
    let (data_offset, data_size) = data_chunk.ok_or(FormatError::InvalidHeader)?;

    if !(1..=2).contains(&num_channels) {
        return Err(FormatError::Unsupported(format!("{num_channels} channels")));
    }
    if sample_rate != SAMPLE_RATE {
        return Err(FormatError::Unsupported(format!("{sample_rate} Hz")));
    }

    Ok(WavHeader { format, num_channels, bits_per_sample, data_offset, data_size })
}

fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}
