//! Audio header parsing over a truncated byte window

use std::io::{Cursor, Read, Result as IoResult, Seek, SeekFrom};

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Leading bytes of a remote resource
///
/// Reports the full resource length so that container readers can size their
/// data regions, but refuses seeking since most of the resource is absent.
struct PartialSource {
    inner: Cursor<Vec<u8>>,
    total_len: Option<u64>,
}

impl Read for PartialSource {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.inner.read(buf)
    }
}

impl Seek for PartialSource {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        self.inner.seek(pos)
    }
}

impl MediaSource for PartialSource {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        self.total_len
    }
}

/// Duration in seconds of the resource whose first bytes are `bytes`
///
/// Returns `None` when the window does not contain enough of a header.
pub(crate) fn duration_from_header(
    bytes: &[u8],
    total_len: Option<u64>,
    extension: Option<&str>,
) -> Option<f64> {
    container_duration(bytes, total_len, extension)
        .or_else(|| mpeg_cbr_duration(bytes, total_len?))
        .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
}

fn container_duration(bytes: &[u8], total_len: Option<u64>, extension: Option<&str>) -> Option<f64> {
    let source = PartialSource {
        inner: Cursor::new(bytes.to_vec()),
        total_len,
    };
    let mss = MediaSourceStream::new(Box::new(source), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .ok()?;
    let track = probed.format.default_track()?;
    let n_frames = track.codec_params.n_frames?;
    let sample_rate = track.codec_params.sample_rate.filter(|rate| *rate > 0)?;

    Some(n_frames as f64 / sample_rate as f64)
}

const ID3V2_HEADER_LEN: usize = 10;

/// kbps by bitrate index, MPEG-1 layers I to III
const MPEG1_BITRATES: [[u32; 15]; 3] = [
    [0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448],
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384],
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
];

/// kbps by bitrate index, MPEG-2 and 2.5; layers II and III share a table
const MPEG2_BITRATES: [[u32; 15]; 2] = [
    [0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

/// Constant-bitrate estimate for a bare MPEG audio stream
///
/// Xing/Info-tagged files are handled by the container reader; this covers the
/// common case of a CBR file with no frame count anywhere in its header. The
/// first frame must start right after the ID3v2 tag (zero padding allowed).
pub(crate) fn mpeg_cbr_duration(bytes: &[u8], total_len: u64) -> Option<f64> {
    let mut offset = id3v2_len(bytes)?;
    while bytes.get(offset) == Some(&0) {
        offset += 1;
    }

    let header = bytes.get(offset..offset + 4)?;
    if header[0] != 0xFF || header[1] & 0xE0 != 0xE0 {
        return None;
    }

    let version = (header[1] >> 3) & 0x03;
    let layer = (header[1] >> 1) & 0x03;
    let bitrate_index = usize::from(header[2] >> 4);
    let sample_rate_index = (header[2] >> 2) & 0x03;
    if version == 0b01 || layer == 0b00 || sample_rate_index == 0b11 {
        return None;
    }
    if bitrate_index == 0 || bitrate_index == 15 {
        return None;
    }

    // layer bits: 11 = I, 10 = II, 01 = III
    let layer_row = usize::from(3 - layer);
    let kbps = if version == 0b11 {
        MPEG1_BITRATES[layer_row][bitrate_index]
    } else {
        MPEG2_BITRATES[layer_row.min(1)][bitrate_index]
    };

    let audio_len = total_len.checked_sub(offset as u64)?;
    Some(audio_len as f64 * 8.0 / (f64::from(kbps) * 1000.0))
}

/// Length of a leading ID3v2 tag, 0 if there is none, `None` if the tag
/// runs past the window
fn id3v2_len(bytes: &[u8]) -> Option<usize> {
    if !bytes.starts_with(b"ID3") {
        return Some(0);
    }
    let header = bytes.get(..ID3V2_HEADER_LEN)?;
    let size = header[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if header[5] & 0x10 != 0 { ID3V2_HEADER_LEN } else { 0 };
    let len = ID3V2_HEADER_LEN + size + footer;

    (len < bytes.len()).then_some(len)
}
