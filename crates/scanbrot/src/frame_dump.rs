//! Frame dump format: a fixed 16-byte header followed by the store bytes.
//!
//! ```text
//! ┌────────┬─────────┬──────────┬──────────────┬────────────────────┐
//! │ "SCNB" │ width   │ height   │ generation   │ width*height bytes │
//! │ [u8;4] │ u32 LE  │ u32 LE   │ u32 LE       │ row-major pixels   │
//! └────────┴─────────┴──────────┴──────────────┴────────────────────┘
//! ```

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use bytemuck::{Pod, Zeroable};

use crate::error::{SimError, SimResult};

/// Magic bytes opening every dump.
pub const FRAME_MAGIC: [u8; 4] = *b"SCNB";

/// Dump header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct FrameHeader {
    /// [`FRAME_MAGIC`].
    pub magic: [u8; 4],
    /// Pixels per row, little-endian.
    pub width: u32,
    /// Rows, little-endian.
    pub height: u32,
    /// Generation the frame was rendered under, little-endian.
    pub generation: u32,
}

impl FrameHeader {
    /// Builds a header.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(width: usize, height: usize, generation: u16) -> Self {
        Self {
            magic: FRAME_MAGIC,
            width: (width as u32).to_le(),
            height: (height as u32).to_le(),
            generation: u32::from(generation).to_le(),
        }
    }

    /// Pixel bytes that follow the header.
    #[must_use]
    pub fn pixel_len(&self) -> usize {
        u32::from_le(self.width) as usize * u32::from_le(self.height) as usize
    }
}

/// Writes a header and its pixels.
///
/// # Errors
///
/// Returns [`SimError::BadDump`] when `pixels` does not match the header
/// geometry, or [`SimError::Io`] on write failure.
pub fn write_frame<W: Write>(out: &mut W, header: &FrameHeader, pixels: &[u8]) -> SimResult<()> {
    if pixels.len() != header.pixel_len() {
        return Err(SimError::BadDump("pixel count does not match header"));
    }
    out.write_all(bytemuck::bytes_of(header))?;
    out.write_all(pixels)?;
    out.flush()?;
    Ok(())
}

/// Reads a header and its pixels.
///
/// # Errors
///
/// Returns [`SimError::BadDump`] on a wrong magic, or [`SimError::Io`] on a
/// short or failed read.
pub fn read_frame<R: Read>(input: &mut R) -> SimResult<(FrameHeader, Vec<u8>)> {
    let mut header = FrameHeader::zeroed();
    input.read_exact(bytemuck::bytes_of_mut(&mut header))?;
    if header.magic != FRAME_MAGIC {
        return Err(SimError::BadDump("bad magic"));
    }
    let mut pixels = vec![0; header.pixel_len()];
    input.read_exact(&mut pixels)?;
    Ok((header, pixels))
}

/// Writes a dump file at `path`.
///
/// # Errors
///
/// As [`write_frame`], plus file creation failures.
pub fn dump_to_path(path: impl AsRef<Path>, header: &FrameHeader, pixels: &[u8]) -> SimResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_frame(&mut out, header, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), 16);
        let header = FrameHeader::new(960, 544, 7);
        assert_eq!(&bytemuck::bytes_of(&header)[..4], b"SCNB");
        assert_eq!(header.pixel_len(), 960 * 544);
    }

    #[test]
    fn test_write_then_read() {
        let header = FrameHeader::new(3, 2, 1);
        let pixels = [0, 1, 2, 3, 4, 255];
        let mut bytes = Vec::new();
        write_frame(&mut bytes, &header, &pixels).unwrap();
        assert_eq!(bytes.len(), 16 + 6);

        let (read_header, read_pixels) = read_frame(&mut bytes.as_slice()).unwrap();
        assert_eq!(read_header, header);
        assert_eq!(read_pixels, pixels);
    }

    #[test]
    fn test_rejects_bad_input() {
        let header = FrameHeader::new(2, 2, 0);
        let mut sink = Vec::new();
        assert!(matches!(
            write_frame(&mut sink, &header, &[1, 2, 3]),
            Err(SimError::BadDump(_))
        ));

        let garbage = [0_u8; 16];
        assert!(matches!(read_frame(&mut &garbage[..]), Err(SimError::BadDump(_))));
        assert!(matches!(read_frame(&mut &b"SCN"[..]), Err(SimError::Io(_))));
    }
}
