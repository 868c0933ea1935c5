//! Minimal single-IDAT PNG writer for 8-bit RGBA rasters.

use crate::error::{AssetError, Result};
use flate2::{write::ZlibEncoder, Compression, Crc};
use image::RgbaImage;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const BIT_DEPTH: u8 = 8;
const COLOR_TYPE_RGBA: u8 = 6;
const SRGB_PERCEPTUAL: u8 = 0;

/// Options for [`PngWriter`].
#[derive(Debug, Clone, Copy)]
pub struct PngWriter {
    pub srgb: bool,
    pub compression: Compression,
}

impl Default for PngWriter {
    fn default() -> Self {
        Self {
            srgb: true,
            compression: Compression::best(),
        }
    }
}

impl PngWriter {
    pub fn new(srgb: bool) -> Self {
        Self {
            srgb,
            ..Self::default()
        }
    }

    pub fn encode(&self, raster: &RgbaImage) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to(raster, &mut buf)?;
        Ok(buf)
    }

    pub fn write_to<W: Write>(&self, raster: &RgbaImage, mut w: W) -> Result<()> {
        let idat = self.compress_scanlines(raster)?;

        w.write_all(&SIGNATURE)?;
        write_chunk(&mut w, b"IHDR", &ihdr(raster.width(), raster.height()))?;
        if self.srgb {
            write_optional_chunk(&mut w, b"sRGB", &[SRGB_PERCEPTUAL])?;
        }
        write_chunk(&mut w, b"IDAT", &idat)?;
        write_chunk(&mut w, b"IEND", &[])?;
        w.flush()?;
        Ok(())
    }

    pub fn write_file(&self, raster: &RgbaImage, path: &Path) -> Result<()> {
        let out_file = BufWriter::new(File::create(path)?);
        self.write_to(raster, out_file)
    }

    fn compress_scanlines(&self, raster: &RgbaImage) -> Result<Vec<u8>> {
        let stride = raster.width() as usize * 4;
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression);
        if stride > 0 {
            for row in raster.as_raw().chunks_exact(stride) {
                // filter type 0: none
                encoder.write_all(&[0])?;
                encoder.write_all(row)?;
            }
        } else {
            for _ in 0..raster.height() {
                encoder.write_all(&[0])?;
            }
        }
        Ok(encoder.finish()?)
    }
}

fn ihdr(width: u32, height: u32) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = BIT_DEPTH;
    data[9] = COLOR_TYPE_RGBA;
    // compression, filter and interlace methods stay 0
    data
}

/// CRC-32 over the chunk type followed by its payload.
pub fn chunk_crc(kind: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    crc.sum()
}

/// Length, type, payload and CRC of one chunk.
fn chunk_bytes(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 12);
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(kind, data).to_be_bytes());
    out
}

fn write_chunk<W: Write>(w: &mut W, kind: &[u8; 4], data: &[u8]) -> io::Result<()> {
    w.write_all(&chunk_bytes(kind, data))
}

/// Write an ancillary chunk that may be dropped. It is dropped only when the
/// first write fails, which leaves the stream untouched; once any byte has
/// gone out the rest must follow, so later failures are returned.
fn write_optional_chunk<W: Write>(w: &mut W, kind: &[u8; 4], data: &[u8]) -> io::Result<()> {
    let chunk = chunk_bytes(kind, data);
    loop {
        match w.write(&chunk) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => return w.write_all(&chunk[n..]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                log::debug!(
                    "skipping {} chunk: {e}",
                    String::from_utf8_lossy(kind)
                );
                return Ok(());
            }
        }
    }
}

/// A chunk read back from a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub kind: [u8; 4],
    pub data: Vec<u8>,
    pub crc: u32,
}

impl Chunk {
    pub fn kind_str(&self) -> &str {
        std::str::from_utf8(&self.kind).unwrap_or("????")
    }

    pub fn crc_matches(&self) -> bool {
        chunk_crc(&self.kind, &self.data) == self.crc
    }
}

/// Split a PNG stream into its chunks. CRCs are returned as stored, not
/// checked; see [`Chunk::crc_matches`].
pub fn read_chunks(bytes: &[u8], path: &Path) -> Result<Vec<Chunk>> {
    let malformed = |reason: String| AssetError::MalformedOutput {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < SIGNATURE.len() || bytes[..SIGNATURE.len()] != SIGNATURE {
        return Err(malformed("missing PNG signature".to_string()));
    }

    let mut chunks = Vec::new();
    let mut pos = SIGNATURE.len();
    while pos < bytes.len() {
        let header = bytes
            .get(pos..pos + 8)
            .ok_or_else(|| malformed(format!("truncated chunk header at byte {pos}")))?;
        let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];
        let data_start = pos + 8;
        let data_end = data_start + len;
        let data = bytes
            .get(data_start..data_end)
            .ok_or_else(|| malformed(format!("truncated payload at byte {data_start}")))?;
        let crc = bytes
            .get(data_end..data_end + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| malformed(format!("truncated CRC at byte {data_end}")))?;
        chunks.push(Chunk {
            kind,
            data: data.to_vec(),
            crc,
        });
        pos = data_end + 4;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Palette, raster::Scene};
    use image::Rgba;

    fn sample() -> RgbaImage {
        Scene::tv_banner(&Palette::default()).rasterize(40, 24, 2)
    }

    #[test]
    fn chunk_layout_is_ihdr_srgb_idat_iend() {
        let bytes = PngWriter::default().encode(&sample()).unwrap();
        assert_eq!(&bytes[..8], &SIGNATURE);

        let chunks = read_chunks(&bytes, Path::new("mem")).unwrap();
        let kinds: Vec<&str> = chunks.iter().map(|c| c.kind_str()).collect();
        assert_eq!(kinds, ["IHDR", "sRGB", "IDAT", "IEND"]);

        let ihdr = &chunks[0].data;
        assert_eq!(ihdr.len(), 13);
        assert_eq!(u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]), 40);
        assert_eq!(u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]), 24);
        assert_eq!(&ihdr[8..], &[8, 6, 0, 0, 0]);
        assert!(chunks[3].data.is_empty());
    }

    #[test]
    fn srgb_chunk_is_optional() {
        let bytes = PngWriter::new(false).encode(&sample()).unwrap();
        let chunks = read_chunks(&bytes, Path::new("mem")).unwrap();
        let kinds: Vec<&str> = chunks.iter().map(|c| c.kind_str()).collect();
        assert_eq!(kinds, ["IHDR", "IDAT", "IEND"]);
    }

    /// Accepts everything except a write that carries an sRGB chunk.
    struct RejectsSrgb(Vec<u8>);

    impl Write for RejectsSrgb {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if buf.windows(4).any(|w| w == b"sRGB") {
                return Err(io::Error::other("colour metadata not accepted"));
            }
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_srgb_write_still_produces_valid_png() {
        let raster = sample();
        let mut sink = RejectsSrgb(Vec::new());
        PngWriter::default().write_to(&raster, &mut sink).unwrap();

        let chunks = read_chunks(&sink.0, Path::new("mem")).unwrap();
        let kinds: Vec<&str> = chunks.iter().map(|c| c.kind_str()).collect();
        assert_eq!(kinds, ["IHDR", "IDAT", "IEND"]);
        assert!(chunks.iter().all(Chunk::crc_matches));

        let decoded = image::load_from_memory(&sink.0).unwrap().to_rgba8();
        assert_eq!(decoded.as_raw(), raster.as_raw());
    }

    #[test]
    fn every_crc_matches_and_corruption_is_detected() {
        let bytes = PngWriter::default().encode(&sample()).unwrap();
        let chunks = read_chunks(&bytes, Path::new("mem")).unwrap();
        assert!(chunks.iter().all(Chunk::crc_matches));

        let mut idat = chunks[2].clone();
        idat.data[0] ^= 0x01;
        assert!(!idat.crc_matches());
    }

    #[test]
    fn known_crc_of_empty_iend() {
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE42_6082);
    }

    #[test]
    fn decodes_losslessly() {
        let mut raster = sample();
        // a translucent pixel proves the alpha channel survives too
        raster.put_pixel(3, 5, Rgba([10, 20, 30, 40]));

        let bytes = PngWriter::default().encode(&raster).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), raster.dimensions());
        assert_eq!(decoded.as_raw(), raster.as_raw());
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let a = PngWriter::default().encode(&sample()).unwrap();
        let b = PngWriter::default().encode(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_png_and_truncated_streams() {
        assert!(read_chunks(b"GIF89a", Path::new("x")).is_err());

        let bytes = PngWriter::default().encode(&sample()).unwrap();
        let err = read_chunks(&bytes[..bytes.len() - 2], Path::new("x")).unwrap_err();
        assert!(matches!(err, AssetError::MalformedOutput { .. }));
    }
}
