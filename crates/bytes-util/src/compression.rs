//! Whole-buffer (de)compression.
//!
//! Compression is applied to the raw bytes of a buffer before or after the
//! codecs run; it is not part of any AMF wire format.

use std::io::{self, BufReader, Read, Write};

use bytes::Bytes;
use flate2::Compression;
use tracing::debug;

use crate::{CursorBuffer, CursorError};

/// The built-in compression formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgorithm {
    /// Raw deflate (RFC 1951), no header or checksum.
    Deflate,
    /// Deflate wrapped in a zlib header and adler32 trailer (RFC 1950).
    Zlib,
    /// LZMA "alone" format with its 13 byte header.
    Lzma,
}

/// A byte-to-byte transform usable with [`CursorBuffer::compress_with`].
pub trait Compressor {
    /// Compresses `data`.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Reverses [`Compressor::compress`].
    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}

impl Compressor for CompressionAlgorithm {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Self::Deflate => {
                let mut encoder = flate2::write::DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Zlib => {
                let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()
            }
            Self::Lzma => {
                let mut output = Vec::new();
                lzma_rs::lzma_compress(&mut BufReader::new(data), &mut output)?;
                Ok(output)
            }
        }
    }

    fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut output = Vec::new();
        match self {
            Self::Deflate => {
                flate2::read::DeflateDecoder::new(data).read_to_end(&mut output)?;
            }
            Self::Zlib => {
                flate2::read::ZlibDecoder::new(data).read_to_end(&mut output)?;
            }
            Self::Lzma => {
                lzma_rs::lzma_decompress(&mut BufReader::new(data), &mut output)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
            }
        }
        Ok(output)
    }
}

/// Compresses `data` with one of the built-in algorithms.
pub fn compress(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Bytes, CursorError> {
    Ok(algorithm.compress(data)?.into())
}

/// Decompresses `data` with one of the built-in algorithms.
pub fn decompress(data: &[u8], algorithm: CompressionAlgorithm) -> Result<Bytes, CursorError> {
    Ok(algorithm.decompress(data)?.into())
}

impl CursorBuffer {
    /// Replaces the whole content with its compressed form and rewinds the cursor.
    pub fn compress(&mut self, algorithm: CompressionAlgorithm) -> Result<(), CursorError> {
        self.compress_with(&algorithm)
    }

    /// Replaces the whole content with its decompressed form and rewinds the cursor.
    pub fn uncompress(&mut self, algorithm: CompressionAlgorithm) -> Result<(), CursorError> {
        self.uncompress_with(&algorithm)
    }

    /// [`CursorBuffer::compress`] with a caller supplied transform.
    pub fn compress_with(&mut self, compressor: &impl Compressor) -> Result<(), CursorError> {
        let before = self.len();
        let compressed = compressor.compress(self.as_bytes())?;
        debug!(before, after = compressed.len(), "compressed buffer");
        self.replace(compressed)
    }

    /// [`CursorBuffer::uncompress`] with a caller supplied transform.
    pub fn uncompress_with(&mut self, compressor: &impl Compressor) -> Result<(), CursorError> {
        let before = self.len();
        let decompressed = compressor.decompress(self.as_bytes())?;
        debug!(before, after = decompressed.len(), "decompressed buffer");
        self.replace(decompressed)
    }
}
