//! Codec auto-detection for compressed record logs.
//!
//! Crawl logs arrive plain, gzip, or zstd depending on which collector wrote
//! them. Detection is extension-first (no header read in the common case) with
//! a magic-byte fallback for files that lost their extension in transit.
//! Shard artifacts are served plain to CDNs, so only the read side exists.
//!
//! When neither compression feature is enabled the detection functions are
//! pass-throughs.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// One decompression codec: how to recognize it and how to wrap a reader.
trait InputCodec: Send + Sync {
    /// Codec name for error context (e.g. "gzip").
    fn name(&self) -> &'static str;

    /// Lowercase file extensions including the leading dot.
    fn extensions(&self) -> &[&'static str];

    /// Leading byte signature, if the format has a reliable one.
    fn magic_bytes(&self) -> &'static [u8];

    /// Wrap a raw reader with decompression.
    fn wrap(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;
}

const CODECS: &[&dyn InputCodec] = &[
    #[cfg(feature = "compression-gzip")]
    &GzipCodec,
    #[cfg(feature = "compression-zstd")]
    &ZstdCodec,
];

fn detect_from_extension(path: &Path) -> Option<&'static dyn InputCodec> {
    let path = path.to_string_lossy().to_lowercase();
    CODECS
        .iter()
        .find(|codec| codec.extensions().iter().any(|ext| path.ends_with(ext)))
        .copied()
}

/// Match the start of a buffered stream against codec signatures. The reader
/// is not advanced.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<&'static dyn InputCodec> {
    let head = reader.fill_buf().ok()?;
    if head.is_empty() {
        return None;
    }
    CODECS
        .iter()
        .find(|codec| head.starts_with(codec.magic_bytes()))
        .copied()
}

/// Wrap a reader with decompression when the path or content says so.
///
/// Detection strategy: file extension first, then magic bytes, then plain
/// pass-through.
///
/// # Errors
/// Returns an error if a detected codec fails to initialize its decoder.
pub fn decode_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec
            .wrap(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buffered) {
        return codec
            .wrap(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buffered))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl InputCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x1f, 0x8b]
    }

    fn wrap(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::GzDecoder;
        Ok(Box::new(GzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl InputCodec for ZstdCodec {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn extensions(&self) -> &[&'static str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> &'static [u8] {
        &[0x28, 0xb5, 0x2f, 0xfd]
    }

    fn wrap(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}
