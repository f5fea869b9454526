//! Unified file reading
//!
//! Provides consistent handling for:
//! - Non-UTF-8 files (detected encoding fallback)
//! - Oversized files
//! - Binary files

use chardetng::EncodingDetector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Default maximum file size in bytes (64 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Number of leading bytes inspected for NUL when sniffing binaries
const BINARY_SNIFF_LEN: usize = 8192;

/// Configuration for file reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReadConfig {
    /// Maximum file size to process (bytes)
    pub max_file_size: u64,
}

impl Default for FileReadConfig {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// Decoded text plus how it was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub content: String,

    /// Name of the encoding used (`UTF-8` when no fallback was needed)
    pub encoding: &'static str,

    /// Whether the content was not valid UTF-8 and a detected encoding was used
    pub detected: bool,

    /// Whether decoding hit malformed sequences (replaced with U+FFFD)
    pub lossy: bool,
}

/// Why a file could not be turned into text
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("file appears to be binary (contains null bytes)")]
    Binary,
}

/// Decode bytes as UTF-8, falling back to a detected encoding.
pub fn decode_bytes(bytes: &[u8]) -> DecodedText {
    match std::str::from_utf8(bytes) {
        Ok(text) => DecodedText {
            content: text.strip_prefix('\u{feff}').unwrap_or(text).to_string(),
            encoding: encoding_rs::UTF_8.name(),
            detected: false,
            lossy: false,
        },
        Err(_) => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            let encoding = detector.guess(None, false);
            let (content, used, had_errors) = encoding.decode(bytes);
            DecodedText {
                content: content.into_owned(),
                encoding: used.name(),
                detected: true,
                lossy: had_errors,
            }
        }
    }
}

/// Read and decode a text file.
///
/// The handle is opened, read fully, and dropped before returning.
pub fn read_text(path: &Path, config: &FileReadConfig) -> Result<DecodedText, ReadError> {
    let bytes = read_file_bytes(path, config)?;

    let check_len = std::cmp::min(BINARY_SNIFF_LEN, bytes.len());
    if bytes[..check_len].contains(&0) {
        return Err(ReadError::Binary);
    }

    let decoded = decode_bytes(&bytes);
    if decoded.detected {
        log::info!("Detected {} encoding for {}", decoded.encoding, path.display());
    }
    if decoded.lossy {
        log::warn!(
            "Malformed {} sequences in {} were replaced",
            decoded.encoding,
            path.display()
        );
    }
    Ok(decoded)
}

/// Read file bytes, rejecting files over the size limit
fn read_file_bytes(path: &Path, config: &FileReadConfig) -> Result<Vec<u8>, ReadError> {
    let file = fs::File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size > config.max_file_size {
        return Err(ReadError::TooLarge {
            size: file_size,
            limit: config.max_file_size,
        });
    }

    let mut reader = std::io::BufReader::new(file);
    let mut buffer = Vec::with_capacity(file_size as usize);
    reader.read_to_end(&mut buffer)?;
    Ok(buffer)
}
