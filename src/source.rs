//! Loading language files from disk
//!
//! Language files are stored as UTF-16 with a byte-order mark. This module
//! checks the mark, brings the units into native order and hands the
//! remaining buffer to the parser.

use crate::error::ParseError;
use crate::parser::{LanguageFileParser, ParseListener};
use std::io;
use std::path::Path;
use tracing::debug;

const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// Byte order of a UTF-16 byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from a leading byte-order mark
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        let [first, second, ..] = bytes else {
            return None;
        };
        [ByteOrder::LittleEndian, ByteOrder::BigEndian]
            .into_iter()
            .find(|order| order.read_unit([*first, *second]) == BYTE_ORDER_MARK)
    }

    fn read_unit(self, pair: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(pair),
            ByteOrder::BigEndian => u16::from_be_bytes(pair),
        }
    }
}

/// Converts a UTF-16 byte stream with a byte-order mark into native units.
///
/// The mark is stripped. A trailing odd byte is ignored.
pub fn decode_units(bytes: &[u8]) -> Result<Vec<u16>, ParseError> {
    let order = ByteOrder::detect(bytes).ok_or_else(|| ParseError::StreamRead {
        message: "Missing byte-order mark".to_string(),
    })?;

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .skip(1)
        .map(|pair| order.read_unit([pair[0], pair[1]]))
        .collect();

    debug!(?order, units = units.len(), "decoded language file bytes");
    Ok(units)
}

fn read_file(path: &Path) -> Result<Vec<u8>, ParseError> {
    std::fs::read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ParseError::StreamOpen {
            path: path.to_path_buf(),
            source: err,
        },
        _ => ParseError::StreamRead {
            message: format!("Unable to read from file \"{}\": {}", path.display(), err),
        },
    })
}

impl LanguageFileParser {
    /// Parses a UTF-16 byte stream that starts with a byte-order mark
    pub fn parse_bytes<L>(&self, bytes: &[u8], listener: &mut L) -> Result<(), ParseError>
    where
        L: ParseListener + ?Sized,
    {
        let units = decode_units(bytes)?;
        self.parse_buffer(&units, listener)
    }

    /// Reads and parses a language file.
    ///
    /// Failures to open or read the file are reported before the listener is
    /// started, so no callback runs for them.
    pub fn parse_file<L, P>(&self, path: P, listener: &mut L) -> Result<(), ParseError>
    where
        L: ParseListener + ?Sized,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading language file");

        let bytes = read_file(path)?;
        let units = decode_units(&bytes).map_err(|err| match err {
            ParseError::StreamRead { message } => ParseError::StreamRead {
                message: format!("{} (path: \"{}\")", message, path.display()),
            },
            other => other,
        })?;
        self.parse_buffer(&units, listener)
    }
}

/// Parses a UTF-16 byte stream with a default-configured parser
pub fn parse_bytes<L>(bytes: &[u8], listener: &mut L) -> Result<(), ParseError>
where
    L: ParseListener + ?Sized,
{
    LanguageFileParser::new().parse_bytes(bytes, listener)
}

/// Reads and parses a language file with a default-configured parser
pub fn parse_file<L, P>(path: P, listener: &mut L) -> Result<(), ParseError>
where
    L: ParseListener + ?Sized,
    P: AsRef<Path>,
{
    LanguageFileParser::new().parse_file(path, listener)
}
