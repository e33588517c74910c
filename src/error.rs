//! Error types and position tracking for language file parsing
//!
//! Every failure that stops a parse is a [`ParseError`]. Errors raised while
//! scanning carry the [`Position`] of the offending token so callers can point
//! at the exact line and column of the source file.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const LINE_FEED: u16 = b'\n' as u16;
const CARRIAGE_RETURN: u16 = b'\r' as u16;

/// Represents a position in the source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based, counted in code units)
    pub column: usize,
    /// Code unit offset from start of input (0-based)
    pub offset: usize,
}

impl Position {
    /// Creates a new position at the start of input
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Advances the position past one code unit
    pub fn advance(&mut self, unit: u16) {
        match unit {
            LINE_FEED => {
                self.line += 1;
                self.column = 1;
            }
            CARRIAGE_RETURN => {
                // Handle \r\n and standalone \r
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
        self.offset += 1;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Flat error taxonomy, one code per [`ParseError`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The backing file could not be opened
    StreamOpen,
    /// The backing file could not be read or has no byte-order mark
    StreamRead,
    /// Input ended in the middle of a token or an open section
    StreamEnd,
    /// A token exceeded its buffer capacity
    Overflow,
    /// `{` without a pending key
    SectionBegin,
    /// `}` at depth zero or directly after a key
    SectionEnd,
    /// Condition directive outside a valid position
    InvalidToken,
    /// A token could not be transcoded to UTF-8
    Encoding,
}

impl ErrorCode {
    /// Returns the stable name of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::StreamOpen => "stream_open",
            ErrorCode::StreamRead => "stream_read",
            ErrorCode::StreamEnd => "stream_end",
            ErrorCode::Overflow => "overflow",
            ErrorCode::SectionBegin => "section_begin",
            ErrorCode::SectionEnd => "section_end",
            ErrorCode::InvalidToken => "invalid_token",
            ErrorCode::Encoding => "encoding",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that abort a parse
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be opened
    #[error("Unable to open file \"{}\": {}", .path.display(), .source)]
    StreamOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file could not be read or its contents are not a UTF-16 stream
    #[error("{message}")]
    StreamRead { message: String },

    /// Input ended inside a token or before all sections were closed
    #[error("Encountered end of stream at {position}")]
    StreamEnd { position: Position },

    /// A token did not fit its buffer
    #[error("Token buffer overflow at {position} (limit {limit})")]
    Overflow { limit: usize, position: Position },

    /// `{` appeared without a key to name the section
    #[error("Unexpected new section at {position}")]
    SectionBegin { position: Position },

    /// `}` appeared with no open section, or directly after a key
    #[error("Unexpected section end at {position}")]
    SectionEnd { position: Position },

    /// A condition directive that does not follow a value
    #[error("Unexpected condition '{condition}' at {position}")]
    InvalidToken {
        condition: String,
        position: Position,
    },

    /// Token text is not valid UTF-16
    #[error("Invalid encoding at {position}: {message}")]
    Encoding { message: String, position: Position },
}

impl ParseError {
    /// Returns the taxonomy code of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ParseError::StreamOpen { .. } => ErrorCode::StreamOpen,
            ParseError::StreamRead { .. } => ErrorCode::StreamRead,
            ParseError::StreamEnd { .. } => ErrorCode::StreamEnd,
            ParseError::Overflow { .. } => ErrorCode::Overflow,
            ParseError::SectionBegin { .. } => ErrorCode::SectionBegin,
            ParseError::SectionEnd { .. } => ErrorCode::SectionEnd,
            ParseError::InvalidToken { .. } => ErrorCode::InvalidToken,
            ParseError::Encoding { .. } => ErrorCode::Encoding,
        }
    }

    /// Returns the source position, if the error came from the scanner
    pub fn position(&self) -> Option<Position> {
        match self {
            ParseError::StreamOpen { .. } | ParseError::StreamRead { .. } => None,
            ParseError::StreamEnd { position }
            | ParseError::Overflow { position, .. }
            | ParseError::SectionBegin { position }
            | ParseError::SectionEnd { position }
            | ParseError::InvalidToken { position, .. }
            | ParseError::Encoding { position, .. } => Some(*position),
        }
    }

    /// Renders the error message cut to fit a buffer of `max_len` bytes.
    ///
    /// One byte is reserved for a terminator, so at most `max_len - 1` bytes
    /// are returned. The cut never splits a UTF-8 sequence.
    pub fn bounded_message(&self, max_len: usize) -> String {
        let mut message = self.to_string();
        let limit = max_len.saturating_sub(1);
        if message.len() > limit {
            let mut cut = limit;
            while !message.is_char_boundary(cut) {
                cut -= 1;
            }
            message.truncate(cut);
        }
        message
    }
}
