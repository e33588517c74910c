//! Language file lexical analyzer
//!
//! This module turns a buffer of UTF-16 code units into the four token kinds
//! of the format: strings, section markers and condition directives. Tokens
//! are kept in UTF-16 form; transcoding happens in the parser once the role of
//! a token (key, value or condition) is known.

use crate::error::{ParseError, Position};
use smallvec::SmallVec;

const QUOTE: u16 = b'"' as u16;
const BACKSLASH: u16 = b'\\' as u16;
const SLASH: u16 = b'/' as u16;
const LINE_FEED: u16 = b'\n' as u16;
const OPEN_BRACE: u16 = b'{' as u16;
const CLOSE_BRACE: u16 = b'}' as u16;
const OPEN_BRACKET: u16 = b'[' as u16;
const CLOSE_BRACKET: u16 = b']' as u16;

/// Unicode space characters treated as whitespace on top of the C locale set.
///
/// Must stay sorted, lookups use binary search.
static EXTENDED_WHITESPACE: [u16; 19] = [
    0x0085, // next line
    0x00A0, // no-break space
    0x1680, // ogham space mark
    0x2000, // en quad
    0x2001, // em quad
    0x2002, // en space
    0x2003, // em space
    0x2004, // three-per-em space
    0x2005, // four-per-em space
    0x2006, // six-per-em space
    0x2007, // figure space
    0x2008, // punctuation space
    0x2009, // thin space
    0x200A, // hair space
    0x2028, // line separator
    0x2029, // paragraph separator
    0x202F, // narrow no-break space
    0x205F, // medium mathematical space
    0x3000, // ideographic space
];

/// Returns true if `unit` separates tokens.
///
/// Some shipped language files use U+00A0 between tokens, so the extended
/// Unicode space separators count as whitespace too.
#[inline]
pub fn is_unicode_whitespace(unit: u16) -> bool {
    matches!(unit, 0x09..=0x0D | 0x20) || EXTENDED_WHITESPACE.binary_search(&unit).is_ok()
}

/// Scratch storage for a token payload
pub type TokenBuffer = SmallVec<[u16; 64]>;

/// Language file token types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Quoted or bare string with escapes already resolved
    String(TokenBuffer),
    /// `{`
    SectionBegin,
    /// `}`
    SectionEnd,
    /// Raw text between `[` and `]`
    Condition(TokenBuffer),
    /// Input ended between tokens
    Eof,
}

impl Token {
    /// Returns a short name of the token type for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Token::String(_) => "string",
            Token::SectionBegin => "'{'",
            Token::SectionEnd => "'}'",
            Token::Condition(_) => "condition",
            Token::Eof => "end of stream",
        }
    }

}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanMode {
    Quoted,
    Unquoted,
    Condition,
}

/// Tokenizer over a UTF-16 buffer.
///
/// The stream ends at the first zero unit or at the end of the slice,
/// whichever comes first.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    /// Input being tokenized
    input: &'a [u16],
    /// Index of the next unit to read
    cursor: usize,
    /// Position of `cursor`
    position: Position,
    /// Start position of the last produced token
    last_token_start: Position,
}

impl<'a> Tokenizer<'a> {
    /// Creates a tokenizer positioned at the start of `input`
    pub fn new(input: &'a [u16]) -> Self {
        Self {
            input,
            cursor: 0,
            position: Position::new(),
            last_token_start: Position::new(),
        }
    }

    /// Returns the start position of the last produced token
    pub fn last_token_start(&self) -> Position {
        self.last_token_start
    }

    #[inline]
    fn peek(&self) -> u16 {
        self.peek_at(0)
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> u16 {
        self.input.get(self.cursor + offset).copied().unwrap_or(0)
    }

    /// Consumes one unit. The cursor never moves past the end of the stream.
    fn advance(&mut self) -> u16 {
        let unit = self.peek();
        if unit != 0 {
            self.cursor += 1;
            self.position.advance(unit);
        }
        unit
    }

    fn skip_whitespace(&mut self) {
        while self.peek() != 0 && is_unicode_whitespace(self.peek()) {
            self.advance();
        }
    }

    fn skip_to_line_end(&mut self) {
        loop {
            match self.advance() {
                0 | LINE_FEED => break,
                _ => {}
            }
        }
    }

    /// Skips whitespace and `//` comments
    fn skip_trivia(&mut self) {
        loop {
            self.skip_whitespace();
            if self.peek() == SLASH && self.peek_at(1) == SLASH {
                self.skip_to_line_end();
                continue;
            }
            break;
        }
    }

    /// Reads the next token.
    ///
    /// `max_len` bounds the payload including one reserved terminator slot,
    /// so at most `max_len - 1` units are accepted.
    pub fn read_token(&mut self, max_len: usize) -> Result<Token, ParseError> {
        self.skip_trivia();
        self.last_token_start = self.position;

        let mode = match self.peek() {
            0 => return Ok(Token::Eof),
            QUOTE => {
                self.advance();
                ScanMode::Quoted
            }
            OPEN_BRACKET => {
                self.advance();
                ScanMode::Condition
            }
            OPEN_BRACE => {
                self.advance();
                return Ok(Token::SectionBegin);
            }
            CLOSE_BRACE => {
                self.advance();
                return Ok(Token::SectionEnd);
            }
            _ => ScanMode::Unquoted,
        };

        let mut out = TokenBuffer::new();

        loop {
            let mut unit = self.peek();
            if unit == 0 {
                return Err(ParseError::StreamEnd {
                    position: self.position,
                });
            }

            match mode {
                ScanMode::Quoted => {
                    self.advance();
                    if unit == QUOTE {
                        break;
                    }
                    if unit == BACKSLASH {
                        if let Some(escaped) = unescape(self.peek()) {
                            self.advance();
                            unit = escaped;
                        }
                    }
                }
                ScanMode::Condition => {
                    self.advance();
                    if unit == CLOSE_BRACKET {
                        break;
                    }
                }
                ScanMode::Unquoted => {
                    // The terminator starts the next token
                    if is_unicode_whitespace(unit) || unit == QUOTE || unit == OPEN_BRACKET {
                        break;
                    }
                    self.advance();
                }
            }

            if out.len() + 1 >= max_len {
                return Err(ParseError::Overflow {
                    limit: max_len,
                    position: self.last_token_start,
                });
            }
            out.push(unit);
        }

        Ok(match mode {
            ScanMode::Condition => Token::Condition(out),
            ScanMode::Quoted | ScanMode::Unquoted => Token::String(out),
        })
    }
}

/// Maps the unit after a backslash to its escaped value
fn unescape(unit: u16) -> Option<u16> {
    match u8::try_from(unit).ok()? {
        b'\\' => Some(BACKSLASH),
        b'"' => Some(QUOTE),
        b'n' => Some(LINE_FEED),
        b'r' => Some(b'\r' as u16),
        b't' => Some(b'\t' as u16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const MAX: usize = 256;

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    fn string(text: &str) -> Token {
        Token::String(text.encode_utf16().collect())
    }

    fn condition(text: &str) -> Token {
        Token::Condition(text.encode_utf16().collect())
    }

    fn tokens(text: &str) -> Vec<Token> {
        let input = utf16(text);
        let mut tokenizer = Tokenizer::new(&input);
        let mut out = Vec::new();
        loop {
            let token = tokenizer.read_token(MAX).unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_standard_whitespace() {
        for unit in [0x09u16, 0x0A, 0x0B, 0x0C, 0x0D, 0x20] {
            assert!(is_unicode_whitespace(unit), "{unit:#06x}");
        }
        assert!(!is_unicode_whitespace(b'a' as u16));
        assert!(!is_unicode_whitespace(0));
    }

    #[test]
    fn test_extended_whitespace() {
        for unit in EXTENDED_WHITESPACE {
            assert!(is_unicode_whitespace(unit), "{unit:#06x}");
        }
        for unit in [0x0084u16, 0x00A1, 0x200B, 0x2027, 0x202E, 0x3001, 0xFEFF] {
            assert!(!is_unicode_whitespace(unit), "{unit:#06x}");
        }
    }

    #[test]
    fn test_extended_whitespace_is_sorted() {
        assert!(EXTENDED_WHITESPACE.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens(r#""Phrases" { "key" "value" [$WIN32] }"#),
            vec![
                string("Phrases"),
                Token::SectionBegin,
                string("key"),
                string("value"),
                condition("$WIN32"),
                Token::SectionEnd,
            ]
        );
    }

    #[test]
    fn test_section_markers_need_no_separator() {
        assert_eq!(
            tokens(r#""a"{"b""c"}"#),
            vec![
                string("a"),
                Token::SectionBegin,
                string("b"),
                string("c"),
                Token::SectionEnd,
            ]
        );
    }

    #[test]
    fn test_unquoted_tokens() {
        assert_eq!(
            tokens("key value\tother\n"),
            vec![string("key"), string("value"), string("other")]
        );
    }

    #[test]
    fn test_unquoted_terminator_is_not_consumed() {
        assert_eq!(
            tokens(r#"a"b" c[$X360] "#),
            vec![string("a"), string("b"), string("c"), condition("$X360")]
        );
    }

    #[test]
    fn test_escape_sequences() {
        assert_eq!(
            tokens(r#""a\\b\"c\nd\re\tf""#),
            vec![string("a\\b\"c\nd\re\tf")]
        );
    }

    #[test]
    fn test_unknown_escape_keeps_backslash() {
        assert_eq!(tokens(r#""\q\x""#), vec![string("\\q\\x")]);
    }

    #[test]
    fn test_trailing_backslash_before_escaped_quote() {
        // `\\` then `"` terminates, `\"` does not
        assert_eq!(tokens(r#""a\\" "b\"""#), vec![string("a\\"), string("b\"")]);
    }

    #[test]
    fn test_condition_has_no_escapes() {
        assert_eq!(tokens(r#"[!$a\"b]"#), vec![condition("!$a\\\"b")]);
    }

    #[test]
    fn test_comment_skipping() {
        assert_eq!(
            tokens("// ignored\n\"a\" // trailing\n  // more\n\"b\""),
            vec![string("a"), string("b")]
        );
    }

    #[test]
    fn test_comment_at_end_of_stream() {
        assert_eq!(tokens("\"a\" // no newline"), vec![string("a")]);
    }

    #[test]
    fn test_single_slash_is_text() {
        assert_eq!(tokens("a/b / "), vec![string("a/b"), string("/")]);
    }

    #[test]
    fn test_no_break_space_separates_tokens() {
        assert_eq!(tokens("key\u{a0}value "), vec![string("key"), string("value")]);
    }

    #[test]
    fn test_quoted_text_keeps_whitespace() {
        assert_eq!(
            tokens("\"two words\u{a0}here\" "),
            vec![string("two words\u{a0}here")]
        );
    }

    #[test]
    fn test_eof_is_sticky() {
        let input = utf16("  ");
        let mut tokenizer = Tokenizer::new(&input);
        assert_eq!(tokenizer.read_token(MAX).unwrap(), Token::Eof);
        assert_eq!(tokenizer.read_token(MAX).unwrap(), Token::Eof);
        assert_eq!(tokenizer.last_token_start().offset, 2);
    }

    #[test]
    fn test_zero_unit_terminates_stream() {
        let mut input = utf16("\"a\" ");
        input.push(0);
        input.extend(utf16("\"b\""));
        let mut tokenizer = Tokenizer::new(&input);
        assert_eq!(tokenizer.read_token(MAX).unwrap(), string("a"));
        assert_eq!(tokenizer.read_token(MAX).unwrap(), Token::Eof);
    }

    #[test]
    fn test_stream_end_inside_token() {
        for text in [r#""unterminated"#, "[$WIN32", "bare"] {
            let input = utf16(text);
            let mut tokenizer = Tokenizer::new(&input);
            let err = tokenizer.read_token(MAX).unwrap_err();
            assert_eq!(err.code(), ErrorCode::StreamEnd, "{text}");
        }
    }

    #[test]
    fn test_overflow_boundary() {
        let max_len = 8;

        let fits = utf16(&format!("\"{}\"", "x".repeat(max_len - 1)));
        let mut tokenizer = Tokenizer::new(&fits);
        match tokenizer.read_token(max_len).unwrap() {
            Token::String(units) => assert_eq!(units.len(), max_len - 1),
            other => panic!("Expected string, got {:?}", other),
        }

        let too_long = utf16(&format!("\"{}\"", "x".repeat(max_len)));
        let mut tokenizer = Tokenizer::new(&too_long);
        match tokenizer.read_token(max_len) {
            Err(ParseError::Overflow { limit, position }) => {
                assert_eq!(limit, max_len);
                assert_eq!(position.offset, 0);
            }
            other => panic!("Expected Overflow, got {:?}", other),
        }
    }

    #[test]
    fn test_escape_counts_as_one_unit() {
        let input = utf16(r#""\n\n\n""#);
        let mut tokenizer = Tokenizer::new(&input);
        assert_eq!(tokenizer.read_token(4).unwrap(), string("\n\n\n"));
    }

    #[test]
    fn test_token_positions() {
        let input = utf16("\"a\"\n  \"b\"");
        let mut tokenizer = Tokenizer::new(&input);
        tokenizer.read_token(MAX).unwrap();
        assert_eq!(tokenizer.last_token_start(), Position::new());

        tokenizer.read_token(MAX).unwrap();
        let start = tokenizer.last_token_start();
        assert_eq!(start.line, 2);
        assert_eq!(start.column, 3);
        assert_eq!(start.offset, 6);
    }

    #[test]
    fn test_token_type_names() {
        assert_eq!(Token::SectionBegin.type_name(), "'{'");
        assert_eq!(Token::SectionEnd.type_name(), "'}'");
        assert_eq!(string("x").type_name(), "string");
        assert_eq!(condition("x").type_name(), "condition");
        assert_eq!(Token::Eof.type_name(), "end of stream");
    }
}
