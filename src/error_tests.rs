//! Tests for error handling and diagnostics
//!
//! This module checks every error condition with its position, the error
//! message text and the error code taxonomy.

#[cfg(test)]
mod tests {
    use crate::error::{ErrorCode, ParseError, Position};
    use crate::parser::{LanguageFileParser, ParseAction, ParseListener, ParserConfig};
    use std::io;
    use std::path::PathBuf;

    /// Tracks depth and the outcome reported to `on_end`
    #[derive(Default)]
    struct Outcome {
        section_callbacks: usize,
        end: Option<(bool, bool)>,
    }

    impl ParseListener for Outcome {
        fn on_section_enter(&mut self, _name: &str) -> ParseAction {
            self.section_callbacks += 1;
            ParseAction::Continue
        }

        fn on_section_leave(&mut self) -> ParseAction {
            self.section_callbacks += 1;
            ParseAction::Continue
        }

        fn on_end(&mut self, halted: bool, failed: bool) {
            assert!(self.end.is_none(), "on_end called twice");
            self.end = Some((halted, failed));
        }
    }

    fn parse_err(text: &str) -> (ParseError, Outcome) {
        let units: Vec<u16> = text.encode_utf16().collect();
        let mut outcome = Outcome::default();
        let err = LanguageFileParser::new()
            .parse_buffer(&units, &mut outcome)
            .expect_err("parse should fail");
        (err, outcome)
    }

    #[test]
    fn test_position_tracking_accuracy() {
        let mut pos = Position::new();

        pos.advance(b'a' as u16);
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 1);

        pos.advance(b'\n' as u16);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 2);

        pos.advance(b'\r' as u16);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 3);

        // One code unit regardless of its UTF-8 length
        pos.advance(0x00E9);
        assert_eq!(pos.column, 2);
        assert_eq!(pos.offset, 4);
    }

    #[test]
    fn test_position_display() {
        let pos = Position {
            line: 3,
            column: 7,
            offset: 20,
        };
        assert_eq!(pos.to_string(), "3:7");
    }

    #[test]
    fn test_stream_end_in_open_section() {
        let (err, outcome) = parse_err("\"a\" \"b\" {");
        match err {
            ParseError::StreamEnd { position } => {
                assert_eq!(position.line, 1);
                assert_eq!(position.column, 10);
            }
            other => panic!("Expected StreamEnd, got {:?}", other),
        }
        assert_eq!(outcome.end, Some((false, true)));
    }

    #[test]
    fn test_stream_end_in_quoted_string() {
        let (err, _) = parse_err("\"s\" {\n  \"unterminated");
        assert_eq!(err.code(), ErrorCode::StreamEnd);
        let position = err.position().unwrap();
        assert_eq!(position.line, 2);
        assert_eq!(position.column, 16);
    }

    #[test]
    fn test_section_end_without_section() {
        let (err, outcome) = parse_err("\"a\" \"b\" }");
        assert!(matches!(err, ParseError::SectionEnd { .. }));
        assert_eq!(outcome.section_callbacks, 0);
        assert_eq!(outcome.end, Some((false, true)));
    }

    #[test]
    fn test_section_begin_without_key() {
        let (err, outcome) = parse_err("\"s\" { { } }");
        match err {
            ParseError::SectionBegin { position } => assert_eq!(position.column, 7),
            other => panic!("Expected SectionBegin, got {:?}", other),
        }
        assert_eq!(outcome.section_callbacks, 1);
    }

    #[test]
    fn test_condition_outside_value() {
        let (err, _) = parse_err("[$WIN32] \"s\" { }");
        match err {
            ParseError::InvalidToken {
                condition,
                position,
            } => {
                assert_eq!(condition, "$WIN32");
                assert_eq!(position.offset, 0);
            }
            other => panic!("Expected InvalidToken, got {:?}", other),
        }
    }

    #[test]
    fn test_condition_after_condition() {
        let (err, _) = parse_err("\"s\" { \"k\" \"v\" [$WIN32] [$WIN32] }");
        assert_eq!(err.code(), ErrorCode::InvalidToken);
    }

    #[test]
    fn test_overflow_reports_limit_and_token_start() {
        let config = ParserConfig::new().with_max_key_length(8);
        let units: Vec<u16> = "\n  \"0123456789\" \"v\"".encode_utf16().collect();
        let mut outcome = Outcome::default();
        let err = LanguageFileParser::with_config(config)
            .parse_buffer(&units, &mut outcome)
            .unwrap_err();

        match err {
            ParseError::Overflow { limit, position } => {
                assert_eq!(limit, 8);
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 3);
            }
            other => panic!("Expected Overflow, got {:?}", other),
        }
        assert_eq!(outcome.end, Some((false, true)));
    }

    #[test]
    fn test_error_messages() {
        let position = Position {
            line: 4,
            column: 2,
            offset: 30,
        };

        assert_eq!(
            ParseError::StreamEnd { position }.to_string(),
            "Encountered end of stream at 4:2"
        );
        assert_eq!(
            ParseError::Overflow {
                limit: 256,
                position
            }
            .to_string(),
            "Token buffer overflow at 4:2 (limit 256)"
        );
        assert_eq!(
            ParseError::SectionBegin { position }.to_string(),
            "Unexpected new section at 4:2"
        );
        assert_eq!(
            ParseError::SectionEnd { position }.to_string(),
            "Unexpected section end at 4:2"
        );
        assert_eq!(
            ParseError::InvalidToken {
                condition: "$PS3".to_string(),
                position
            }
            .to_string(),
            "Unexpected condition '$PS3' at 4:2"
        );
    }

    #[test]
    fn test_stream_open_message_and_source() {
        let err = ParseError::StreamOpen {
            path: PathBuf::from("resource/missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "Unable to open file \"resource/missing.txt\": not found"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.code(), ErrorCode::StreamOpen);
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_error_codes() {
        let position = Position::new();
        let cases = [
            (
                ParseError::StreamRead {
                    message: String::new(),
                },
                ErrorCode::StreamRead,
                "stream_read",
            ),
            (ParseError::StreamEnd { position }, ErrorCode::StreamEnd, "stream_end"),
            (
                ParseError::Overflow { limit: 1, position },
                ErrorCode::Overflow,
                "overflow",
            ),
            (
                ParseError::SectionBegin { position },
                ErrorCode::SectionBegin,
                "section_begin",
            ),
            (
                ParseError::SectionEnd { position },
                ErrorCode::SectionEnd,
                "section_end",
            ),
            (
                ParseError::InvalidToken {
                    condition: String::new(),
                    position,
                },
                ErrorCode::InvalidToken,
                "invalid_token",
            ),
            (
                ParseError::Encoding {
                    message: String::new(),
                    position,
                },
                ErrorCode::Encoding,
                "encoding",
            ),
        ];

        for (err, code, name) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(code.to_string(), name);
        }
    }

    #[test]
    fn test_bounded_message() {
        let err = ParseError::StreamRead {
            message: "Missing byte-order mark".to_string(),
        };
        assert_eq!(err.bounded_message(8), "Missing");
        assert_eq!(err.bounded_message(1), "");
        assert_eq!(err.bounded_message(0), "");
        assert_eq!(err.bounded_message(1024), "Missing byte-order mark");
    }

    #[test]
    fn test_bounded_message_respects_char_boundaries() {
        let err = ParseError::StreamRead {
            message: "\u{e9}\u{e9}".to_string(),
        };
        // Three bytes available, the second character would need bytes 2..4
        assert_eq!(err.bounded_message(4), "\u{e9}");
    }

    #[test]
    fn test_on_end_runs_once_per_failure() {
        for text in [
            "}",
            "{",
            "[$WIN32]",
            "\"open",
            "\"k\" \"v\" \"s\" {",
            "\"k\" \"v\"",
        ] {
            let (_, outcome) = parse_err(text);
            assert_eq!(outcome.end, Some((false, true)), "{text:?}");
        }
    }
}
