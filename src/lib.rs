//! # Langfile
//!
//! A streaming parser for KeyValues-style localization files.
//!
//! ## Overview
//!
//! Language files are nested, whitespace separated lists of quoted or bare
//! strings. Pairs of strings form keys and values, a key followed by `{ ... }`
//! opens a named section, and a value may be followed by a bracketed condition
//! that decides whether the pair is reported at all:
//!
//! ```text
//! "Phrases"
//! {
//!     // Comments run to the end of the line
//!     "Welcome"
//!     {
//!         "en"    "Welcome, {1}!"
//!         "de"    "Willkommen, {1}!"
//!     }
//!     "Gore"  "on"    [!$LOWVIOLENCE]
//!     "Gore"  "off"   [$LOWVIOLENCE]
//! }
//! ```
//!
//! Input is UTF-16. Every token is transcoded to UTF-8 before it reaches the
//! caller, and every token buffer has a fixed capacity: tokens that do not fit
//! are reported as errors instead of being truncated.
//!
//! ## Key Features
//!
//! - **Push-style parsing**: events go to a [`ParseListener`], nothing is
//!   buffered beyond the current pair
//! - **Conditional directives**: `[$WIN32]`, `[!$X360]` and host symbols
//!   through [`ConditionResolver`]
//! - **Unicode whitespace**: no-break and other Unicode spaces separate tokens
//! - **Precise errors**: line and column for every scanning error
//! - **Document tree**: [`KeyValuesBuilder`] collects an ordered, serde
//!   serializable tree
//!
//! ## Basic Usage
//!
//! ```rust
//! use langfile::{ParseAction, ParseListener, parse_buffer};
//!
//! #[derive(Default)]
//! struct Phrases(Vec<(String, String)>);
//!
//! impl ParseListener for Phrases {
//!     fn on_key_value(&mut self, key: &str, value: &str) -> ParseAction {
//!         self.0.push((key.to_string(), value.to_string()));
//!         ParseAction::Continue
//!     }
//! }
//!
//! let text: Vec<u16> = r#""Phrases" { "Hello" "World" }"#.encode_utf16().collect();
//! let mut phrases = Phrases::default();
//! parse_buffer(&text, &mut phrases)?;
//! assert_eq!(phrases.0, vec![("Hello".to_string(), "World".to_string())]);
//! # Ok::<(), langfile::ParseError>(())
//! ```
//!
//! ## Document Tree
//!
//! ```rust
//! use langfile::{KvNode, from_utf16};
//!
//! let text: Vec<u16> = r#""Phrases" { "Bye" { "en" "Goodbye" } }"#.encode_utf16().collect();
//! let tree = from_utf16(&text)?;
//! let english = tree["Phrases"].get("Bye").and_then(|bye| bye.get("en"));
//! assert_eq!(english.and_then(KvNode::as_str), Some("Goodbye"));
//! # Ok::<(), langfile::ParseError>(())
//! ```
//!
//! ## Host Conditions
//!
//! ```rust
//! use langfile::{LanguageFileParser, LowViolenceResolver};
//!
//! let parser = LanguageFileParser::builder()
//!     .with_condition_resolver(Box::new(LowViolenceResolver::fixed(true)))
//!     .build();
//!
//! let text: Vec<u16> = r#""s" { "gore" "on" [!$LOWVIOLENCE] "gore" "off" [$LOWVIOLENCE] }"#
//!     .encode_utf16()
//!     .collect();
//! let tree = parser.parse_tree(&text)?;
//! assert_eq!(tree["s"].get("gore").and_then(|n| n.as_str()), Some("off"));
//! # Ok::<(), langfile::ParseError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use langfile::{ErrorCode, from_utf16};
//!
//! let text: Vec<u16> = r#""a" "b" }"#.encode_utf16().collect();
//! let err = from_utf16(&text).unwrap_err();
//! assert_eq!(err.code(), ErrorCode::SectionEnd);
//!
//! let position = err.position().unwrap();
//! assert_eq!((position.line, position.column), (1, 9));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `warn` for unknown condition symbols,
//! `debug` around each parse and `trace` for every dispatched token. Install
//! any subscriber to see them.

pub mod codec;
pub mod condition;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod tree;

#[cfg(test)]
mod error_tests;

// Re-export main types and functions
pub use error::{ErrorCode, ParseError, Position};
pub use lexer::{Token, Tokenizer, is_unicode_whitespace};
pub use parser::{
    LanguageFileParser, LanguageFileParserBuilder, ParseAction, ParseListener, ParserConfig,
    parse_buffer,
};
pub use source::{ByteOrder, parse_bytes, parse_file};
pub use tree::{DuplicateKeyBehavior, KeyValues, KeyValuesBuilder, KvNode, from_file, from_utf16};

// Re-export condition handling
pub use condition::{
    ChainedConditionResolver, ConditionEvaluator, ConditionExpr, ConditionResolver,
    LowViolenceResolver, MapConditionResolver,
};

// Re-export codec
pub use codec::{CodecError, transcode};
