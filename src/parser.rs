//! Streaming language file parser
//!
//! The parser pulls tokens from the [`Tokenizer`], pairs strings into keys
//! and values, tracks section depth and pushes every event to a
//! [`ParseListener`]. Nothing is built in memory; the listener decides what to
//! keep and whether parsing continues.

use crate::codec::{self, CodecError};
use crate::condition::{ConditionEvaluator, ConditionResolver};
use crate::error::{ParseError, Position};
use crate::lexer::{Token, Tokenizer};
use tracing::{debug, trace};

/// Default buffer size for keys, section names and condition directives
pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;

/// Default buffer size for values
pub const DEFAULT_MAX_VALUE_LENGTH: usize = 2048;

/// Listener decision after each callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseAction {
    /// Keep parsing
    Continue,
    /// Stop parsing, the result is still usable
    Halt,
    /// Stop parsing and mark the parse as failed
    HaltFail,
}

/// Receives parse events.
///
/// Callbacks run synchronously on the parsing thread. Returning anything other
/// than [`ParseAction::Continue`] stops the parse; [`ParseListener::on_end`]
/// still runs exactly once.
pub trait ParseListener {
    /// Called once before the first token is read
    fn on_start(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    /// Called for every reported key/value pair
    fn on_key_value(&mut self, _key: &str, _value: &str) -> ParseAction {
        ParseAction::Continue
    }

    /// Called when a section named `name` opens
    fn on_section_enter(&mut self, _name: &str) -> ParseAction {
        ParseAction::Continue
    }

    /// Called when the innermost open section closes
    fn on_section_leave(&mut self) -> ParseAction {
        ParseAction::Continue
    }

    /// Called once when parsing stops for any reason.
    ///
    /// `halted` is set when a callback stopped the parse, `failed` when that
    /// callback returned [`ParseAction::HaltFail`] or a parse error occurred.
    fn on_end(&mut self, _halted: bool, _failed: bool) {}
}

/// Configuration options for the parser
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Buffer size for keys, section names and conditions, terminator included
    pub max_key_length: usize,
    /// Buffer size for values, terminator included
    pub max_value_length: usize,
}

impl ParserConfig {
    /// Creates a new parser configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key buffer size
    pub fn with_max_key_length(mut self, max_key_length: usize) -> Self {
        self.max_key_length = max_key_length;
        self
    }

    /// Sets the value buffer size
    pub fn with_max_value_length(mut self, max_value_length: usize) -> Self {
        self.max_value_length = max_value_length;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_key_length: DEFAULT_MAX_KEY_LENGTH,
            max_value_length: DEFAULT_MAX_VALUE_LENGTH,
        }
    }
}

/// Builder for [`LanguageFileParser`]
#[derive(Default)]
pub struct LanguageFileParserBuilder {
    config: ParserConfig,
    conditions: ConditionEvaluator,
}

impl LanguageFileParserBuilder {
    /// Creates a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the parser configuration
    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a host condition resolver
    pub fn with_condition_resolver(mut self, resolver: Box<dyn ConditionResolver>) -> Self {
        self.conditions.add_resolver(resolver);
        self
    }

    /// Builds the parser
    pub fn build(self) -> LanguageFileParser {
        LanguageFileParser {
            config: self.config,
            conditions: self.conditions,
        }
    }
}

/// Parser for language file buffers.
///
/// The parser holds configuration only; every call to
/// [`LanguageFileParser::parse_buffer`] runs an independent session, so one
/// parser can be reused for any number of buffers.
#[derive(Default)]
pub struct LanguageFileParser {
    config: ParserConfig,
    conditions: ConditionEvaluator,
}

impl LanguageFileParser {
    /// Creates a parser with default configuration and the platform table only
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with a custom configuration
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            conditions: ConditionEvaluator::new(),
        }
    }

    /// Returns a builder for a parser with host condition resolvers
    pub fn builder() -> LanguageFileParserBuilder {
        LanguageFileParserBuilder::new()
    }

    /// Returns the parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Returns the condition evaluator
    pub fn conditions(&self) -> &ConditionEvaluator {
        &self.conditions
    }

    /// Parses a buffer of UTF-16 code units.
    ///
    /// The buffer must already be in native byte order with any byte-order
    /// mark removed. A zero unit or the end of the slice ends the input.
    /// Listener halts are not errors: the call returns `Ok(())` and the
    /// listener learns the outcome through [`ParseListener::on_end`].
    pub fn parse_buffer<L>(&self, units: &[u16], listener: &mut L) -> Result<(), ParseError>
    where
        L: ParseListener + ?Sized,
    {
        debug!(units = units.len(), "parsing language buffer");
        let result = Session::new(self, units).run(listener);
        match &result {
            Ok(()) => debug!("language buffer parsed"),
            Err(err) => debug!(code = %err.code(), error = %err, "language buffer rejected"),
        }
        result
    }
}

/// Parses a buffer with a default-configured parser
pub fn parse_buffer<L>(units: &[u16], listener: &mut L) -> Result<(), ParseError>
where
    L: ParseListener + ?Sized,
{
    LanguageFileParser::new().parse_buffer(units, listener)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Just started, had a condition, entered or left a section
    Default,
    GotKey,
    GotValue,
}

/// Outcome of one loop iteration
enum Step {
    Next(ParseAction),
    Finished,
}

/// A lexed token whose dispatch waits for the next iteration
struct PendingToken {
    token: Token,
    position: Position,
    /// The pending pair was already reported before the token was parked
    flushed: bool,
}

/// State of a single parse call
struct Session<'p, 'a> {
    parser: &'p LanguageFileParser,
    tokenizer: Tokenizer<'a>,
    state: State,
    depth: usize,
    key: String,
    value: String,
    condition: String,
    pending: Option<PendingToken>,
    /// Set once any token other than end of input was read
    read_any: bool,
}

impl<'p, 'a> Session<'p, 'a> {
    fn new(parser: &'p LanguageFileParser, units: &'a [u16]) -> Self {
        Self {
            parser,
            tokenizer: Tokenizer::new(units),
            state: State::Default,
            depth: 0,
            key: String::new(),
            value: String::new(),
            condition: String::new(),
            pending: None,
            read_any: false,
        }
    }

    fn run<L>(mut self, listener: &mut L) -> Result<(), ParseError>
    where
        L: ParseListener + ?Sized,
    {
        let mut action = listener.on_start();

        let result = loop {
            if action != ParseAction::Continue {
                break Ok(());
            }

            match self.step(listener) {
                Ok(Step::Next(next)) => action = next,
                Ok(Step::Finished) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        let halted = action != ParseAction::Continue;
        let failed = action == ParseAction::HaltFail || result.is_err();
        listener.on_end(halted, failed);
        result
    }

    fn step<L>(&mut self, listener: &mut L) -> Result<Step, ParseError>
    where
        L: ParseListener + ?Sized,
    {
        let (token, position, flushed) = match self.pending.take() {
            Some(pending) => (pending.token, pending.position, pending.flushed),
            None => {
                // Values may be long phrases, everything else uses the key buffer
                let max_len = match self.state {
                    State::GotKey => self.parser.config.max_value_length,
                    State::Default | State::GotValue => self.parser.config.max_key_length,
                };
                let token = self.tokenizer.read_token(max_len)?;
                (token, self.tokenizer.last_token_start(), false)
            }
        };

        // A new key, a section marker or the end of input flushes the previous pair
        let flushes_pair = matches!(
            token,
            Token::String(_) | Token::SectionBegin | Token::SectionEnd | Token::Eof
        );
        if self.state == State::GotValue && flushes_pair && !flushed {
            let action = listener.on_key_value(&self.key, &self.value);
            if action != ParseAction::Continue {
                self.pending = Some(PendingToken {
                    token,
                    position,
                    flushed: true,
                });
                return Ok(Step::Next(action));
            }
        }

        let kind = token.type_name();
        let step = self.dispatch(token, position, listener)?;
        trace!(
            token = kind,
            state = ?self.state,
            depth = self.depth,
            key = %self.key,
            value = %self.value,
            "token dispatched"
        );
        Ok(step)
    }

    fn dispatch<L>(
        &mut self,
        token: Token,
        position: Position,
        listener: &mut L,
    ) -> Result<Step, ParseError>
    where
        L: ParseListener + ?Sized,
    {
        if token != Token::Eof {
            self.read_any = true;
        }
        let config = &self.parser.config;

        match token {
            Token::String(units) => {
                match self.state {
                    State::Default | State::GotValue => {
                        transcode_token(&units, &mut self.key, config.max_key_length, position)?;
                        self.state = State::GotKey;
                    }
                    State::GotKey => {
                        transcode_token(
                            &units,
                            &mut self.value,
                            config.max_value_length,
                            position,
                        )?;
                        self.state = State::GotValue;
                    }
                }
                Ok(Step::Next(ParseAction::Continue))
            }
            Token::SectionBegin => match self.state {
                State::GotKey | State::GotValue => {
                    self.depth += 1;
                    self.state = State::Default;
                    Ok(Step::Next(listener.on_section_enter(&self.key)))
                }
                State::Default => Err(ParseError::SectionBegin { position }),
            },
            Token::SectionEnd => {
                if self.state == State::GotKey || self.depth == 0 {
                    return Err(ParseError::SectionEnd { position });
                }

                self.depth -= 1;
                self.state = State::Default;

                let action = listener.on_section_leave();
                if action == ParseAction::Continue && self.depth == 0 {
                    Ok(Step::Finished)
                } else {
                    Ok(Step::Next(action))
                }
            }
            Token::Condition(units) => {
                transcode_token(
                    &units,
                    &mut self.condition,
                    config.max_key_length,
                    position,
                )?;

                if self.state != State::GotValue {
                    return Err(ParseError::InvalidToken {
                        condition: self.condition.clone(),
                        position,
                    });
                }

                self.state = State::Default;
                if self.parser.conditions.evaluate(&self.condition) {
                    Ok(Step::Next(listener.on_key_value(&self.key, &self.value)))
                } else {
                    trace!(condition = %self.condition, key = %self.key, "pair dropped by condition");
                    Ok(Step::Next(ParseAction::Continue))
                }
            }
            // Only a closing `}` ends a document; input without any token is empty
            Token::Eof if !self.read_any => Ok(Step::Finished),
            Token::Eof => Err(ParseError::StreamEnd { position }),
        }
    }
}

/// Transcodes a token payload into its destination buffer
fn transcode_token(
    units: &[u16],
    dst: &mut String,
    capacity: usize,
    position: Position,
) -> Result<(), ParseError> {
    codec::transcode(units, dst, capacity)
        .map(|_| ())
        .map_err(|err| match err {
            CodecError::Capacity { capacity } => ParseError::Overflow {
                limit: capacity,
                position,
            },
            CodecError::UnpairedSurrogate { .. } => ParseError::Encoding {
                message: err.to_string(),
                position,
            },
        })
}
