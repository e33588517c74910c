//! In-memory document tree built from parse events
//!
//! [`KeyValuesBuilder`] is a ready-made [`ParseListener`] that collects pairs
//! and sections into an ordered tree. The tree serializes with serde as nested
//! maps of strings, which makes it easy to dump or compare.

use crate::error::ParseError;
use crate::parser::{LanguageFileParser, ParseAction, ParseListener};
use indexmap::IndexMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::path::Path;

/// Ordered map of keys to nodes
pub type KeyValues = IndexMap<String, KvNode>;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KvNode {
    /// Plain key/value pair
    Value(String),
    /// Named section with its own entries
    Section(KeyValues),
}

impl KvNode {
    /// Returns true if the node is a value
    pub fn is_value(&self) -> bool {
        matches!(self, KvNode::Value(_))
    }

    /// Returns true if the node is a section
    pub fn is_section(&self) -> bool {
        matches!(self, KvNode::Section(_))
    }

    /// Returns the value text, if the node is a value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KvNode::Value(value) => Some(value),
            KvNode::Section(_) => None,
        }
    }

    /// Returns the section entries, if the node is a section
    pub fn as_section(&self) -> Option<&KeyValues> {
        match self {
            KvNode::Section(entries) => Some(entries),
            KvNode::Value(_) => None,
        }
    }

    /// Looks up a direct child of a section
    pub fn get(&self, key: &str) -> Option<&KvNode> {
        self.as_section()?.get(key)
    }
}

/// Behavior when a key repeats within one section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeyBehavior {
    /// Use the last value (override previous values)
    #[default]
    Override,
    /// Keep the first value and ignore later ones
    KeepFirst,
}

/// Listener that builds a [`KeyValues`] tree
#[derive(Debug, Default)]
pub struct KeyValuesBuilder {
    root: KeyValues,
    /// Open sections, innermost last
    stack: SmallVec<[(String, KeyValues); 8]>,
    duplicate_keys: DuplicateKeyBehavior,
    halted: bool,
    failed: bool,
}

impl KeyValuesBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the duplicate key behavior
    pub fn with_duplicate_key_behavior(mut self, behavior: DuplicateKeyBehavior) -> Self {
        self.duplicate_keys = behavior;
        self
    }

    /// Returns true if the parse was stopped by a listener action
    pub fn was_halted(&self) -> bool {
        self.halted
    }

    /// Returns true if the parse failed
    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Returns the collected tree.
    ///
    /// Sections still open (after a halt or error) are closed and kept.
    pub fn into_inner(mut self) -> KeyValues {
        while self.close_section() {}
        self.root
    }

    fn current(&mut self) -> &mut KeyValues {
        match self.stack.last_mut() {
            Some((_, entries)) => entries,
            None => &mut self.root,
        }
    }

    fn insert(&mut self, key: String, node: KvNode) {
        let behavior = self.duplicate_keys;
        let entries = self.current();
        match behavior {
            DuplicateKeyBehavior::Override => {
                entries.insert(key, node);
            }
            DuplicateKeyBehavior::KeepFirst => {
                entries.entry(key).or_insert(node);
            }
        }
    }

    fn close_section(&mut self) -> bool {
        match self.stack.pop() {
            Some((name, entries)) => {
                self.insert(name, KvNode::Section(entries));
                true
            }
            None => false,
        }
    }
}

impl ParseListener for KeyValuesBuilder {
    fn on_key_value(&mut self, key: &str, value: &str) -> ParseAction {
        self.insert(key.to_string(), KvNode::Value(value.to_string()));
        ParseAction::Continue
    }

    fn on_section_enter(&mut self, name: &str) -> ParseAction {
        self.stack.push((name.to_string(), KeyValues::new()));
        ParseAction::Continue
    }

    fn on_section_leave(&mut self) -> ParseAction {
        self.close_section();
        ParseAction::Continue
    }

    fn on_end(&mut self, halted: bool, failed: bool) {
        self.halted = halted;
        self.failed = failed;
    }
}

impl LanguageFileParser {
    /// Parses a UTF-16 buffer into a document tree
    pub fn parse_tree(&self, units: &[u16]) -> Result<KeyValues, ParseError> {
        let mut builder = KeyValuesBuilder::new();
        self.parse_buffer(units, &mut builder)?;
        Ok(builder.into_inner())
    }

    /// Reads a language file into a document tree
    pub fn parse_file_tree<P: AsRef<Path>>(&self, path: P) -> Result<KeyValues, ParseError> {
        let mut builder = KeyValuesBuilder::new();
        self.parse_file(path, &mut builder)?;
        Ok(builder.into_inner())
    }
}

/// Parses a UTF-16 buffer into a document tree with default configuration
pub fn from_utf16(units: &[u16]) -> Result<KeyValues, ParseError> {
    LanguageFileParser::new().parse_tree(units)
}

/// Reads a language file into a document tree with default configuration
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<KeyValues, ParseError> {
    LanguageFileParser::new().parse_file_tree(path)
}
