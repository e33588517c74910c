//! Conditional directive evaluation
//!
//! A value may be followed by a bracketed directive such as `[$WIN32]` or
//! `[!$X360]`. The pair is only reported when the directive evaluates to true.
//!
//! Grammar:
//!
//! ```text
//! condition := '!' condition
//!            | '$' symbol
//!            | anything else      (unknown, evaluates to false)
//! ```
//!
//! Symbols are matched case-insensitively, first against the host resolvers
//! registered on the evaluator and then against a fixed platform table.

use std::collections::HashMap;
use tracing::warn;

/// Platform symbols known without any host support
const PLATFORM_SYMBOLS: &[(&str, bool)] = &[("WIN32", true), ("X360", false), ("PS3", false)];

/// Symbol answered by [`LowViolenceResolver`]
pub const LOW_VIOLENCE_SYMBOL: &str = "LOWVIOLENCE";

/// Trait for answering host-specific condition symbols
pub trait ConditionResolver {
    /// Resolves a symbol (without the leading `$`), `None` if unknown
    fn resolve(&self, symbol: &str) -> Option<bool>;
}

/// Map-based resolver with case-insensitive symbol names
pub struct MapConditionResolver {
    symbols: HashMap<String, bool>,
}

impl MapConditionResolver {
    /// Creates an empty resolver
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
        }
    }

    /// Creates a resolver from an existing map
    pub fn from_map(symbols: HashMap<String, bool>) -> Self {
        let mut resolver = Self::new();
        for (name, value) in symbols {
            resolver.insert(&name, value);
        }
        resolver
    }

    /// Inserts or replaces a symbol
    pub fn insert(&mut self, name: &str, value: bool) {
        self.symbols.insert(name.to_ascii_uppercase(), value);
    }
}

impl Default for MapConditionResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionResolver for MapConditionResolver {
    fn resolve(&self, symbol: &str) -> Option<bool> {
        self.symbols.get(&symbol.to_ascii_uppercase()).copied()
    }
}

/// Answers `$LOWVIOLENCE` by querying the host
pub struct LowViolenceResolver {
    query: Box<dyn Fn() -> bool>,
}

impl LowViolenceResolver {
    /// Creates a resolver that asks `query` each time the symbol is evaluated
    pub fn new(query: impl Fn() -> bool + 'static) -> Self {
        Self {
            query: Box::new(query),
        }
    }

    /// Creates a resolver with a fixed answer
    pub fn fixed(enabled: bool) -> Self {
        Self::new(move || enabled)
    }
}

impl ConditionResolver for LowViolenceResolver {
    fn resolve(&self, symbol: &str) -> Option<bool> {
        symbol
            .eq_ignore_ascii_case(LOW_VIOLENCE_SYMBOL)
            .then(|| (self.query)())
    }
}

/// Host resolvers consulted in registration order; the first answer wins
#[derive(Default)]
pub struct ChainedConditionResolver {
    chain: Vec<Box<dyn ConditionResolver>>,
}

impl ChainedConditionResolver {
    /// Creates an empty chain that resolves nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resolver after the ones already registered
    pub fn push(&mut self, resolver: Box<dyn ConditionResolver>) {
        self.chain.push(resolver);
    }

    /// Returns the chain with `resolver` appended
    pub fn with(mut self, resolver: Box<dyn ConditionResolver>) -> Self {
        self.push(resolver);
        self
    }

    /// Number of resolvers in the chain
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

impl FromIterator<Box<dyn ConditionResolver>> for ChainedConditionResolver {
    fn from_iter<I: IntoIterator<Item = Box<dyn ConditionResolver>>>(iter: I) -> Self {
        Self {
            chain: iter.into_iter().collect(),
        }
    }
}

impl ConditionResolver for ChainedConditionResolver {
    fn resolve(&self, symbol: &str) -> Option<bool> {
        self.chain.iter().find_map(|resolver| resolver.resolve(symbol))
    }
}

/// Parsed form of a condition directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr<'a> {
    /// `!` followed by another condition
    Not(Box<ConditionExpr<'a>>),
    /// `$` followed by a symbol name
    Symbol(&'a str),
    /// Anything else
    Unknown(&'a str),
}

impl<'a> ConditionExpr<'a> {
    /// Parses a condition directive (the text between the brackets)
    pub fn parse(text: &'a str) -> Self {
        if let Some(rest) = text.strip_prefix('!') {
            return ConditionExpr::Not(Box::new(Self::parse(rest)));
        }
        match text.strip_prefix('$') {
            Some(symbol) => ConditionExpr::Symbol(symbol),
            None => ConditionExpr::Unknown(text),
        }
    }
}

/// Evaluates condition directives against the platform table and host resolvers
#[derive(Default)]
pub struct ConditionEvaluator {
    host: ChainedConditionResolver,
}

impl ConditionEvaluator {
    /// Creates an evaluator that only knows the platform table
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a host resolver, consulted before the platform table
    pub fn add_resolver(&mut self, resolver: Box<dyn ConditionResolver>) {
        self.host.push(resolver);
    }

    /// Returns the number of registered host resolvers
    pub fn resolver_count(&self) -> usize {
        self.host.len()
    }

    /// Evaluates a condition directive. Unknown symbols evaluate to false.
    pub fn evaluate(&self, text: &str) -> bool {
        self.evaluate_expr(&ConditionExpr::parse(text))
    }

    /// Evaluates an already parsed condition
    pub fn evaluate_expr(&self, expr: &ConditionExpr<'_>) -> bool {
        match expr {
            ConditionExpr::Not(inner) => !self.evaluate_expr(inner),
            ConditionExpr::Symbol(symbol) => self.resolve(symbol).unwrap_or_else(|| {
                warn!(symbol = %symbol, "unknown condition symbol");
                false
            }),
            ConditionExpr::Unknown(text) => {
                warn!(condition = %text, "unknown condition");
                false
            }
        }
    }

    /// Resolves a symbol without the leading `$`
    pub fn resolve(&self, symbol: &str) -> Option<bool> {
        self.host.resolve(symbol).or_else(|| {
            PLATFORM_SYMBOLS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(symbol))
                .map(|&(_, value)| value)
        })
    }
}
