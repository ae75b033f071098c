use std::convert::Infallible;
use std::fs;
use std::io::Read;
use std::path;
use std::str;

use tracing::{debug, trace};

use crate::cursor::{closing, Cursor, Rule};
use crate::errors::ParseError;
use crate::types::{BibEntry, Bibliography, ParserConfig, TYPE_FIELD};

/// Parser turning the content of a `.bib` file into a [`Bibliography`]
#[derive(Debug, Default)]
pub struct Parser {
    pub(crate) src: String,
    pub(crate) config: ParserConfig,
}

impl Parser {
    /// A parser without input; attach it with [`Parser::set_input`].
    pub fn new() -> Parser {
        Parser::default()
    }

    /// Use a file at some filepath as source for the parsing process.
    pub fn from_file<P: AsRef<path::Path>>(path: P) -> Result<Parser, ParseError> {
        let mut fd = fs::File::open(path)?;
        let mut buf = String::new();
        fd.read_to_string(&mut buf)?;
        Ok(Parser::from_string(buf))
    }

    /// Use a string as source for the parsing process.
    pub fn from_string(data: String) -> Parser {
        Parser {
            src: data,
            config: ParserConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Parser {
        self.config = config;
        self
    }

    pub fn set_input<S: Into<String>>(&mut self, data: S) {
        self.src = data.into();
    }

    /// Read all declarations. The first malformed token aborts the whole
    /// parse; nothing read up to that point is returned.
    pub fn parse(self) -> Result<Bibliography, ParseError> {
        walk(&self.src, self.config)
    }
}

impl str::FromStr for Parser {
    type Err = Infallible;

    /// Use a string as source for the parsing process.
    fn from_str(data: &str) -> Result<Self, Self::Err> {
        Ok(Parser::from_string(data.to_string()))
    }
}

/// What a `@head` introduces. Preambles and comments are recognized,
/// but their bodies are not read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Declaration<'s> {
    String,
    Preamble,
    Comment,
    Entry(&'s str),
}

impl<'s> Declaration<'s> {
    pub(crate) fn classify(head: &'s str) -> Declaration<'s> {
        if head.eq_ignore_ascii_case("string") {
            Self::String
        } else if head.eq_ignore_ascii_case("preamble") {
            Self::Preamble
        } else if head.eq_ignore_ascii_case("comment") {
            Self::Comment
        } else {
            Self::Entry(head)
        }
    }
}

pub(crate) fn walk(src: &str, config: ParserConfig) -> Result<Bibliography, ParseError> {
    let mut walker = Walker {
        cursor: Cursor::new(src),
        config,
        bib: Bibliography::default(),
    };
    walker.declarations()?;
    debug!(
        entries = walker.bib.entries.len(),
        strings = walker.bib.strings.len(),
        consumed = walker.cursor.pos(),
        "parsed bib source"
    );
    Ok(walker.bib)
}

/// The state of one parse: the cursor and everything collected so far
struct Walker<'s> {
    cursor: Cursor<'s>,
    config: ParserConfig,
    bib: Bibliography,
}

impl<'s> Walker<'s> {
    /// Read declarations until no further `@head` shows up.
    fn declarations(&mut self) -> Result<(), ParseError> {
        while self.cursor.match_first(Rule::AtKey, true).is_some() {
            let head = self.cursor.expect(Rule::AtKey)?.text;
            let left = self.cursor.expect(Rule::EnvelopeLeft)?.text;
            match Declaration::classify(head) {
                Declaration::String => self.string()?,
                Declaration::Preamble => self.preamble(),
                Declaration::Comment => self.comment(),
                Declaration::Entry(kind) => self.entry(kind)?,
            }
            self.cursor.expect(Rule::EnvelopeRight(closing(left)))?;
        }
        Ok(())
    }

    fn string(&mut self) -> Result<(), ParseError> {
        let key = self.cursor.expect(Rule::Key)?.text;
        let value = self.cursor.expect(Rule::RawValue)?.text;
        debug!(key, value, "string macro");
        self.bib.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn preamble(&self) {
        trace!(at = self.cursor.pos(), "preamble body skipped");
    }

    fn comment(&self) {
        trace!(at = self.cursor.pos(), "comment body skipped");
    }

    fn entry(&mut self, kind: &str) -> Result<(), ParseError> {
        let id = self.cursor.expect(Rule::EntryId)?.text;
        let mut entry = BibEntry::new();
        while let Some(key) = self.cursor.eat(Rule::Key) {
            let data = self.value()?.join(" ");
            entry.fields.insert(self.field_name(key.text), data);
        }
        entry
            .fields
            .insert(TYPE_FIELD.to_string(), kind.to_string());
        debug!(kind, id, fields = entry.len() - 1, "entry");
        if self.bib.entries.insert(id.to_string(), entry).is_some() {
            debug!(id, "entry replaces an earlier one with the same ID");
        }
        Ok(())
    }

    fn field_name(&self, key: &str) -> String {
        if self.config.upper_keys {
            key.to_uppercase()
        } else {
            key.to_string()
        }
    }

    /// Tokenize one delimited value. Inner braces are kept as tokens of their
    /// own, so `{a {b} c}` yields `a`, `{`, `b`, `}`, `c`.
    fn value(&mut self) -> Result<Vec<&'s str>, ParseError> {
        let open = self.cursor.expect(Rule::ValueLeft)?.text;
        let mut stack = vec![open];
        let mut tokens = Vec::new();
        while let Some(&top) = stack.last() {
            if let Some(inner) = self.cursor.eat(Rule::InnerLeft) {
                stack.push(inner.text);
                tokens.push(inner.text);
            } else if let Some(close) = self.cursor.eat(Rule::ValueRight(closing(top))) {
                tokens.push(close.text);
                stack.pop();
            } else if let Some(word) = self.cursor.eat(Rule::Word) {
                tokens.push(word.text);
            } else if let Some(quote) = self.cursor.eat(Rule::Quote) {
                tokens.push(quote.text);
            } else {
                return Err(ParseError::UnbalancedValue {
                    location: self.cursor.location(),
                });
            }
        }
        // the outer closing delimiter
        tokens.pop();
        self.cursor.eat(Rule::Comma);
        trace!(?tokens, "value");
        Ok(tokens)
    }
}
