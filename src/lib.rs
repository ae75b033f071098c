//! This crate reads `.bib` files into plain maps, in pure, safe rust.
//!
//! `.bib` files are popular in reference management since many resources
//! allow to export metadata in a BibTeχ file. One entry in such a file can
//! look like this:
//!
//! ```tex
//! @book{DBLP:books/aw/Knuth73a,
//!     author    = {Donald E. Knuth},
//!     title     = {The Art of Computer Programming, Volume {I:} Fundamental Algorithms,
//!                  2nd Edition},
//!     publisher = {Addison-Wesley},
//!     year      = {1973},
//! }
//! ```
//!
//! We call `book` the `kind` or `type` and `DBLP:books/aw/Knuth73a` the `ID`.
//! Then we have a sequence of fields with a `name` (like `year`) and `data`
//! (like `1973`). The result of a parse maps every ID to its fields; the type
//! is stored among them under the reserved name [`TYPE_FIELD`].
//!
//! Field data is re-assembled from its words joined by single spaces. Inner
//! braces count as words of their own, so the title above reads
//! `The Art of Computer Programming, Volume { I: } Fundamental Algorithms, 2nd Edition`.
//!
//! ```rust
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let entries = bibparse::parse(r#"@book{tolkien1937, author = {J. R. R. Tolkien}}"#)?;
//!     let entry = &entries["tolkien1937"];
//!     assert_eq!(entry.kind(), Some("book"));
//!     assert_eq!(entry.get("author"), Some("J. R. R. Tolkien"));
//!     Ok(())
//! }
//! ```
//!
//! `@STRING` macros are collected but never expanded, and `@PREAMBLE` and
//! `@COMMENT` declarations are recognized without reading their bodies. Use a
//! [`Parser`] to get at the macros:
//!
//! ```rust
//! use bibparse::Parser;
//! use std::str::FromStr;
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     //let p = Parser::from_file("source.bib")?;
//!     let p = Parser::from_str("@string{acm = {Association for Computing Machinery}}")?;
//!     let bib = p.parse()?;
//!     assert_eq!(bib.strings["acm"], "Association for Computing Machinery");
//!     Ok(())
//! }
//! ```
//!
//! Parsing stops at the first malformed token with a [`ParseError`] telling
//! what was expected and where. Text outside of declarations is skipped.

mod cursor;
mod errors;
mod parser;
mod types;

pub use crate::cursor::Rule;
pub use crate::errors::{Location, ParseError};
pub use crate::parser::Parser;
pub use crate::types::{BibEntries, BibEntry, Bibliography, ParserConfig, TYPE_FIELD};

/// Parse `input` and return its entries, keyed by ID.
pub fn parse(input: &str) -> Result<BibEntries, ParseError> {
    parser::walk(input, ParserConfig::default()).map(Bibliography::into_entries)
}
