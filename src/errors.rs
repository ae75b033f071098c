use std::fmt;
use std::io;

use thiserror::Error;

use crate::cursor::Rule;

/// Source code position attached to a [`ParseError`]
/// for improved error messages
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// byte offset of the cursor into the input
    pub offset: usize,
    /// zero-based line number
    pub lineno: usize,
    /// zero-based column, counted in characters
    pub colno: usize,
    /// the complete line the cursor stands on
    pub current_line: String,
}

impl Location {
    /// Resolve a byte `offset` within `src` to a line and column.
    pub(crate) fn resolve(src: &str, offset: usize) -> Location {
        let before = &src[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let line_end = src[offset..].find('\n').map_or(src.len(), |i| offset + i);
        Location {
            offset,
            lineno: before.matches('\n').count(),
            colno: before[line_start..].chars().count(),
            current_line: src[line_start..line_end].trim_end_matches('\r').to_string(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {lineno} col {colno}",
            lineno = self.lineno + 1,
            colno = self.colno + 1
        )?;
        if !self.current_line.trim().is_empty() {
            write!(f, "\n>> {}", self.current_line)?;
            write!(f, "\n   {:skip$}↑ here", "", skip = self.colno)?;
        }
        Ok(())
    }
}

/// Represents an error that aborted the parsing process.
/// There is no recovery: the first one raised ends the parse.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{rule} not found at {location}")]
    MissingToken { rule: Rule, location: Location },
    #[error("unbalanced value at {location}")]
    UnbalancedValue { location: Location },
    #[error("cannot read bib source: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// Where the parse stopped, if the error originates from the input text.
    pub fn location(&self) -> Option<&Location> {
        match self {
            Self::MissingToken { location, .. } | Self::UnbalancedValue { location } => {
                Some(location)
            }
            Self::Io(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_second_line() {
        let src = "@book{a,\n  title = {x}\n}";
        let offset = src.find("title").unwrap();
        let loc = Location::resolve(src, offset);
        assert_eq!(loc.lineno, 1);
        assert_eq!(loc.colno, 2);
        assert_eq!(loc.current_line, "  title = {x}");
    }

    #[test]
    fn test_display_points_at_column() {
        let err = ParseError::UnbalancedValue {
            location: Location::resolve("ab cd", 3),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("unbalanced value at line 1 col 4"));
        assert!(msg.contains(">> ab cd"));
        assert!(msg.ends_with("      ↑ here"));
    }

    #[test]
    fn test_blank_line_has_no_excerpt() {
        let loc = Location::resolve("x\n\n", 2);
        assert_eq!(loc.to_string(), "line 2 col 1");
    }
}
