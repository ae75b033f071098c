use std::fmt;

use tracing::trace;

use crate::errors::{Location, ParseError};

/// A rule is one lexical unit the grammar walker asks for.
/// Remember, that a bib file declaration looks as follows:
///
/// ```tex
/// @Book{works:4,
///   author     = {Shakespeare, William},
///   title      = "Sonnets",
/// }
/// ```
///
/// In this case, the walker asks for (AtKey "Book", EnvelopeLeft "{",
/// EntryId "works:4", Key "author", ValueLeft "{", Word "Shakespeare,",
/// Word "William", ValueRight "}", Key "title", ValueLeft "\"", Word "Sonnets",
/// ValueRight "\"", EnvelopeRight "}"). Every rule swallows the whitespace
/// following it, so callers never skip whitespace themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// `@` followed by an identifier; the only rule searching forward
    AtKey,
    /// `{` or `(` opening a declaration
    EnvelopeLeft,
    /// the given delimiter closing a declaration
    EnvelopeRight(char),
    /// citation id terminated by a comma
    EntryId,
    /// field or macro name terminated by `=`
    Key,
    /// `{` or `"` opening a field value
    ValueLeft,
    /// `{` nested inside a field value
    InnerLeft,
    /// the given delimiter closing the innermost open value group
    ValueRight(char),
    /// complete macro value: an identifier, or a delimited body with
    /// at most one level of inner groups
    RawValue,
    /// run of characters other than braces, quotes and whitespace
    Word,
    Comma,
    Quote,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtKey => write!(f, "'@' and declaration type"),
            Self::EnvelopeLeft => write!(f, "'{{' or '(' opening the declaration"),
            Self::EnvelopeRight(close) => write!(f, "'{}' closing the declaration", close),
            Self::EntryId => write!(f, "entry ID followed by ','"),
            Self::Key => write!(f, "name followed by '='"),
            Self::ValueLeft => write!(f, "'{{' or '\"' opening the value"),
            Self::InnerLeft => write!(f, "'{{' inside the value"),
            Self::ValueRight(close) => write!(f, "'{}' closing the value", close),
            Self::RawValue => write!(f, "macro value"),
            Self::Word => write!(f, "word"),
            Self::Comma => write!(f, "','"),
            Self::Quote => write!(f, "'\"'"),
        }
    }
}

/// Outcome of a successful rule application on the unconsumed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Match<'s> {
    /// the captured part, e.g. the identifier without `@`
    pub(crate) text: &'s str,
    /// bytes skipped before the match started
    pub(crate) offset: usize,
    /// bytes covered by the match, trailing whitespace included
    pub(crate) len: usize,
}

/// Returns the closing delimiter paired with `open`.
pub(crate) fn closing(open: &str) -> char {
    match open {
        "(" => ')',
        "\"" => '"',
        _ => '}',
    }
}

fn is_ident(chr: char) -> bool {
    chr.is_ascii_alphanumeric() || matches!(chr, '_' | ':' | '\\' | '.' | '/' | '-')
}

fn ident_len(s: &str) -> usize {
    s.find(|chr: char| !is_ident(chr)).unwrap_or(s.len())
}

fn skip_whitespace(s: &str, at: usize) -> usize {
    s[at..]
        .find(|chr: char| !chr.is_whitespace())
        .map_or(s.len(), |i| at + i)
}

fn delimiter<'s>(rest: &'s str, accepted: &[char]) -> Option<Match<'s>> {
    let chr = rest.chars().next()?;
    if !accepted.contains(&chr) {
        return None;
    }
    Some(Match {
        text: &rest[..chr.len_utf8()],
        offset: 0,
        len: skip_whitespace(rest, chr.len_utf8()),
    })
}

/// `ident ws* <terminator> ws*`, capturing the identifier
fn terminated_ident(rest: &str, start: usize, terminator: char) -> Option<Match<'_>> {
    let n = ident_len(&rest[start..]);
    if n == 0 {
        return None;
    }
    let after = skip_whitespace(rest, start + n);
    if !rest[after..].starts_with(terminator) {
        return None;
    }
    Some(Match {
        text: &rest[start..start + n],
        offset: 0,
        len: skip_whitespace(rest, after + terminator.len_utf8()),
    })
}

/// `ws* ,? ws*` following a macro value
fn value_end(rest: &str, at: usize) -> usize {
    let end = skip_whitespace(rest, at);
    if rest[end..].starts_with(',') {
        skip_whitespace(rest, end + 1)
    } else {
        end
    }
}

/// Either a bare identifier, or the shortest body ending in `}` or `"`
/// outside of a group, where groups are brace pairs that must not nest.
fn raw_value(rest: &str) -> Option<Match<'_>> {
    let mut chars = rest.char_indices();
    match chars.next() {
        Some((_, '{' | '"')) => {}
        Some(_) => {
            let n = ident_len(rest);
            return (n > 0).then(|| Match {
                text: &rest[..n],
                offset: 0,
                len: value_end(rest, n),
            });
        }
        None => return None,
    }
    let mut grouped = false;
    for (i, chr) in chars {
        match (chr, grouped) {
            ('}' | '"', false) => {
                return Some(Match {
                    text: &rest[1..i],
                    offset: 0,
                    len: value_end(rest, i + 1),
                });
            }
            ('{', false) => grouped = true,
            ('}', true) => grouped = false,
            ('{', true) => return None,
            _ => {}
        }
    }
    None
}

impl Rule {
    /// Apply the rule to the start of `rest` (or, for `AtKey`, anywhere in it).
    pub(crate) fn find(self, rest: &str) -> Option<Match<'_>> {
        match self {
            Self::AtKey => rest.match_indices('@').find_map(|(at, _)| {
                let start = at + 1;
                let n = ident_len(&rest[start..]);
                (n > 0).then(|| Match {
                    text: &rest[start..start + n],
                    offset: at,
                    len: skip_whitespace(rest, start + n) - at,
                })
            }),
            Self::EnvelopeLeft => delimiter(rest, &['{', '(']),
            Self::EnvelopeRight(close) | Self::ValueRight(close) => delimiter(rest, &[close]),
            Self::EntryId => terminated_ident(rest, skip_whitespace(rest, 0), ','),
            Self::Key => terminated_ident(rest, 0, '='),
            Self::ValueLeft => delimiter(rest, &['{', '"']),
            Self::InnerLeft => delimiter(rest, &['{']),
            Self::RawValue => raw_value(rest),
            Self::Word => {
                let n = rest
                    .find(|chr: char| matches!(chr, '{' | '}' | '"') || chr.is_whitespace())
                    .unwrap_or(rest.len());
                (n > 0).then(|| Match {
                    text: &rest[..n],
                    offset: 0,
                    len: skip_whitespace(rest, n),
                })
            }
            Self::Comma => delimiter(rest, &[',']),
            Self::Quote => delimiter(rest, &['"']),
        }
    }
}

/// A read position over a borrowed input. It only ever moves forward,
/// and only when a rule matched.
#[derive(Debug)]
pub(crate) struct Cursor<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub(crate) fn new(src: &'s str) -> Cursor<'s> {
        Cursor { src, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Apply `rule` to the unconsumed input. On success the cursor moves past
    /// the match unless `peek_only` is set; on failure it never moves.
    pub(crate) fn match_first(&mut self, rule: Rule, peek_only: bool) -> Option<Match<'s>> {
        let found = self.peek(rule)?;
        if !peek_only {
            trace!(%rule, text = found.text, at = self.pos + found.offset, "consumed");
            self.pos += found.offset + found.len;
        }
        Some(found)
    }

    pub(crate) fn peek(&self, rule: Rule) -> Option<Match<'s>> {
        rule.find(&self.src[self.pos..])
    }

    pub(crate) fn eat(&mut self, rule: Rule) -> Option<Match<'s>> {
        self.match_first(rule, false)
    }

    /// Like `eat`, but a missing token aborts with the rule's name and position.
    pub(crate) fn expect(&mut self, rule: Rule) -> Result<Match<'s>, ParseError> {
        self.eat(rule).ok_or_else(|| ParseError::MissingToken {
            rule,
            location: self.location(),
        })
    }

    pub(crate) fn location(&self) -> Location {
        Location::resolve(self.src, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(rule: Rule, src: &str) -> Option<(&str, usize)> {
        let mut cursor = Cursor::new(src);
        cursor.eat(rule).map(|m| (m.text, cursor.pos()))
    }

    #[test]
    fn test_at_key_skips_leading_text() {
        assert_eq!(captured(Rule::AtKey, "junk @ @article {"), Some(("article", 16)));
        assert_eq!(captured(Rule::AtKey, "no declarations here"), None);
        assert_eq!(captured(Rule::AtKey, "mail@"), None);
    }

    #[test]
    fn test_entry_id_requires_comma() {
        assert_eq!(
            captured(Rule::EntryId, "  DBLP:books/lib/Knuth97 ,\n  author"),
            Some(("DBLP:books/lib/Knuth97", 29))
        );
        assert_eq!(captured(Rule::EntryId, "knuth97 author = {x}"), None);
    }

    #[test]
    fn test_key_requires_equals() {
        assert_eq!(captured(Rule::Key, "title  =  {x}"), Some(("title", 10)));
        assert_eq!(captured(Rule::Key, "title {x}"), None);
        assert_eq!(captured(Rule::Key, " title = {x}"), None);
    }

    #[test]
    fn test_word_stops_at_structure() {
        assert_eq!(captured(Rule::Word, "Knuth,  and"), Some(("Knuth,", 8)));
        assert_eq!(captured(Rule::Word, "a}"), Some(("a", 1)));
        assert_eq!(captured(Rule::Word, "\"quoted"), None);
        assert_eq!(captured(Rule::Word, "(x)"), Some(("(x)", 3)));
    }

    #[test]
    fn test_delimiters() {
        assert_eq!(captured(Rule::EnvelopeLeft, "( id,"), Some(("(", 2)));
        assert_eq!(captured(Rule::EnvelopeLeft, "[ id,"), None);
        assert_eq!(captured(Rule::EnvelopeRight(')'), ")\n\n@"), Some((")", 3)));
        assert_eq!(captured(Rule::EnvelopeRight(')'), "}"), None);
        assert_eq!(captured(Rule::ValueLeft, "\"x\""), Some(("\"", 1)));
        assert_eq!(captured(Rule::InnerLeft, "\"x\""), None);
    }

    #[test]
    fn test_raw_value() {
        assert_eq!(captured(Rule::RawValue, "{jan} , x"), Some(("jan", 8)));
        assert_eq!(captured(Rule::RawValue, "\"Jan {uary}\"}"), Some(("Jan {uary}", 12)));
        assert_eq!(captured(Rule::RawValue, "{}"), Some(("", 2)));
        // the first closer outside a group wins, whatever opened the value
        assert_eq!(captured(Rule::RawValue, "{say \"hi\"}"), Some(("say ", 6)));
        assert_eq!(captured(Rule::RawValue, "{a {b {c}} d}"), None);
        assert_eq!(captured(Rule::RawValue, "jan}"), Some(("jan", 3)));
        assert_eq!(captured(Rule::RawValue, "1999 ,\n)"), Some(("1999", 7)));
        assert_eq!(captured(Rule::RawValue, "= jan"), None);
    }

    #[test]
    fn test_peek_does_not_move() {
        let mut cursor = Cursor::new("@misc{x,}");
        assert!(cursor.match_first(Rule::AtKey, true).is_some());
        assert_eq!(cursor.pos(), 0);
        assert!(cursor.match_first(Rule::Key, false).is_none());
        assert_eq!(cursor.pos(), 0);
        assert!(cursor.match_first(Rule::AtKey, false).is_some());
        assert_eq!(cursor.pos(), 5);
    }

    #[test]
    fn test_expect_reports_rule_and_offset() {
        let mut cursor = Cursor::new("@misc x");
        cursor.expect(Rule::AtKey).unwrap();
        match cursor.expect(Rule::EnvelopeLeft) {
            Err(ParseError::MissingToken { rule, location }) => {
                assert_eq!(rule, Rule::EnvelopeLeft);
                assert_eq!(location.offset, 6);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
