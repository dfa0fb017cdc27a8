//! Tokenizer for Eva source, built on `logos`.

use std::ops::Range;

use logos::Logos;

use crate::ParseError;

/// Byte range of a token in the source text.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    pub fn from_range(range: Range<usize>) -> Self {
        let clamp = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
        Span::new(clamp(range.start), clamp(range.end))
    }

    /// Zero-width span at `offset`.
    pub fn point(offset: u32) -> Self {
        Span::new(offset, offset)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    LParen,
    RParen,
    Number(i64),
    String(String),
    Symbol(String),
    Eof,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Raw token from logos, before literal decoding.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", logos::skip)]
    Comment,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[0-9]+", priority = 3)]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    String,

    #[regex(r"[A-Za-z0-9_+\-*/=!<>?.%:]+")]
    Symbol,
}

/// Tokenize `source`. The returned list always ends with an [`TokenKind::Eof`] token.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut raw = RawToken::lexer(source);

    while let Some(next) = raw.next() {
        let span = Span::from_range(raw.span());
        let slice = raw.slice();

        let kind = match next {
            Ok(RawToken::LParen) => TokenKind::LParen,
            Ok(RawToken::RParen) => TokenKind::RParen,
            Ok(RawToken::Number) => match slice.parse::<i64>() {
                Ok(n) => TokenKind::Number(n),
                Err(_) => {
                    return Err(ParseError::NumberOutOfRange {
                        text: slice.to_string(),
                        span,
                    })
                }
            },
            Ok(RawToken::String) => TokenKind::String(unescape(&slice[1..slice.len() - 1])),
            Ok(RawToken::Symbol) => TokenKind::Symbol(slice.to_string()),
            // Comments are skipped by logos and never surface.
            Ok(RawToken::Comment) => continue,
            Err(()) if slice.starts_with('"') => {
                return Err(ParseError::UnterminatedString { span });
            }
            Err(()) => {
                return Err(ParseError::InvalidToken {
                    text: slice.to_string(),
                    span,
                });
            }
        };
        tokens.push(Token { kind, span });
    }

    let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::point(end),
    });
    tracing::trace!(count = tokens.len(), "lexed");
    Ok(tokens)
}

/// Decode `\n`, `\t`, `\r`, `\0`, `\"` and `\\`. Unknown escapes are kept verbatim.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn sym(s: &str) -> TokenKind {
        TokenKind::Symbol(s.to_string())
    }

    #[test]
    fn lexes_call_form() {
        assert_eq!(
            kinds("(+ x 42)"),
            vec![
                TokenKind::LParen,
                sym("+"),
                sym("x"),
                TokenKind::Number(42),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn operators_are_symbols() {
        assert_eq!(
            kinds("-> >= <= == != / *"),
            vec![
                sym("->"),
                sym(">="),
                sym("<="),
                sym("=="),
                sym("!="),
                sym("/"),
                sym("*"),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn digits_inside_names_stay_symbols() {
        assert_eq!(kinds("x1 2d"), vec![sym("x1"), sym("2d"), TokenKind::Eof]);
    }

    #[test]
    fn decodes_string_escapes() {
        assert_eq!(
            kinds(r#""a\n\t\"b\\""#),
            vec![TokenKind::String("a\n\t\"b\\".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn skips_comments() {
        let source = "// header\n(x /* inline */ y) // trailing";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::LParen,
                sym("x"),
                sym("y"),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans_point_at_source() {
        let tokens = lex("  (foo)").unwrap();
        assert_eq!(tokens[1].span, Span::new(3, 6));
        assert_eq!(tokens[3].span, Span::point(7));
    }

    #[test]
    fn rejects_unterminated_string() {
        assert!(matches!(
            lex("(printf \"oops"),
            Err(ParseError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn rejects_oversized_number() {
        assert!(matches!(
            lex("99999999999999999999999"),
            Err(ParseError::NumberOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_stray_characters() {
        assert!(matches!(lex("(x # y)"), Err(ParseError::InvalidToken { .. })));
    }
}
