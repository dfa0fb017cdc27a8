//! Syntax errors.

use crate::lexer::Span;

/// A syntax error with the byte span it was detected at.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character `{text}` at offset {}", .span.start)]
    InvalidToken { text: String, span: Span },

    #[error("unexpected `)` at offset {}", .span.start)]
    UnexpectedClose { span: Span },

    #[error("list opened at offset {} is never closed", .open.start)]
    UnclosedList { open: Span },

    #[error("unterminated string starting at offset {}", .span.start)]
    UnterminatedString { span: Span },

    #[error("number `{text}` does not fit in 64 bits")]
    NumberOutOfRange { text: String, span: Span },

    #[error("expected an expression, found end of input")]
    UnexpectedEof,

    #[error("unexpected input after expression at offset {}", .span.start)]
    TrailingInput { span: Span },
}

impl ParseError {
    /// Span of the offending input, if the error is tied to one.
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::InvalidToken { span, .. }
            | ParseError::UnexpectedClose { span }
            | ParseError::UnterminatedString { span }
            | ParseError::NumberOutOfRange { span, .. }
            | ParseError::TrailingInput { span } => Some(*span),
            ParseError::UnclosedList { open } => Some(*open),
            ParseError::UnexpectedEof => None,
        }
    }

    /// 1-based line and column of the error inside `source`.
    pub fn line_col(&self, source: &str) -> Option<(usize, usize)> {
        let offset = self.span()?.start as usize;
        let before = source.get(..offset)?;
        let line = before.matches('\n').count() + 1;
        let col = before.rfind('\n').map_or(offset, |nl| offset - nl - 1) + 1;
        Some((line, col))
    }
}
