//! Recursive-descent reader from tokens to [`Exp`].

use eva_stack::maybe_grow;

use crate::lexer::{lex, Token, TokenKind};
use crate::{Exp, ParseError};

/// Parse exactly one expression; anything after it is an error.
pub fn parse(source: &str) -> Result<Exp, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(&tokens);
    let exp = parser.expression()?;
    parser.expect_eof()?;
    Ok(exp)
}

/// Parse a whole program: the top-level expressions wrapped as `(begin ...)`.
pub fn parse_program(source: &str) -> Result<Exp, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser::new(&tokens);
    let mut body = vec![Exp::symbol("begin")];
    while !parser.at_eof() {
        body.push(parser.expression()?);
    }
    tracing::debug!(forms = body.len() - 1, "parsed program");
    Ok(Exp::List(body))
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Current token. The stream always ends with `Eof`, which is never consumed.
    fn current(&self) -> &'t Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn at_eof(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn bump(&mut self) -> &'t Token {
        let token = self.current();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect_eof(&self) -> Result<(), ParseError> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(ParseError::TrailingInput {
                span: self.current().span,
            })
        }
    }

    fn expression(&mut self) -> Result<Exp, ParseError> {
        maybe_grow(|| {
            let token = self.bump();
            match &token.kind {
                TokenKind::Number(n) => Ok(Exp::Number(*n)),
                TokenKind::String(s) => Ok(Exp::String(s.clone())),
                TokenKind::Symbol(s) => Ok(Exp::Symbol(s.clone())),
                TokenKind::LParen => self.list_tail(token),
                TokenKind::RParen => Err(ParseError::UnexpectedClose { span: token.span }),
                TokenKind::Eof => Err(ParseError::UnexpectedEof),
            }
        })
    }

    /// Elements after `(` up to and including the matching `)`.
    fn list_tail(&mut self, open: &Token) -> Result<Exp, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::RParen => {
                    self.bump();
                    return Ok(Exp::List(items));
                }
                TokenKind::Eof => return Err(ParseError::UnclosedList { open: open.span }),
                _ => items.push(self.expression()?),
            }
        }
    }
}
