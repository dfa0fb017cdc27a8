//! Reader for Eva source text.
//!
//! Eva is an S-expression language: every program is a tree of numbers,
//! strings, symbols and parenthesised lists. This crate turns source text
//! into that tree ([`Exp`]) and nothing more; the meaning of forms such as
//! `def` or `class` is decided by the code generator.
//!
//! ```text
//! source ──▶ lexer (logos) ──▶ tokens ──▶ parser ──▶ Exp
//! ```

mod error;
mod exp;
mod lexer;
mod parser;

pub use error::ParseError;
pub use exp::Exp;
pub use lexer::{lex, Span, Token, TokenKind};
pub use parser::{parse, parse_program};
