//! The expression tree produced by the reader.

use std::fmt;

/// A parsed Eva expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Exp {
    Number(i64),
    /// String literal with escapes already decoded.
    String(String),
    Symbol(String),
    List(Vec<Exp>),
}

impl Exp {
    /// Build a symbol expression.
    pub fn symbol(name: impl Into<String>) -> Self {
        Exp::Symbol(name.into())
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Exp::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Exp]> {
        match self {
            Exp::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading symbol of a list, e.g. `if` for `(if c a b)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()?.first()?.as_symbol()
    }

    /// True if this is a list whose head is the symbol `tag`.
    pub fn is_tagged(&self, tag: &str) -> bool {
        self.tag() == Some(tag)
    }

    /// Short description used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Exp::Number(_) => "number",
            Exp::String(_) => "string",
            Exp::Symbol(_) => "symbol",
            Exp::List(_) => "list",
        }
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exp::Number(n) => write!(f, "{n}"),
            Exp::String(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"")
            }
            Exp::Symbol(name) => f.write_str(name),
            Exp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}
