//! Reply definitions
//!
//! Represents results handed back to callers.

use std::fmt;

/// A command result
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Short status text (`OK`, `PONG`, a type name)
    Status(String),

    Integer(i64),

    /// Binary-safe string; `None` is the nil reply
    Bulk(Option<Vec<u8>>),

    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".into())
    }

    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    pub fn bulk(bytes: impl Into<Vec<u8>>) -> Self {
        Reply::Bulk(Some(bytes.into()))
    }

    pub fn count(n: usize) -> Self {
        Reply::Integer(n as i64)
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Reply::Status(text) => write!(f, "{}", text),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Bulk(None) => write!(f, "(nil)"),
            Reply::Bulk(Some(bytes)) => write!(f, "\"{}\"", bytes.escape_ascii()),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                let width = items.len().to_string().len();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "\n{:indent$}", "", indent = indent)?;
                    }
                    write!(f, "{:>width$}) ", i + 1, width = width)?;
                    item.write_indented(f, indent + width + 2)?;
                }
                Ok(())
            }
        }
    }
}

/// Rendered the way an interactive client prints replies
impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
