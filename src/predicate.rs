use std::fmt::{self, Display};

use thiserror::Error;

use crate::operation::{OpType, Operation};

/// Boolean query over operations.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum Predicate {
    Any,
    Type(OpType),
    Category(String),
    Uncategorized,
    Account(String),
    Tag(String),
    Comment(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot compile an empty `{0}` predicate, use `any` instead")]
pub struct EmptyPredicateError(pub &'static str);

/// Compiled decision function. Holds no mutable state, so it can be shared and called freely.
pub type Matcher = Box<dyn Fn(&Operation) -> bool + Send + Sync>;

impl Predicate {
    pub fn category<T: Into<String>>(name: T) -> Self {
        Self::Category(name.into())
    }

    pub fn account<T: Into<String>>(name: T) -> Self {
        Self::Account(name.into())
    }

    pub fn tag<T: Into<String>>(tag: T) -> Self {
        Self::Tag(tag.into())
    }

    pub fn comment<T: Into<String>>(needle: T) -> Self {
        Self::Comment(needle.into())
    }

    pub fn not(inner: Predicate) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn compile(&self) -> Result<Matcher, EmptyPredicateError> {
        compile(self)
    }
}

pub fn compile(predicate: &Predicate) -> Result<Matcher, EmptyPredicateError> {
    let matcher: Matcher = match predicate {
        Predicate::Any => Box::new(|_: &Operation| true),
        Predicate::Type(t) => {
            let t = *t;
            Box::new(move |op: &Operation| op.op_type() == t)
        }
        Predicate::Category(name) => {
            let name = name.clone();
            Box::new(move |op: &Operation| {
                op.categories()
                    .map(|cats| cats.iter().any(|c| c.name == name))
                    .unwrap_or(false)
            })
        }
        Predicate::Uncategorized => Box::new(|op: &Operation| {
            op.categories()
                .map(|cats| cats.is_empty())
                .unwrap_or(false)
        }),
        Predicate::Account(name) => {
            let name = name.clone();
            Box::new(move |op: &Operation| op.account_sides().any(|acc| acc.name == name))
        }
        Predicate::Tag(tag) => {
            let tag = tag.clone();
            Box::new(move |op: &Operation| op.tags().iter().any(|t| *t == tag))
        }
        Predicate::Comment(needle) => {
            let needle = needle.clone();
            Box::new(move |op: &Operation| {
                op.comment()
                    .map(|c| c.contains(needle.as_str()))
                    .unwrap_or(false)
            })
        }
        Predicate::And(items) => match items.as_slice() {
            [] => return Err(EmptyPredicateError("and")),
            [single] => compile(single)?,
            _ => {
                let compiled = items.iter().map(compile).collect::<Result<Vec<_>, _>>()?;
                Box::new(move |op: &Operation| compiled.iter().all(|m| m(op)))
            }
        },
        Predicate::Or(items) => match items.as_slice() {
            [] => return Err(EmptyPredicateError("or")),
            [single] => compile(single)?,
            _ => {
                let compiled = items.iter().map(compile).collect::<Result<Vec<_>, _>>()?;
                Box::new(move |op: &Operation| compiled.iter().any(|m| m(op)))
            }
        },
        Predicate::Not(inner) => {
            let inner = compile(inner)?;
            Box::new(move |op: &Operation| !inner(op))
        }
    };

    Ok(matcher)
}

fn write_value(f: &mut fmt::Formatter, value: &str) -> fmt::Result {
    let bare = !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || ":()\"!&|".contains(c))
        && !matches!(value, "and" | "or" | "not" | "any" | "uncategorized");

    if bare {
        return write!(f, "{}", value);
    }

    write!(f, "\"")?;
    for c in value.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '"' => write!(f, "\\\"")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

fn write_joined(f: &mut fmt::Formatter, items: &[Predicate], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, ")")
}

/// Renders the predicate in the filter query grammar.
impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Predicate::Any => write!(f, "any"),
            Predicate::Type(t) => write!(f, "type:{}", t),
            Predicate::Category(c) => {
                write!(f, "category:")?;
                write_value(f, c)
            }
            Predicate::Uncategorized => write!(f, "uncategorized"),
            Predicate::Account(a) => {
                write!(f, "account:")?;
                write_value(f, a)
            }
            Predicate::Tag(t) => {
                write!(f, "tag:")?;
                write_value(f, t)
            }
            Predicate::Comment(c) => {
                write!(f, "comment:")?;
                write_value(f, c)
            }
            Predicate::And(items) => write_joined(f, items, "and"),
            Predicate::Or(items) => write_joined(f, items, "or"),
            Predicate::Not(inner) => write!(f, "not {}", inner),
        }
    }
}
