//! CQL (Contextual Query Language) compiler for SRU searches.
//!
//! [`compile`] parses a human-written query such as
//! `srw.kw="civil war" AND srw.au=hemingway` and renders it back in a
//! canonical spelling: single spaces between tokens, lower-case booleans and
//! named relations, and terms quoted only when they need to be.
//!
//! ```
//! use worldcat_search::cql;
//!
//! let compiled = cql::compile("srw.ti=dogs OR (srw.kw any \"cats mice\")").unwrap();
//! assert_eq!(compiled, "srw.ti = dogs or srw.kw any \"cats mice\"");
//! ```

mod lexer;
mod parser;

use std::fmt;

/// Syntax error in a CQL query
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at position {position}")]
pub struct CqlError {
    /// Character offset where the error was detected
    pub position: usize,
    pub message: String,
}

impl CqlError {
    pub(crate) fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// Boolean operator joining two clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    And,
    Or,
    Not,
    Prox,
}

impl BooleanOp {
    fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "and" => Some(BooleanOp::And),
            "or" => Some(BooleanOp::Or),
            "not" => Some(BooleanOp::Not),
            "prox" => Some(BooleanOp::Prox),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            BooleanOp::And => "and",
            BooleanOp::Or => "or",
            BooleanOp::Not => "not",
            BooleanOp::Prox => "prox",
        }
    }
}

/// `/name` or `/name<comparator>value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: String,
    pub comparator: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub comparator: String,
    pub modifiers: Vec<Modifier>,
}

/// Parsed query tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Clause {
        index: Option<String>,
        relation: Option<Relation>,
        term: String,
    },
    Boolean {
        op: BooleanOp,
        modifiers: Vec<Modifier>,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Parse a query into its tree form
pub fn parse(query: &str) -> Result<Node, CqlError> {
    let tokens = lexer::tokenize(query)?;
    parser::Parser::new(tokens, query.chars().count()).parse()
}

/// Parse and render a query in canonical form
pub fn compile(query: &str) -> Result<String, CqlError> {
    Ok(parse(query)?.to_string())
}

fn needs_quotes(term: &str) -> bool {
    term.is_empty()
        || BooleanOp::parse(term).is_some()
        || parser::is_named_relation(term)
        || term
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '/' | '"' | '=' | '<' | '>' | '\\'))
}

fn write_term(f: &mut fmt::Formatter<'_>, term: &str) -> fmt::Result {
    if needs_quotes(term) {
        write!(f, "\"{}\"", term)
    } else {
        f.write_str(term)
    }
}

fn write_modifiers(f: &mut fmt::Formatter<'_>, modifiers: &[Modifier]) -> fmt::Result {
    for m in modifiers {
        write!(f, "/{}", m.name)?;
        if let (Some(cmp), Some(value)) = (&m.comparator, &m.value) {
            f.write_str(cmp)?;
            write_term(f, value)?;
        }
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Clause {
                index,
                relation,
                term,
            } => {
                if let (Some(index), Some(relation)) = (index, relation) {
                    write!(f, "{} {}", index, relation.comparator)?;
                    write_modifiers(f, &relation.modifiers)?;
                    f.write_str(" ")?;
                }
                write_term(f, term)
            }
            Node::Boolean {
                op,
                modifiers,
                left,
                right,
            } => {
                write!(f, "{} {}", left, op.as_str())?;
                write_modifiers(f, modifiers)?;
                match right.as_ref() {
                    Node::Boolean { .. } => write!(f, " ({})", right),
                    clause => write!(f, " {}", clause),
                }
            }
        }
    }
}
