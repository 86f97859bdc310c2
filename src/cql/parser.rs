//! Recursive-descent parser producing a [`Node`] tree.

use super::lexer::{Token, TokenKind};
use super::{BooleanOp, CqlError, Modifier, Node, Relation};

/// Relations spelled as words rather than symbols
const NAMED_RELATIONS: &[&str] = &["any", "all", "exact", "adj", "within", "encloses", "scr"];

pub(crate) fn is_named_relation(word: &str) -> bool {
    NAMED_RELATIONS
        .iter()
        .any(|r| r.eq_ignore_ascii_case(word))
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>, input_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end: input_len,
        }
    }

    /// Parse a whole query; trailing tokens are an error
    pub fn parse(mut self) -> Result<Node, CqlError> {
        if self.tokens.is_empty() {
            return Err(CqlError::new(0, "empty query"));
        }
        let node = self.parse_query()?;
        if let Some(token) = self.peek() {
            let message = match &token.kind {
                TokenKind::RParen => "unbalanced ')'".to_string(),
                other => format!("expected boolean operator, found {}", describe(other)),
            };
            return Err(CqlError::new(token.pos, message));
        }
        Ok(node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| &t.kind)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.end)
    }

    // scopedClause: clause (boolean modifiers clause)*, left associative
    fn parse_query(&mut self) -> Result<Node, CqlError> {
        let mut left = self.parse_clause()?;

        while let Some(op) = self.peek_boolean() {
            self.pos += 1;
            let modifiers = self.parse_modifiers()?;
            let right = self.parse_clause()?;
            left = Node::Boolean {
                op,
                modifiers,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn peek_boolean(&self) -> Option<BooleanOp> {
        match self.peek_kind_at(0) {
            Some(TokenKind::Word(w)) => BooleanOp::parse(w),
            _ => None,
        }
    }

    fn parse_clause(&mut self) -> Result<Node, CqlError> {
        let pos = self.position();
        let token = self
            .next()
            .ok_or_else(|| CqlError::new(pos, "unexpected end of query"))?;

        match token.kind {
            TokenKind::LParen => {
                let inner = self.parse_query()?;
                match self.next() {
                    Some(Token { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(other) => Err(CqlError::new(
                        other.pos,
                        format!("expected ')', found {}", describe(&other.kind)),
                    )),
                    None => Err(CqlError::new(self.end, "missing ')'")),
                }
            }
            TokenKind::Word(word) => {
                if BooleanOp::parse(&word).is_some() {
                    return Err(CqlError::new(
                        token.pos,
                        format!("expected search term, found boolean '{}'", word),
                    ));
                }
                if self.at_relation() {
                    let relation = self.parse_relation()?;
                    let term = self.parse_term()?;
                    Ok(Node::Clause {
                        index: Some(word),
                        relation: Some(relation),
                        term,
                    })
                } else {
                    Ok(Node::Clause {
                        index: None,
                        relation: None,
                        term: word,
                    })
                }
            }
            TokenKind::Quoted(term) => {
                if matches!(self.peek_kind_at(0), Some(TokenKind::Symbol(_))) {
                    return Err(CqlError::new(token.pos, "quoted string cannot be an index"));
                }
                Ok(Node::Clause {
                    index: None,
                    relation: None,
                    term,
                })
            }
            other => Err(CqlError::new(
                token.pos,
                format!("expected search clause, found {}", describe(&other)),
            )),
        }
    }

    fn at_relation(&self) -> bool {
        match self.peek_kind_at(0) {
            Some(TokenKind::Symbol(_)) => true,
            Some(TokenKind::Word(w)) if is_named_relation(w) => matches!(
                self.peek_kind_at(1),
                Some(TokenKind::Word(_)) | Some(TokenKind::Quoted(_)) | Some(TokenKind::Slash)
            ),
            _ => false,
        }
    }

    fn parse_relation(&mut self) -> Result<Relation, CqlError> {
        let comparator = match self.next().map(|t| t.kind) {
            Some(TokenKind::Symbol(s)) => s,
            Some(TokenKind::Word(w)) => w.to_lowercase(),
            _ => return Err(CqlError::new(self.position(), "expected relation")),
        };
        let modifiers = self.parse_modifiers()?;
        Ok(Relation {
            comparator,
            modifiers,
        })
    }

    fn parse_term(&mut self) -> Result<String, CqlError> {
        let pos = self.position();
        match self.next().map(|t| t.kind) {
            Some(TokenKind::Word(w)) | Some(TokenKind::Quoted(w)) => Ok(w),
            Some(other) => Err(CqlError::new(
                pos,
                format!("expected search term, found {}", describe(&other)),
            )),
            None => Err(CqlError::new(pos, "expected search term, found end of query")),
        }
    }

    fn parse_modifiers(&mut self) -> Result<Vec<Modifier>, CqlError> {
        let mut modifiers = Vec::new();
        while matches!(self.peek_kind_at(0), Some(TokenKind::Slash)) {
            self.pos += 1;
            let pos = self.position();
            let name = match self.next().map(|t| t.kind) {
                Some(TokenKind::Word(w)) => w,
                _ => return Err(CqlError::new(pos, "expected modifier name after '/'")),
            };
            let mut modifier = Modifier {
                name,
                comparator: None,
                value: None,
            };
            if let Some(TokenKind::Symbol(s)) = self.peek_kind_at(0).cloned() {
                self.pos += 1;
                modifier.comparator = Some(s);
                modifier.value = Some(self.parse_term()?);
            }
            modifiers.push(modifier);
        }
        Ok(modifiers)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::LParen => "'('".to_string(),
        TokenKind::RParen => "')'".to_string(),
        TokenKind::Slash => "'/'".to_string(),
        TokenKind::Symbol(s) => format!("'{}'", s),
        TokenKind::Word(w) => format!("'{}'", w),
        TokenKind::Quoted(q) => format!("\"{}\"", q),
    }
}
