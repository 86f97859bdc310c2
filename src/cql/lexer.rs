//! Tokenizer for CQL query strings.

use super::CqlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    Slash,
    /// Symbolic comparator: `=`, `==`, `<>`, `<`, `>`, `<=`, `>=`
    Symbol(String),
    /// Unquoted word (index name, term, boolean or named relation)
    Word(String),
    /// Contents of a double-quoted string, escapes kept verbatim
    Quoted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Character offset in the input
    pub pos: usize,
}

fn is_word_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '/' | '"' | '=' | '<' | '>')
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, CqlError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let start = i;
        match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos: start });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos: start });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, pos: start });
                i += 1;
            }
            '=' | '<' | '>' => {
                let next = chars.get(i + 1).copied();
                let symbol = match (ch, next) {
                    ('=', Some('=')) | ('<', Some('>')) | ('<', Some('=')) | ('>', Some('=')) => {
                        i += 2;
                        format!("{}{}", ch, next.unwrap_or_default())
                    }
                    _ => {
                        i += 1;
                        ch.to_string()
                    }
                };
                tokens.push(Token { kind: TokenKind::Symbol(symbol), pos: start });
            }
            '"' => {
                i += 1;
                let mut content = String::new();
                let mut closed = false;
                while i < chars.len() {
                    match chars[i] {
                        '\\' => {
                            content.push('\\');
                            if let Some(&escaped) = chars.get(i + 1) {
                                content.push(escaped);
                            }
                            i += 2;
                        }
                        '"' => {
                            closed = true;
                            i += 1;
                            break;
                        }
                        other => {
                            content.push(other);
                            i += 1;
                        }
                    }
                }
                if !closed {
                    return Err(CqlError::new(start, "unterminated quoted string"));
                }
                tokens.push(Token { kind: TokenKind::Quoted(content), pos: start });
            }
            _ => {
                let mut word = String::new();
                while i < chars.len() && is_word_char(chars[i]) {
                    word.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token { kind: TokenKind::Word(word), pos: start });
            }
        }
    }

    Ok(tokens)
}
