//! Formula tokenizer

use crate::error::{Error, Result};

/// A token in a formula
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Ident(String),
    Op(char), // +, -, *, /
    Pow,      // ^ or **
    LParen,
    RParen,
}

/// A token with the character offset where it starts
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

fn parse_error(formula: &str, position: usize, reason: impl Into<String>) -> Error {
    Error::Parse {
        formula: formula.to_string(),
        position,
        reason: reason.into(),
    }
}

/// Tokenize a formula string
pub(crate) fn tokenize(formula: &str) -> Result<Vec<Spanned>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = formula.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let pos = i;
        match chars[i] {
            c if c.is_whitespace() => {
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Spanned { token: Token::Pow, pos });
                i += 2;
            }
            '^' => {
                tokens.push(Spanned { token: Token::Pow, pos });
                i += 1;
            }
            '+' | '-' | '*' | '/' => {
                tokens.push(Spanned { token: Token::Op(chars[i]), pos });
                i += 1;
            }
            '(' => {
                tokens.push(Spanned { token: Token::LParen, pos });
                i += 1;
            }
            ')' => {
                tokens.push(Spanned { token: Token::RParen, pos });
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part: 1e-3, 2.5E+4
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let num_str: String = chars[pos..i].iter().collect();
                let num = num_str
                    .parse::<f64>()
                    .map_err(|_| parse_error(formula, pos, format!("invalid number '{}'", num_str)))?;
                tokens.push(Spanned { token: Token::Number(num), pos });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[pos..i].iter().collect();
                tokens.push(Spanned { token: Token::Ident(name), pos });
            }
            c => {
                return Err(parse_error(formula, pos, format!("unexpected character '{}'", c)));
            }
        }
    }

    Ok(tokens)
}
