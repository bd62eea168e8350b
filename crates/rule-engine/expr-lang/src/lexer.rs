//! Character-level scanner turning an expression string into [`Token`]s.

use crate::error::ExprError;
use crate::token::{Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ExprError> {
        self.skip_whitespace();
        let (pos, ch) = match self.chars.peek().copied() {
            Some(pair) => pair,
            None => return Ok(Token { kind: TokenKind::Eof, pos: self.source.len() }),
        };

        if ch.is_ascii_digit() {
            return self.lex_number(pos);
        }
        if ch == '\'' {
            return self.lex_string(pos);
        }
        if ch == '_' || ch.is_alphabetic() {
            return self.lex_ident_or_keyword(pos);
        }

        self.chars.next();
        let kind = match ch {
            '.' => TokenKind::Dot,
            ',' => TokenKind::Comma,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '%' => TokenKind::Percent,
            '*' => {
                if self.peek_char() == Some('*') {
                    self.chars.next();
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => TokenKind::Slash,
            '=' if self.peek_char() == Some('=') => {
                self.chars.next();
                TokenKind::EqEq
            }
            '!' if self.peek_char() == Some('=') => {
                self.chars.next();
                TokenKind::NotEq
            }
            '<' if self.peek_char() == Some('=') => {
                self.chars.next();
                TokenKind::Le
            }
            '<' => TokenKind::Lt,
            '>' if self.peek_char() == Some('=') => {
                self.chars.next();
                TokenKind::Ge
            }
            '>' => TokenKind::Gt,
            other => return Err(ExprError::ParseError(format!("unexpected character '{other}' at {pos}"))),
        };
        Ok(Token { kind, pos })
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, ExprError> {
        let mut end = start;
        let mut is_float = false;
        while let Some((i, c)) = self.chars.peek().copied() {
            if c.is_ascii_digit() {
                end = i + c.len_utf8();
                self.chars.next();
            } else if c == '.' && !is_float {
                is_float = true;
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| ExprError::ParseError(format!("invalid number literal '{text}'")))?;
            Ok(Token { kind: TokenKind::Float(value), pos: start })
        } else {
            let value: i64 = text
                .parse()
                .map_err(|_| ExprError::ParseError(format!("invalid number literal '{text}'")))?;
            Ok(Token { kind: TokenKind::Int(value), pos: start })
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, ExprError> {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => break,
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, '\'')) => value.push('\''),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(ExprError::ParseError("unterminated string literal".into())),
                },
                Some((_, c)) => value.push(c),
                None => return Err(ExprError::ParseError("unterminated string literal".into())),
            }
        }
        Ok(Token { kind: TokenKind::Str(value), pos: start })
    }

    fn lex_ident_or_keyword(&mut self, start: usize) -> Result<Token, ExprError> {
        let mut end = start;
        while let Some((i, c)) = self.chars.peek().copied() {
            if c == '_' || c.is_alphanumeric() {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        let kind = match text {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            _ => TokenKind::Ident(text.to_string()),
        };
        Ok(Token { kind, pos: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_field_reference() {
        assert_eq!(
            kinds("a.aid"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Dot,
                TokenKind::Ident("aid".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_star_and_power() {
        assert_eq!(kinds("2*3"), vec![TokenKind::Int(2), TokenKind::Star, TokenKind::Int(3), TokenKind::Eof]);
        assert_eq!(kinds("2**3"), vec![TokenKind::Int(2), TokenKind::StarStar, TokenKind::Int(3), TokenKind::Eof]);
    }

    #[test]
    fn lexes_comparisons() {
        assert_eq!(kinds("<="), vec![TokenKind::Le, TokenKind::Eof]);
        assert_eq!(kinds("!="), vec![TokenKind::NotEq, TokenKind::Eof]);
        assert_eq!(kinds("=="), vec![TokenKind::EqEq, TokenKind::Eof]);
    }

    #[test]
    fn lexes_quoted_string() {
        assert_eq!(kinds("'Excellent'"), vec![TokenKind::Str("Excellent".into()), TokenKind::Eof]);
    }

    #[test]
    fn lexes_keywords() {
        assert_eq!(
            kinds("true and not false"),
            vec![TokenKind::True, TokenKind::And, TokenKind::Not, TokenKind::False, TokenKind::Eof]
        );
    }
}
