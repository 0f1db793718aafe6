//! A concrete [`Lexer`] over a `&str`: a `Peekable<Chars>` cursor consumed by
//! small per-character-class match arms. Callers can swap in their own
//! [`Lexer`] implementation; this is the one the crate ships so it is usable
//! and testable standalone.

use super::{Lexer, Token};

/// Eats one non-whitespace token from the front of `input` (which must not
/// start with whitespace), returning the consumed byte length and the token.
/// `None` only at end of input.
fn eat(input: &str) -> Option<(usize, Token)> {
    let mut chars = input.chars();
    let first = chars.next()?;

    match first {
        '(' => Some((1, Token::BracketOpen)),
        ')' => Some((1, Token::BracketClose)),
        '=' => Some((1, Token::Equal)),
        '<' => {
            if chars.next() == Some('=') { Some((2, Token::SmallerEq)) } else { Some((1, Token::Smaller)) }
        }
        '>' => {
            if chars.next() == Some('=') { Some((2, Token::GreaterEq)) } else { Some((1, Token::Greater)) }
        }
        '"' => {
            let rest = &input[1..];
            match rest.find('"') {
                Some(end) => Some((1 + end + 1, Token::Word(rest[..end].to_string()))),
                // Unterminated quote: the rest of the input becomes one word.
                None => Some((input.len(), Token::Word(rest.to_string()))),
            }
        }
        _ => {
            let word_len = input.find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '"' | ':')).unwrap_or(input.len());
            let word_len = word_len.max(first.len_utf8());
            let word = &input[..word_len];

            if input[word_len..].starts_with(':') {
                let field_len = word_len + 1;
                let is_empty = match input[field_len..].chars().next() {
                    None => true,
                    Some(c) => c.is_whitespace() || c == ')',
                };
                return Some((
                    field_len,
                    if is_empty { Token::EmptyField(word.to_string()) } else { Token::Field(word.to_string()) },
                ));
            }

            Some((word_len, keyword_or_word(word)))
        }
    }
}

fn keyword_or_word(word: &str) -> Token {
    match word.to_ascii_uppercase().as_str() {
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        _ => Token::Word(word.to_string()),
    }
}

/// Tokenizes a `&str` query in place, with one token of lookahead.
pub struct StrLexer<'a> {
    remaining: &'a str,
    peeked: Option<Token>,
    exhausted: bool,
}

impl<'a> StrLexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { remaining: input, peeked: None, exhausted: false }
    }

    fn skip_whitespace(&mut self) {
        self.remaining = self.remaining.trim_start();
    }

    /// Lexes the next real token, advancing `remaining` past it.
    fn eat_next(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let (len, token) = eat(self.remaining)?;
        self.remaining = &self.remaining[len..];
        Some(token)
    }
}

impl Lexer for StrLexer<'_> {
    fn next(&mut self) -> (Token, Option<String>) {
        let token = match self.peeked.take() {
            Some(token) => Some(token),
            None => self.eat_next(),
        };
        match token {
            Some(token) => {
                let text = token.to_string();
                (token, Some(text))
            }
            None => {
                if self.exhausted {
                    (Token::None, None)
                } else {
                    self.exhausted = true;
                    (Token::Eos, None)
                }
            }
        }
    }

    fn peek(&mut self) -> Token {
        if self.peeked.is_none() {
            self.peeked = self.eat_next();
        }
        match &self.peeked {
            Some(token) => token.clone(),
            None => {
                if self.exhausted {
                    Token::None
                } else {
                    Token::Eos
                }
            }
        }
    }
}
