use crate::diagnostic::Diagnostic;
use crate::span::{Span, Spanned};

/// A token of the external algebra notation.
///
/// The grammar uses square brackets for function application and `^` for
/// exponentiation; the canonical printed form uses parenthesis calls and
/// `**`, and both are accepted so canonical text re-parses.
#[derive(Clone, Debug, PartialEq)]
pub enum Lexeme {
    Int(i64),
    Float(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Eof,
}

pub struct Lexer<'src> {
    source: &'src [u8],
    line: u32,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str, line: u32) -> Self {
        Self {
            source: source.as_bytes(),
            line,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> (Vec<Spanned<Lexeme>>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.node == Lexeme::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Spanned<Lexeme> {
        loop {
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }

            if self.pos >= self.source.len() {
                return self.make_token(Lexeme::Eof, self.pos, self.pos);
            }

            let start = self.pos;
            let ch = self.source[self.pos];

            if is_ident_start(ch) {
                return self.scan_ident(start);
            }

            if ch.is_ascii_digit() {
                return self.scan_number(start);
            }

            if let Some(tok) = self.scan_symbol(start) {
                return tok;
            }
            // scan_symbol recorded an error for an unexpected byte; skip it
        }
    }

    fn scan_ident(&mut self, start: usize) -> Spanned<Lexeme> {
        while self.pos < self.source.len() && is_ident_continue(self.source[self.pos]) {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.source[start..self.pos])
            .expect("identifier bytes are ASCII")
            .to_string();
        self.make_token(Lexeme::Ident(text), start, self.pos)
    }

    fn scan_number(&mut self, start: usize) -> Spanned<Lexeme> {
        let mut is_float = false;

        while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos < self.source.len()
            && self.source[self.pos] == b'.'
            && self.pos + 1 < self.source.len()
            && self.source[self.pos + 1].is_ascii_digit()
        {
            is_float = true;
            self.pos += 1;
            while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        // Exponent part: 1e-5, 2.5e10
        if self.pos < self.source.len()
            && (self.source[self.pos] == b'e' || self.source[self.pos] == b'E')
        {
            let mut lookahead = self.pos + 1;
            if lookahead < self.source.len()
                && (self.source[lookahead] == b'+' || self.source[lookahead] == b'-')
            {
                lookahead += 1;
            }
            if lookahead < self.source.len() && self.source[lookahead].is_ascii_digit() {
                is_float = true;
                self.pos = lookahead;
                while self.pos < self.source.len() && self.source[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }

        let text = std::str::from_utf8(&self.source[start..self.pos])
            .expect("number bytes are ASCII");

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => self.make_token(Lexeme::Float(value), start, self.pos),
                Err(_) => {
                    self.error(format!("invalid numeric literal '{}'", text), start);
                    self.make_token(Lexeme::Float(0.0), start, self.pos)
                }
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => self.make_token(Lexeme::Int(value), start, self.pos),
                // Integer literals too wide for i64 degrade to floats
                Err(_) => match text.parse::<f64>() {
                    Ok(value) => self.make_token(Lexeme::Float(value), start, self.pos),
                    Err(_) => {
                        self.error(format!("invalid numeric literal '{}'", text), start);
                        self.make_token(Lexeme::Int(0), start, self.pos)
                    }
                },
            }
        }
    }

    fn scan_symbol(&mut self, start: usize) -> Option<Spanned<Lexeme>> {
        let ch = self.source[self.pos];

        // `**` is the canonical power spelling, `^` the external one
        if ch == b'*' && self.pos + 1 < self.source.len() && self.source[self.pos + 1] == b'*' {
            self.pos += 2;
            return Some(self.make_token(Lexeme::Caret, start, self.pos));
        }

        let lexeme = match ch {
            b'+' => Lexeme::Plus,
            b'-' => Lexeme::Minus,
            b'*' => Lexeme::Star,
            b'/' => Lexeme::Slash,
            b'^' => Lexeme::Caret,
            b'(' => Lexeme::LParen,
            b')' => Lexeme::RParen,
            b'[' => Lexeme::LBracket,
            b']' => Lexeme::RBracket,
            b',' => Lexeme::Comma,
            _ => {
                self.error(
                    if ch.is_ascii() {
                        format!("unexpected character '{}'", ch as char)
                    } else {
                        "unexpected non-ASCII character (transliterate Greek symbols first)"
                            .to_string()
                    },
                    start,
                );
                // Skip the whole UTF-8 sequence, not just its first byte
                self.pos += 1;
                while self.pos < self.source.len() && (self.source[self.pos] & 0xC0) == 0x80 {
                    self.pos += 1;
                }
                return None;
            }
        };
        self.pos += 1;
        Some(self.make_token(lexeme, start, self.pos))
    }

    fn make_token(&self, lexeme: Lexeme, start: usize, end: usize) -> Spanned<Lexeme> {
        Spanned::new(lexeme, Span::new(self.line, start as u32, end as u32))
    }

    fn error(&mut self, message: String, start: usize) {
        self.diagnostics.push(Diagnostic::error(
            message,
            Span::new(self.line, start as u32, start as u32 + 1),
        ));
    }
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    ch.is_ascii_alphanumeric() || ch == b'_'
}
