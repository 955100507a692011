use crate::algebra::lexer::Lexeme;
use crate::algebra::Expr;
use crate::diagnostic::Diagnostic;
use crate::span::Spanned;

const MAX_NESTING_DEPTH: u32 = 256;

pub(crate) struct Parser {
    tokens: Vec<Spanned<Lexeme>>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    depth: u32,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned<Lexeme>>) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, Vec<Diagnostic>> {
        let expr = self.parse_expr();
        if self.diagnostics.is_empty() && !self.at_eof() {
            self.error(format!(
                "unexpected trailing input after expression: {}",
                describe(&self.current().node)
            ));
        }
        match expr {
            Some(expr) if self.diagnostics.is_empty() => Ok(expr),
            _ => Err(self.diagnostics),
        }
    }

    fn parse_expr(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_mul()?;
        loop {
            if self.eat(&Lexeme::Plus) {
                let rhs = self.parse_mul()?;
                lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
            } else if self.eat(&Lexeme::Minus) {
                let rhs = self.parse_mul()?;
                lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
            } else {
                return Some(lhs);
            }
        }
    }

    fn parse_mul(&mut self) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            if self.eat(&Lexeme::Star) {
                let rhs = self.parse_unary()?;
                lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
            } else if self.eat(&Lexeme::Slash) {
                let rhs = self.parse_unary()?;
                lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
            } else {
                return Some(lhs);
            }
        }
    }

    // Unary minus binds looser than `^`: -x^2 parses as -(x^2)
    fn parse_unary(&mut self) -> Option<Expr> {
        if self.eat(&Lexeme::Minus) {
            let inner = self.parse_unary()?;
            return Some(Expr::Neg(Box::new(inner)));
        }
        if self.eat(&Lexeme::Plus) {
            return self.parse_unary();
        }
        self.parse_pow()
    }

    fn parse_pow(&mut self) -> Option<Expr> {
        let base = self.parse_atom()?;
        if self.eat(&Lexeme::Caret) {
            // Right-associative; the exponent may carry its own sign
            let exponent = self.parse_unary()?;
            return Some(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Some(base)
    }

    fn parse_atom(&mut self) -> Option<Expr> {
        if !self.enter_nesting() {
            return None;
        }
        let result = self.parse_atom_inner();
        self.depth -= 1;
        result
    }

    fn parse_atom_inner(&mut self) -> Option<Expr> {
        let tok = self.current().clone();
        match tok.node {
            Lexeme::Int(value) => {
                self.pos += 1;
                Some(Expr::Int(value))
            }
            Lexeme::Float(value) => {
                self.pos += 1;
                Some(Expr::Float(value))
            }
            Lexeme::Ident(name) => {
                self.pos += 1;
                // `Name[...]` is external function application; `name(...)`
                // is the canonical printed form of the same thing
                if self.eat(&Lexeme::LBracket) {
                    let args = self.parse_args(&Lexeme::RBracket, "]")?;
                    Some(Expr::Call(name, args))
                } else if self.eat(&Lexeme::LParen) {
                    let args = self.parse_args(&Lexeme::RParen, ")")?;
                    Some(Expr::Call(name, args))
                } else {
                    Some(Expr::Symbol(name))
                }
            }
            Lexeme::LParen => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                self.expect(&Lexeme::RParen, ")")?;
                Some(inner)
            }
            Lexeme::Eof => {
                self.error("unexpected end of expression".to_string());
                None
            }
            other => {
                self.error(format!("unexpected {}", describe(&other)));
                None
            }
        }
    }

    fn parse_args(&mut self, close: &Lexeme, close_text: &str) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(close) {
            return Some(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Lexeme::Comma) {
                continue;
            }
            self.expect(close, close_text)?;
            return Some(args);
        }
    }

    fn enter_nesting(&mut self) -> bool {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            self.error(format!(
                "nesting depth exceeded (maximum {} levels)",
                MAX_NESTING_DEPTH
            ));
            return false;
        }
        true
    }

    fn current(&self) -> &Spanned<Lexeme> {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.current().node == Lexeme::Eof
    }

    fn eat(&mut self, lexeme: &Lexeme) -> bool {
        if &self.current().node == lexeme {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, lexeme: &Lexeme, text: &str) -> Option<()> {
        if self.eat(lexeme) {
            Some(())
        } else {
            self.error(format!(
                "expected '{}', found {}",
                text,
                describe(&self.current().node)
            ));
            None
        }
    }

    fn error(&mut self, message: String) {
        let span = self.current().span;
        self.diagnostics.push(Diagnostic::error(message, span));
    }
}

fn describe(lexeme: &Lexeme) -> String {
    match lexeme {
        Lexeme::Int(v) => format!("number '{}'", v),
        Lexeme::Float(v) => format!("number '{}'", v),
        Lexeme::Ident(name) => format!("identifier '{}'", name),
        Lexeme::Plus => "'+'".to_string(),
        Lexeme::Minus => "'-'".to_string(),
        Lexeme::Star => "'*'".to_string(),
        Lexeme::Slash => "'/'".to_string(),
        Lexeme::Caret => "'^'".to_string(),
        Lexeme::LParen => "'('".to_string(),
        Lexeme::RParen => "')'".to_string(),
        Lexeme::LBracket => "'['".to_string(),
        Lexeme::RBracket => "']'".to_string(),
        Lexeme::Comma => "','".to_string(),
        Lexeme::Eof => "end of expression".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::lexer::Lexer;

    fn parse(source: &str) -> Expr {
        let (tokens, errors) = Lexer::new(source, 0).tokenize();
        assert!(errors.is_empty());
        Parser::new(tokens).parse().expect("parse failed")
    }

    fn parse_err(source: &str) -> Vec<Diagnostic> {
        let (tokens, errors) = Lexer::new(source, 0).tokenize();
        assert!(errors.is_empty());
        Parser::new(tokens).parse().expect_err("parse succeeded")
    }

    #[test]
    fn test_bracket_and_paren_calls_agree() {
        assert_eq!(parse("Sqrt[lam]"), parse("Sqrt(lam)"));
    }

    #[test]
    fn test_precedence() {
        // a + b*c, not (a + b)*c
        let expr = parse("a + b*c");
        match expr {
            Expr::Add(lhs, rhs) => {
                assert_eq!(*lhs, Expr::Symbol("a".to_string()));
                assert!(matches!(*rhs, Expr::Mul(_, _)));
            }
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let expr = parse("-x^2");
        assert!(matches!(expr, Expr::Neg(inner) if matches!(*inner, Expr::Pow(_, _))));
    }

    #[test]
    fn test_power_right_associative() {
        let expr = parse("a^b^c");
        match expr {
            Expr::Pow(base, exponent) => {
                assert_eq!(*base, Expr::Symbol("a".to_string()));
                assert!(matches!(*exponent, Expr::Pow(_, _)));
            }
            other => panic!("expected Pow, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_exponent() {
        let expr = parse("x^-2");
        assert!(matches!(expr, Expr::Pow(_, _)));
    }

    #[test]
    fn test_multi_argument_call() {
        let expr = parse("Log[x, y]");
        match expr {
            Expr::Call(name, args) => {
                assert_eq!(name, "Log");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_bracket_is_error() {
        let errors = parse_err("Sqrt[lam");
        assert!(errors[0].message.contains("expected ']'"));
    }

    #[test]
    fn test_trailing_input_is_error() {
        let errors = parse_err("a b");
        assert!(errors[0].message.contains("trailing"));
    }

    #[test]
    fn test_empty_input_is_error() {
        let errors = parse_err("");
        assert!(errors[0].message.contains("end of expression"));
    }
}
