//! A small arithmetic expression parser for the algebraic strings that
//! appear in a family config: momentum combinations (`"k1+p1"`), and
//! invariant-valued formulas (`"s/2 - m^2"`).
//!
//! Exactly the arithmetic subset this system needs: integer literals,
//! identifiers, `+ - * / ^`, unary minus, and parentheses. No function
//! calls.

use crate::error::IbpError;
use crate::modp::ModP;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

fn lex(source: &str) -> Result<Vec<Token>, IbpError> {
    let mut tokens = Vec::new();
    let bytes: Vec<char> = source.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = bytes[start..i].iter().collect();
                let value: i64 = text
                    .parse()
                    .map_err(|_| IbpError::ConfigError(format!("bad integer literal {text:?}")))?;
                tokens.push(Token::Integer(value));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_alphanumeric() || bytes[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(bytes[start..i].iter().collect()));
            }
            other => {
                return Err(IbpError::ConfigError(format!(
                    "unexpected character {other:?} in expression {source:?}"
                )))
            }
        }
    }
    Ok(tokens)
}

/// A parsed arithmetic expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    Integer(i64),
    Ident(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, u32),
}

/// Parse an arithmetic expression string into an `Expr` tree.
pub fn parse(source: &str) -> Result<Expr, IbpError> {
    let tokens = lex(source)?;
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_expr()?;
    if p.pos != p.tokens.len() {
        return Err(IbpError::ConfigError(format!(
            "trailing input in expression {source:?}"
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<Expr, IbpError> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<Expr, IbpError> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Div(Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // unary := '-' unary | power
    fn parse_unary(&mut self) -> Result<Expr, IbpError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_power()
    }

    // power := atom ('^' integer)?
    fn parse_power(&mut self) -> Result<Expr, IbpError> {
        let base = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            match self.advance() {
                Some(Token::Integer(n)) if n >= 0 => Ok(Expr::Pow(Box::new(base), n as u32)),
                other => Err(IbpError::ConfigError(format!(
                    "expected non-negative integer exponent, found {other:?}"
                ))),
            }
        } else {
            Ok(base)
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, IbpError> {
        match self.advance() {
            Some(Token::Integer(n)) => Ok(Expr::Integer(n)),
            Some(Token::Ident(name)) => Ok(Expr::Ident(name)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    other => Err(IbpError::ConfigError(format!(
                        "expected ')', found {other:?}"
                    ))),
                }
            }
            other => Err(IbpError::ConfigError(format!(
                "unexpected token {other:?} in expression"
            ))),
        }
    }
}

impl Expr {
    /// Evaluate as a `Poly` over momentum symbols. Division is rejected: no
    /// momentum combination in a propagator/scalar-product definition is
    /// ever a ratio of momenta.
    pub fn eval_as_poly(
        &self,
        resolve: &dyn Fn(&str) -> Option<crate::symbol::SymbolId>,
    ) -> Result<crate::algebra::poly::Poly, IbpError> {
        use crate::algebra::poly::Poly;
        match self {
            Expr::Integer(n) => Ok(Poly::constant(ModP::from_i64(*n))),
            Expr::Ident(name) => resolve(name)
                .map(Poly::symbol)
                .ok_or_else(|| IbpError::ConfigError(format!("undeclared symbol {name:?}"))),
            Expr::Neg(e) => Ok(e.eval_as_poly(resolve)?.neg()),
            Expr::Add(a, b) => Ok(a.eval_as_poly(resolve)?.add(&b.eval_as_poly(resolve)?)),
            Expr::Sub(a, b) => Ok(a.eval_as_poly(resolve)?.sub(&b.eval_as_poly(resolve)?)),
            Expr::Mul(a, b) => Ok(a.eval_as_poly(resolve)?.mul(&b.eval_as_poly(resolve)?)),
            Expr::Div(_, _) => Err(IbpError::ConfigError(
                "division is not permitted in a momentum expression".to_string(),
            )),
            Expr::Pow(base, exp) => {
                let b = base.eval_as_poly(resolve)?;
                let mut acc = Poly::constant(ModP::one());
                for _ in 0..*exp {
                    acc = acc.mul(&b);
                }
                Ok(acc)
            }
        }
    }

    /// Evaluate directly to a `ModP` scalar, resolving identifiers against
    /// an environment of already-numeric values (invariants, `D`).
    pub fn eval_as_modp(&self, resolve: &dyn Fn(&str) -> Option<ModP>) -> Result<ModP, IbpError> {
        match self {
            Expr::Integer(n) => Ok(ModP::from_i64(*n)),
            Expr::Ident(name) => {
                resolve(name).ok_or_else(|| IbpError::ConfigError(format!("undeclared symbol {name:?}")))
            }
            Expr::Neg(e) => Ok(-e.eval_as_modp(resolve)?),
            Expr::Add(a, b) => Ok(a.eval_as_modp(resolve)? + b.eval_as_modp(resolve)?),
            Expr::Sub(a, b) => Ok(a.eval_as_modp(resolve)? - b.eval_as_modp(resolve)?),
            Expr::Mul(a, b) => Ok(a.eval_as_modp(resolve)? * b.eval_as_modp(resolve)?),
            Expr::Div(a, b) => {
                let denom = b.eval_as_modp(resolve)?;
                Ok(a.eval_as_modp(resolve)? * denom.inverse()?)
            }
            Expr::Pow(base, exp) => Ok(base.eval_as_modp(resolve)?.pow(*exp as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolRegistry;

    #[test]
    fn parses_momentum_sum() {
        let mut reg = SymbolRegistry::new();
        let k1 = reg.intern("k1");
        let p1 = reg.intern("p1");
        let expr = parse("k1+p1").unwrap();
        let poly = expr
            .eval_as_poly(&|name| match name {
                "k1" => Some(k1),
                "p1" => Some(p1),
                _ => None,
            })
            .unwrap();
        assert_eq!(
            poly,
            crate::algebra::poly::Poly::symbol(k1).add(&crate::algebra::poly::Poly::symbol(p1))
        );
    }

    #[test]
    fn evaluates_invariant_formula() {
        let expr = parse("s/2 - m^2").unwrap();
        let s = ModP::from_i64(10);
        let m = ModP::from_i64(3);
        let value = expr
            .eval_as_modp(&|name| match name {
                "s" => Some(s),
                "m" => Some(m),
                _ => None,
            })
            .unwrap();
        let expected = s * ModP::from_i64(2).inverse().unwrap() - m * m;
        assert_eq!(value, expected);
    }

    #[test]
    fn rejects_division_in_momentum_expression() {
        let mut reg = SymbolRegistry::new();
        let k1 = reg.intern("k1");
        let expr = parse("k1/2").unwrap();
        let result = expr.eval_as_poly(&|name| if name == "k1" { Some(k1) } else { None });
        assert!(result.is_err());
    }
}
