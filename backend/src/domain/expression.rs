//! Restricted arithmetic evaluator for the actual-spending line of a cell.
//!
//! Grammar (standard precedence, left associative):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | '(' expr ')'
//! number := digits ['.' digits] | '.' digits
//! ```
//!
//! Only digits, `+ - * / ( ) .` and whitespace are accepted. Nothing here is
//! executed dynamically.

use super::money::MoneyFormatter;
use thiserror::Error;

/// Result of evaluating an actual-spending expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Nothing recorded yet
    Empty,
    Value(f64),
    /// Rejected or failed expression
    NotANumber,
}

impl Evaluation {
    /// Amount this evaluation adds to a sum. Empty and NotANumber count as 0.
    pub fn contribution(&self) -> f64 {
        match self {
            Evaluation::Value(v) => *v,
            Evaluation::Empty | Evaluation::NotANumber => 0.0,
        }
    }

    pub fn is_not_a_number(&self) -> bool {
        matches!(self, Evaluation::NotANumber)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("Character '{0}' is not allowed in an expression")]
    InvalidCharacter(char),
    #[error("Malformed number '{0}'")]
    MalformedNumber(String),
    #[error("Unexpected token at position {0}")]
    UnexpectedToken(usize),
    #[error("Unexpected end of expression")]
    UnexpectedEnd,
    #[error("Missing closing parenthesis")]
    UnclosedParenthesis,
    #[error("Result is not a finite number")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LeftParen,
    RightParen,
}

/// Evaluate an expression typed into an actual-spending line.
///
/// The currency symbol is stripped before the character whitelist is applied,
/// so `£12 + £3` evaluates to 15.
pub fn evaluate_expression(expr: &str, formatter: &MoneyFormatter) -> Evaluation {
    let cleaned = formatter.strip_currency_symbol(expr.trim());
    if cleaned.trim().is_empty() {
        return Evaluation::Empty;
    }
    match evaluate(&cleaned) {
        Ok(value) => Evaluation::Value(value),
        Err(_) => Evaluation::NotANumber,
    }
}

/// Evaluate a cleaned expression, reporting why it was rejected
pub fn evaluate(expr: &str) -> Result<f64, ExpressionError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser { tokens: &tokens, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos < tokens.len() {
        return Err(ExpressionError::UnexpectedToken(parser.pos));
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ExpressionError::NonFinite)
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if literal == "." || literal.matches('.').count() > 1 {
                    return Err(ExpressionError::MalformedNumber(literal));
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::MalformedNumber(literal.clone()))?;
                tokens.push(Token::Number(value));
            }
            '+' => {
                tokens.push(Token::Plus);
                chars.next();
            }
            '-' => {
                tokens.push(Token::Minus);
                chars.next();
            }
            '*' => {
                tokens.push(Token::Star);
                chars.next();
            }
            '/' => {
                tokens.push(Token::Slash);
                chars.next();
            }
            '(' => {
                tokens.push(Token::LeftParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RightParen);
                chars.next();
            }
            other => return Err(ExpressionError::InvalidCharacter(other)),
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_expr(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.parse_term()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Plus => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Token::Minus => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.parse_factor()?;
        while let Some(token) = self.peek() {
            match token {
                Token::Star => {
                    self.pos += 1;
                    value *= self.parse_factor()?;
                }
                Token::Slash => {
                    self.pos += 1;
                    value /= self.parse_factor()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_factor(&mut self) -> Result<f64, ExpressionError> {
        let position = self.pos;
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Plus) => self.parse_factor(),
            Some(Token::Minus) => Ok(-self.parse_factor()?),
            Some(Token::LeftParen) => {
                let value = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RightParen) => Ok(value),
                    _ => Err(ExpressionError::UnclosedParenthesis),
                }
            }
            Some(_) => Err(ExpressionError::UnexpectedToken(position)),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }
}
