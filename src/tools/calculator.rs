//! Arithmetic tool.
//!
//! Evaluates plain arithmetic expressions with a small recursive-descent
//! parser. Only numbers, `+ - * / // % **`, parentheses, and unary sign are
//! accepted; anything else is rejected rather than evaluated.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{MnemoError, Result};
use crate::tool::Tool;

pub struct CalculateTool;

#[async_trait]
impl Tool for CalculateTool {
    fn name(&self) -> &str {
        "calculate"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression and return the result. Expects {\"expression\": string}, e.g. {\"expression\": \"(234*12)+98\"}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression using numbers and + - * / // % ** ( )"
                }
            },
            "required": ["expression"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let expression = input
            .get("expression")
            .and_then(Value::as_str)
            .ok_or_else(|| MnemoError::Agent("missing `expression` for calculate".into()))?;

        match evaluate(expression) {
            Ok(result) => Ok(json!({
                "expression": expression,
                "result": format_number(result),
            })),
            Err(message) => Ok(json!({ "error": message })),
        }
    }
}

/// Evaluate an arithmetic expression. Errors are plain strings because they
/// are fed back to the model in-band rather than escalated.
pub fn evaluate(expression: &str) -> std::result::Result<f64, String> {
    let normalized = expression.trim().replace('×', "*").replace('÷', "/");
    if normalized.is_empty() {
        return Err("expression is empty".into());
    }

    let tokens = tokenize(&normalized)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!(
            "unexpected trailing input near `{:?}`",
            parser.tokens[parser.pos]
        ));
    }
    Ok(value)
}

/// Integral results print without a fractional part.
pub fn format_number(value: f64) -> String {
    const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0; // 2^53
    if value.is_finite()
        && (value - value.round()).abs() < 1e-12
        && value.abs() < MAX_EXACT_INT
    {
        format!("{}", value.round() as i64)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
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
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::DoubleStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::DoubleSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            '%' => {
                tokens.push(Token::Percent);
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
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value: f64 = literal
                    .parse()
                    .map_err(|_| format!("invalid number `{literal}`"))?;
                tokens.push(Token::Number(value));
            }
            other => {
                return Err(format!(
                    "unsupported character `{other}`; use only numbers and + - * / // % ** ( )"
                ));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
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

    // expr := term (('+'|'-') term)*
    fn expr(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.advance();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.advance();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := factor (('*'|'/'|'//'|'%') factor)*
    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.advance();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.advance();
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".into());
                    }
                    value /= rhs;
                }
                Token::DoubleSlash => {
                    self.advance();
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".into());
                    }
                    value = (value / rhs).floor();
                }
                Token::Percent => {
                    self.advance();
                    let rhs = self.factor()?;
                    if rhs == 0.0 {
                        return Err("modulo by zero".into());
                    }
                    // Result takes the sign of the divisor.
                    value -= rhs * (value / rhs).floor();
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // factor := ('+'|'-') factor | power
    fn factor(&mut self) -> std::result::Result<f64, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.factor()
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.factor()?)
            }
            _ => self.power(),
        }
    }

    // power := atom ('**' factor)?   (right-associative, exponent may be signed)
    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.atom()?;
        if self.peek() == Some(Token::DoubleStar) {
            self.advance();
            let exponent = self.factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> std::result::Result<f64, String> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("missing closing parenthesis".into()),
                }
            }
            Some(other) => Err(format!("unexpected token `{other:?}`")),
            None => Err("expression ended unexpectedly".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn evaluates_with_precedence() {
        let result = CalculateTool.call(json!({"expression": "2+2*3"})).await.unwrap();
        assert_eq!(result["result"], "8");
    }

    #[tokio::test]
    async fn rejects_non_arithmetic_input() {
        let result = CalculateTool
            .call(json!({"expression": "import os"}))
            .await
            .unwrap();
        assert!(result["error"].as_str().unwrap().contains("unsupported character"));
    }

    #[test]
    fn parenthesized_expression() {
        assert_eq!(evaluate("(234*12)+98").unwrap(), 2906.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2**3**2").unwrap(), 512.0);
    }

    #[test]
    fn unary_binds_looser_than_power() {
        assert_eq!(evaluate("-2**2").unwrap(), -4.0);
        assert_eq!(evaluate("2**-1").unwrap(), 0.5);
    }

    #[test]
    fn floor_division_and_modulo() {
        assert_eq!(evaluate("7//2").unwrap(), 3.0);
        assert_eq!(evaluate("-7//2").unwrap(), -4.0);
        assert_eq!(evaluate("-7%3").unwrap(), 2.0);
        assert_eq!(evaluate("7%-3").unwrap(), -2.0);
    }

    #[test]
    fn unicode_operators_are_normalized() {
        assert_eq!(evaluate("6×7").unwrap(), 42.0);
        assert_eq!(evaluate("84÷2").unwrap(), 42.0);
    }

    #[test]
    fn division_by_zero_is_rejected() {
        assert!(evaluate("1/0").unwrap_err().contains("division by zero"));
        assert!(evaluate("1//0").unwrap_err().contains("division by zero"));
        assert!(evaluate("1%0").unwrap_err().contains("modulo by zero"));
    }

    #[test]
    fn empty_expression_is_rejected() {
        assert!(evaluate("   ").unwrap_err().contains("empty"));
    }

    #[test]
    fn integral_results_have_no_fraction() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(10.0 / 4.0), "2.5");
    }
}
