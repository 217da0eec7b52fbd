//! `calculator` tool — arithmetic and temperature conversion.
//!
//! Expressions are evaluated by a small recursive-descent parser; nothing is
//! ever handed to a shell or an `eval`.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | '(' expr ')'
//! ```
//!
//! `×`, `÷` and the spoken operators `加`, `减`, `乘以`, `除以` are accepted.
//!
//! Input is capped at [`MAX_EXPRESSION_CHARS`] characters and
//! [`MAX_NESTING`] levels of parentheses, signs and exponents, so no input can
//! exhaust the stack.

use addy_domain::{Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

/// Canonical tool name.
pub const CALCULATOR: &str = "calculator";

/// Longest accepted expression, after whitespace is dropped.
pub const MAX_EXPRESSION_CHARS: usize = 1024;

/// Deepest accepted nesting of `(`, unary signs and `^`.
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression is longer than {MAX_EXPRESSION_CHARS} characters")]
    TooLong,

    #[error("expression is nested deeper than {MAX_NESTING} levels")]
    TooDeep,
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, EvalError> {
    let source = spoken_operators(expression);
    let chars: Vec<char> = source.chars().filter(|c| !c.is_whitespace()).collect();
    if chars.len() > MAX_EXPRESSION_CHARS {
        return Err(EvalError::TooLong);
    }
    let mut parser = ExprParser {
        chars,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(&c) = parser.chars.get(parser.pos) {
        return Err(EvalError::UnexpectedChar(c));
    }
    if !value.is_finite() {
        return Err(EvalError::NotFinite);
    }
    Ok(value)
}

fn spoken_operators(s: &str) -> String {
    s.replace("乘以", "*")
        .replace("除以", "/")
        .replace('加', "+")
        .replace('减', "-")
        .replace('乘', "*")
        .replace('×', "*")
        .replace('÷', "/")
        .replace('（', "(")
        .replace('）', ")")
}

struct ExprParser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value /= rhs;
            } else if self.eat('%') {
                let rhs = self.unary()?;
                if rhs == 0.0 {
                    return Err(EvalError::DivisionByZero);
                }
                value %= rhs;
            } else {
                return Ok(value);
            }
        }
    }

    /// Every recursive cycle of the grammar passes through here.
    fn unary(&mut self) -> Result<f64, EvalError> {
        if self.depth >= MAX_NESTING {
            return Err(EvalError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, EvalError> {
        if self.eat('-') {
            Ok(-self.unary()?)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> Result<f64, EvalError> {
        let base = self.primary()?;
        if self.eat('^') {
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            None => Err(EvalError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    match self.peek() {
                        Some(c) => Err(EvalError::UnexpectedChar(c)),
                        None => Err(EvalError::UnexpectedEnd),
                    }
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(EvalError::UnexpectedChar(c)),
        }
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map_err(|_| EvalError::UnexpectedChar(self.chars[start]))
    }
}

/// Render a number without float noise: integers plainly, others with at
/// most six decimals.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let s = format!("{:.6}", value);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "c" | "℃" | "摄氏度" | "celsius" => Some(Self::Celsius),
            "f" | "℉" | "华氏度" | "fahrenheit" => Some(Self::Fahrenheit),
            "k" | "开尔文" | "kelvin" => Some(Self::Kelvin),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
            Self::Kelvin => "K",
        }
    }

    fn to_celsius(self, value: f64) -> f64 {
        match self {
            Self::Celsius => value,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Self::Kelvin => value - 273.15,
        }
    }

    fn from_celsius(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            Self::Kelvin => celsius + 273.15,
        }
    }
}

pub fn convert_temperature(value: f64, from: TemperatureUnit, to: TemperatureUnit) -> f64 {
    to.from_celsius(from.to_celsius(value))
}

pub struct CalculatorTool {
    descriptor: ToolDescriptor,
}

impl CalculatorTool {
    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::new(CALCULATOR, "计算器: 四则运算、乘方、取余、温度转换")
                .with_intents([Intent::Calculate, Intent::ConvertTemperature]),
        }
    }

    fn calculate(&self, expression: &str) -> ExecutionResult {
        match evaluate(expression) {
            Ok(value) => {
                let shown = format_number(value);
                ExecutionResult::success(format!("计算结果: {} = {}", expression.trim(), shown))
                    .with_data(json!({ "expression": expression.trim(), "result": value }))
            }
            Err(EvalError::DivisionByZero) => ExecutionResult::rejected("计算表达式错误: 除数不能为零"),
            Err(e) => {
                tracing::debug!(expression, error = %e, "Expression rejected");
                ExecutionResult::rejected(format!("计算表达式错误: {}", e))
            }
        }
    }

    fn temperature(&self, entities: &Entities) -> ExecutionResult {
        let missing = entities.missing(&["value", "from_unit", "to_unit"]);
        if !missing.is_empty() {
            return ExecutionResult::missing_parameters(&missing);
        }
        let Some(value) = entities.number("value") else {
            return ExecutionResult::rejected("温度值必须是数字");
        };
        let from_raw = entities.text("from_unit").unwrap_or_default();
        let to_raw = entities.text("to_unit").unwrap_or_default();
        let (Some(from), Some(to)) = (
            TemperatureUnit::parse(&from_raw),
            TemperatureUnit::parse(&to_raw),
        ) else {
            return ExecutionResult::rejected(format!(
                "不支持的温度单位: {} -> {}",
                from_raw, to_raw
            ));
        };

        let result = convert_temperature(value, from, to);
        ExecutionResult::success(format!(
            "温度转换: {}{} = {:.2}{}",
            format_number(value),
            from.symbol(),
            result,
            to.symbol()
        ))
        .with_data(json!({ "value": value, "result": result, "unit": to.symbol() }))
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        Ok(match intent {
            Intent::Calculate => match entities.text("expression") {
                Some(expression) => self.calculate(&expression),
                None => ExecutionResult::missing_parameters(&["expression"]),
            },
            Intent::ConvertTemperature => self.temperature(entities),
            other => ExecutionResult::rejected(format!("不支持的计算操作: {}", other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use addy_domain::EntityValue;

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(evaluate("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(evaluate("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(evaluate("7 % 4").unwrap(), 3.0);
    }

    #[test]
    fn test_alternative_operators() {
        assert_eq!(evaluate("6 × 7").unwrap(), 42.0);
        assert_eq!(evaluate("9 ÷ 3").unwrap(), 3.0);
        assert_eq!(evaluate("3加4乘以2").unwrap(), 11.0);
        assert_eq!(evaluate("（1+1）×2").unwrap(), 4.0);
    }

    #[test]
    fn test_errors() {
        assert_eq!(evaluate("1 / 0"), Err(EvalError::DivisionByZero));
        assert_eq!(evaluate("1 +"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("(1 + 2"), Err(EvalError::UnexpectedEnd));
        assert_eq!(evaluate("2 $ 3"), Err(EvalError::UnexpectedChar('$')));
        assert!(evaluate("1..2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert_eq!(evaluate(&parens), Err(EvalError::TooDeep));
        assert_eq!(evaluate(&format!("{}1", "-".repeat(1000))), Err(EvalError::TooDeep));
        assert_eq!(evaluate(&format!("2{}", "^2".repeat(200))), Err(EvalError::TooDeep));

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
        assert_eq!(evaluate("--1").unwrap(), 1.0);
    }

    #[test]
    fn test_long_input_is_rejected() {
        assert_eq!(
            evaluate(&format!("{}1", "(".repeat(100_000))),
            Err(EvalError::TooLong)
        );
        assert_eq!(
            evaluate(&format!("{}1", "-".repeat(100_000))),
            Err(EvalError::TooLong)
        );
        assert!(evaluate(&"1+".repeat(400)).is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn test_temperature_conversion() {
        let f = convert_temperature(100.0, TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit);
        assert!((f - 212.0).abs() < 1e-9);
        let k = convert_temperature(0.0, TemperatureUnit::Celsius, TemperatureUnit::Kelvin);
        assert!((k - 273.15).abs() < 1e-9);
        assert_eq!(TemperatureUnit::parse("℉"), Some(TemperatureUnit::Fahrenheit));
        assert_eq!(TemperatureUnit::parse("rankine"), None);
    }

    #[tokio::test]
    async fn test_calculate_intent() {
        let entities = Entities::new().with("expression", EntityValue::Text("2+3*4".into()));
        let result = CalculatorTool::new()
            .execute(Intent::Calculate, &entities, "")
            .await
            .unwrap();
        assert_eq!(result.message, "计算结果: 2+3*4 = 14");

        let bad = Entities::new().with("expression", EntityValue::Text("1/0".into()));
        let result = CalculatorTool::new()
            .execute(Intent::Calculate, &bad, "")
            .await
            .unwrap();
        assert!(result.is_failure());
    }

    #[tokio::test]
    async fn test_convert_temperature_intent() {
        let entities = Entities::new()
            .with("value", EntityValue::Number(100.0))
            .with("from_unit", EntityValue::Text("摄氏度".into()))
            .with("to_unit", EntityValue::Text("华氏度".into()));
        let result = CalculatorTool::new()
            .execute(Intent::ConvertTemperature, &entities, "")
            .await
            .unwrap();
        assert_eq!(result.message, "温度转换: 100°C = 212.00°F");
    }
}
