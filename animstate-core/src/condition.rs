//! Transition conditions.
//!
//! A condition is a predicate over one parameter. Conditions can be built
//! directly or parsed from a small textual syntax:
//!
//! - `Speed >= 10` - numeric comparison (`<`, `<=`, `==`, `>=`, `>`, `!=`)
//! - `IsMoving` - boolean parameter is true
//! - `!IsMoving` - boolean parameter is false
//! - `IsMoving == false` - boolean equality (`!=` negates)
//!
//! Parsing produces a [`ConditionExpr`] that is not yet tied to a kind;
//! [`ConditionExpr::resolve`] checks it against the declared parameter kind.

use crate::error::CoreError;
use crate::param::{ParamKind, ParamValue, Parameter, ParameterStore};

/// Comparison applied to a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareMode {
    Less,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    Greater,
    NotEqual,
}

impl CompareMode {
    /// Applies the comparison as `lhs <op> rhs`.
    ///
    /// Equality is exact; no epsilon is applied to floats.
    pub fn apply<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareMode::Less => lhs < rhs,
            CompareMode::LessOrEqual => lhs <= rhs,
            CompareMode::Equal => lhs == rhs,
            CompareMode::GreaterOrEqual => lhs >= rhs,
            CompareMode::Greater => lhs > rhs,
            CompareMode::NotEqual => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CompareMode::Less => "<",
            CompareMode::LessOrEqual => "<=",
            CompareMode::Equal => "==",
            CompareMode::GreaterOrEqual => ">=",
            CompareMode::Greater => ">",
            CompareMode::NotEqual => "!=",
        }
    }
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A predicate over a single named parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Scalar {
        param: String,
        mode: CompareMode,
        value: f32,
    },
    Integer {
        param: String,
        mode: CompareMode,
        value: i32,
    },
    Boolean {
        param: String,
        value: bool,
    },
}

impl Condition {
    pub fn scalar(param: impl Into<String>, mode: CompareMode, value: f32) -> Self {
        Condition::Scalar {
            param: param.into(),
            mode,
            value,
        }
    }

    pub fn integer(param: impl Into<String>, mode: CompareMode, value: i32) -> Self {
        Condition::Integer {
            param: param.into(),
            mode,
            value,
        }
    }

    pub fn boolean(param: impl Into<String>, value: bool) -> Self {
        Condition::Boolean {
            param: param.into(),
            value,
        }
    }

    /// Name of the parameter this condition reads.
    pub fn param(&self) -> &str {
        match self {
            Condition::Scalar { param, .. }
            | Condition::Integer { param, .. }
            | Condition::Boolean { param, .. } => param,
        }
    }

    /// Kind of parameter this condition expects.
    pub fn kind(&self) -> ParamKind {
        match self {
            Condition::Scalar { .. } => ParamKind::Scalar,
            Condition::Integer { .. } => ParamKind::Integer,
            Condition::Boolean { .. } => ParamKind::Boolean,
        }
    }

    /// Evaluates the condition against a parameter.
    ///
    /// Returns `KindMismatch` if the parameter is not of the expected kind.
    pub fn evaluate(&self, param: &Parameter) -> Result<bool, CoreError> {
        match (self, param.value()) {
            (Condition::Scalar { mode, value, .. }, ParamValue::Scalar(v)) => {
                Ok(mode.apply(v, *value))
            }
            (Condition::Integer { mode, value, .. }, ParamValue::Integer(v)) => {
                Ok(mode.apply(v, *value))
            }
            (Condition::Boolean { value, .. }, ParamValue::Boolean(v)) => Ok(v == *value),
            (_, actual) => Err(CoreError::KindMismatch {
                name: self.param().to_string(),
                expected: self.kind(),
                actual: actual.kind(),
            }),
        }
    }

    /// Looks up the referenced parameter in `store` and evaluates against it.
    pub fn evaluate_in(&self, store: &ParameterStore) -> Result<bool, CoreError> {
        let param = store.get(self.param())?;
        self.evaluate(param)
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Scalar { param, mode, value } => write!(f, "{} {} {}", param, mode, value),
            Condition::Integer { param, mode, value } => write!(f, "{} {} {}", param, mode, value),
            Condition::Boolean { param, value } => write!(f, "{} == {}", param, value),
        }
    }
}

/// Literal on the right-hand side of a parsed comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number { value: f64, integral: bool },
}

/// The test part of a parsed condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Test {
    /// Bare name (`true`) or negated name (`false`).
    Truthy(bool),
    Compare(CompareMode, Literal),
}

/// A parsed condition not yet checked against a parameter kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    pub param: String,
    pub test: Test,
}

impl ConditionExpr {
    /// Parses a condition from text.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::InvalidCondition {
                reason: "empty condition".to_string(),
            });
        }

        let mut parser = Parser::new(s);
        let expr = parser.parse_condition()?;
        parser.skip_whitespace();
        if !parser.at_end() {
            return Err(CoreError::InvalidCondition {
                reason: format!("unexpected trailing input: '{}'", parser.rest()),
            });
        }
        Ok(expr)
    }

    /// Resolves the expression into a [`Condition`] for a parameter of `kind`.
    pub fn resolve(&self, kind: ParamKind) -> Result<Condition, CoreError> {
        let param = self.param.clone();
        match (kind, self.test) {
            (ParamKind::Boolean, Test::Truthy(value)) => Ok(Condition::Boolean { param, value }),
            (ParamKind::Boolean, Test::Compare(CompareMode::Equal, Literal::Bool(b))) => {
                Ok(Condition::Boolean { param, value: b })
            }
            (ParamKind::Boolean, Test::Compare(CompareMode::NotEqual, Literal::Bool(b))) => {
                Ok(Condition::Boolean { param, value: !b })
            }
            (ParamKind::Scalar, Test::Compare(mode, Literal::Number { value, .. })) => {
                Ok(Condition::Scalar {
                    param,
                    mode,
                    value: value as f32,
                })
            }
            (
                ParamKind::Integer,
                Test::Compare(
                    mode,
                    Literal::Number {
                        value,
                        integral: true,
                    },
                ),
            ) => {
                if value < i32::MIN as f64 || value > i32::MAX as f64 {
                    return Err(CoreError::InvalidCondition {
                        reason: format!("'{}' is out of range for int parameter", value),
                    });
                }
                Ok(Condition::Integer {
                    param,
                    mode,
                    value: value as i32,
                })
            }
            (kind, test) => Err(CoreError::InvalidCondition {
                reason: format!(
                    "'{}' cannot be applied to {} parameter '{}'",
                    describe_test(test),
                    kind,
                    self.param
                ),
            }),
        }
    }
}

fn describe_test(test: Test) -> String {
    match test {
        Test::Truthy(true) => "truthy check".to_string(),
        Test::Truthy(false) => "negation".to_string(),
        Test::Compare(mode, Literal::Bool(b)) => format!("{} {}", mode, b),
        Test::Compare(mode, Literal::Number { value, .. }) => format!("{} {}", mode, value),
    }
}

/// Recursive descent parser for the condition syntax.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_condition(&mut self) -> Result<ConditionExpr, CoreError> {
        self.skip_whitespace();

        if self.peek_char() == Some('!') && !self.peek_str("!=") {
            self.pos += 1;
            self.skip_whitespace();
            let param = self.parse_name()?;
            return Ok(ConditionExpr {
                param,
                test: Test::Truthy(false),
            });
        }

        let param = self.parse_name()?;
        self.skip_whitespace();

        let mode = if self.peek_str("==") {
            self.pos += 2;
            CompareMode::Equal
        } else if self.peek_str("!=") {
            self.pos += 2;
            CompareMode::NotEqual
        } else if self.peek_str(">=") {
            self.pos += 2;
            CompareMode::GreaterOrEqual
        } else if self.peek_str("<=") {
            self.pos += 2;
            CompareMode::LessOrEqual
        } else if self.peek_char() == Some('>') {
            self.pos += 1;
            CompareMode::Greater
        } else if self.peek_char() == Some('<') {
            self.pos += 1;
            CompareMode::Less
        } else {
            // No operator, just truthy check
            return Ok(ConditionExpr {
                param,
                test: Test::Truthy(true),
            });
        };

        self.skip_whitespace();
        let literal = self.parse_literal()?;
        let compatible = match literal {
            Literal::Bool(_) => matches!(mode, CompareMode::Equal | CompareMode::NotEqual),
            Literal::Number { .. } => true,
        };
        if !compatible {
            return Err(CoreError::InvalidCondition {
                reason: format!("operator '{}' needs a numeric operand", mode),
            });
        }

        Ok(ConditionExpr {
            param,
            test: Test::Compare(mode, literal),
        })
    }

    fn parse_name(&mut self) -> Result<String, CoreError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }

        let name = &self.input[start..self.pos];
        if name.is_empty() {
            return Err(CoreError::InvalidCondition {
                reason: "expected parameter name".to_string(),
            });
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CoreError::InvalidCondition {
                reason: format!("parameter name cannot start with a digit: '{}'", name),
            });
        }

        Ok(name.to_string())
    }

    fn parse_literal(&mut self) -> Result<Literal, CoreError> {
        let rest = self.rest();

        if rest.starts_with("true") {
            self.pos += 4;
            return Ok(Literal::Bool(true));
        }
        if rest.starts_with("false") {
            self.pos += 5;
            return Ok(Literal::Bool(false));
        }

        self.parse_number()
    }

    fn parse_number(&mut self) -> Result<Literal, CoreError> {
        let start = self.pos;
        let mut integral = true;

        // Optional negative sign
        if self.peek_char() == Some('-') {
            self.pos += 1;
        }

        // Integer part
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }

        // Optional decimal part
        if self.peek_char() == Some('.') {
            integral = false;
            self.pos += 1;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        let num_str = &self.input[start..self.pos];
        let value = num_str
            .parse::<f64>()
            .map_err(|_| CoreError::InvalidCondition {
                reason: format!("invalid number: '{}'", num_str),
            })?;

        Ok(Literal::Number { value, integral })
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(s: &str, kind: ParamKind) -> Condition {
        ConditionExpr::parse(s).unwrap().resolve(kind).unwrap()
    }

    #[test]
    fn test_compare_modes() {
        assert!(CompareMode::Less.apply(1, 2));
        assert!(!CompareMode::Less.apply(2, 2));
        assert!(CompareMode::LessOrEqual.apply(2, 2));
        assert!(CompareMode::Equal.apply(2.5, 2.5));
        assert!(CompareMode::GreaterOrEqual.apply(3, 2));
        assert!(!CompareMode::Greater.apply(2, 2));
        assert!(CompareMode::NotEqual.apply(1.0, 2.0));
    }

    #[test]
    fn test_scalar_condition() {
        let cond = Condition::scalar("Speed", CompareMode::GreaterOrEqual, 10.0);
        assert!(!cond.evaluate(&Parameter::new("Speed", 5.0f32)).unwrap());
        assert!(cond.evaluate(&Parameter::new("Speed", 10.0f32)).unwrap());
        assert!(cond.evaluate(&Parameter::new("Speed", 12.0f32)).unwrap());
    }

    #[test]
    fn test_integer_condition() {
        let cond = Condition::integer("Jumps", CompareMode::NotEqual, 0);
        assert!(!cond.evaluate(&Parameter::new("Jumps", 0)).unwrap());
        assert!(cond.evaluate(&Parameter::new("Jumps", -1)).unwrap());
    }

    #[test]
    fn test_boolean_condition() {
        let cond = Condition::boolean("IsMoving", true);
        assert!(cond.evaluate(&Parameter::new("IsMoving", true)).unwrap());
        assert!(!cond.evaluate(&Parameter::new("IsMoving", false)).unwrap());
    }

    #[test]
    fn test_exact_float_equality() {
        let cond = Condition::scalar("Blend", CompareMode::Equal, 0.3);
        assert!(cond.evaluate(&Parameter::new("Blend", 0.3f32)).unwrap());
        assert!(!cond
            .evaluate(&Parameter::new("Blend", 0.3f32 + f32::EPSILON))
            .unwrap());
    }

    #[test]
    fn test_kind_mismatch() {
        let cond = Condition::scalar("Speed", CompareMode::Greater, 1.0);
        let result = cond.evaluate(&Parameter::new("Speed", 3));
        assert!(matches!(
            result,
            Err(CoreError::KindMismatch {
                expected: ParamKind::Scalar,
                actual: ParamKind::Integer,
                ..
            })
        ));

        let cond = Condition::boolean("Speed", true);
        assert!(cond.evaluate(&Parameter::new("Speed", 1.0f32)).is_err());
    }

    #[test]
    fn test_evaluate_in_missing_param() {
        let store = ParameterStore::new();
        let cond = Condition::boolean("IsMoving", true);
        assert!(matches!(
            cond.evaluate_in(&store),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(
            resolve("Speed >= 10", ParamKind::Scalar),
            Condition::scalar("Speed", CompareMode::GreaterOrEqual, 10.0)
        );
        assert_eq!(
            resolve("Height<0.5", ParamKind::Scalar),
            Condition::scalar("Height", CompareMode::Less, 0.5)
        );
        assert_eq!(
            resolve("Jumps == 2", ParamKind::Integer),
            Condition::integer("Jumps", CompareMode::Equal, 2)
        );
        assert_eq!(
            resolve("Temp > -10", ParamKind::Integer),
            Condition::integer("Temp", CompareMode::Greater, -10)
        );
        assert_eq!(
            resolve("Blend != 1", ParamKind::Scalar),
            Condition::scalar("Blend", CompareMode::NotEqual, 1.0)
        );
        assert_eq!(
            resolve("Combo <= 3", ParamKind::Integer),
            Condition::integer("Combo", CompareMode::LessOrEqual, 3)
        );
    }

    #[test]
    fn test_parse_boolean() {
        assert_eq!(
            resolve("IsMoving", ParamKind::Boolean),
            Condition::boolean("IsMoving", true)
        );
        assert_eq!(
            resolve("!IsMoving", ParamKind::Boolean),
            Condition::boolean("IsMoving", false)
        );
        assert_eq!(
            resolve("IsMoving == false", ParamKind::Boolean),
            Condition::boolean("IsMoving", false)
        );
        assert_eq!(
            resolve("IsMoving != false", ParamKind::Boolean),
            Condition::boolean("IsMoving", true)
        );
    }

    #[test]
    fn test_resolve_rejects_wrong_kind() {
        let expr = ConditionExpr::parse("Jumps > 1.5").unwrap();
        assert!(matches!(
            expr.resolve(ParamKind::Integer),
            Err(CoreError::InvalidCondition { .. })
        ));

        let expr = ConditionExpr::parse("Speed").unwrap();
        assert!(expr.resolve(ParamKind::Scalar).is_err());

        let expr = ConditionExpr::parse("IsMoving == 1").unwrap();
        assert!(expr.resolve(ParamKind::Boolean).is_err());

        let expr = ConditionExpr::parse("Speed == true").unwrap();
        assert!(expr.resolve(ParamKind::Scalar).is_err());
    }

    #[test]
    fn test_resolve_out_of_range() {
        let expr = ConditionExpr::parse("Jumps > 99999999999").unwrap();
        assert!(expr.resolve(ParamKind::Integer).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(ConditionExpr::parse("").is_err());
        assert!(ConditionExpr::parse("   ").is_err());
        assert!(ConditionExpr::parse(">= 10").is_err());
        assert!(ConditionExpr::parse("Speed >=").is_err());
        assert!(ConditionExpr::parse("Speed > abc").is_err());
        assert!(ConditionExpr::parse("Speed > 1 extra").is_err());
        assert!(ConditionExpr::parse("IsMoving > true").is_err());
        assert!(ConditionExpr::parse("9lives").is_err());
    }

    #[test]
    fn test_display() {
        let cond = Condition::scalar("Speed", CompareMode::GreaterOrEqual, 10.0);
        assert_eq!(cond.to_string(), "Speed >= 10");
        let cond = Condition::boolean("IsMoving", false);
        assert_eq!(cond.to_string(), "IsMoving == false");
    }
}
