//! SQL-like filter expressions over tool calls.
//!
//! ```text
//! status = 'error' AND tool IN ('Bash', 'Edit')
//! NOT (tool LIKE 'mcp__%') OR error REGEXP 'denied|not found'
//! ```
//!
//! Keywords are upper case. `NOT` binds tighter than `AND`, which binds
//! tighter than `OR`; parentheses group. Values are single-quoted strings or
//! numbers. A condition on a field the record does not have is false.

use std::cmp::Ordering;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::model::ToolCall;

/// One token at the start of the remaining input.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?P<str>'[^']*')|(?P<num>-?\d+(?:\.\d+)?)|(?P<op>!=|>=|<=|=|>|<)|(?P<punct>[(),])|(?P<word>[A-Za-z_][A-Za-z0-9_]*))",
    )
    .expect("token pattern is valid")
});

/// Failure to parse or evaluate a filter expression.
#[derive(Error, Debug)]
pub enum ExpressionError {
    /// Nothing but whitespace.
    #[error("empty expression")]
    Empty,

    /// A character no token starts with.
    #[error("unexpected character '{ch}' at position {position}")]
    UnexpectedChar {
        /// The character.
        ch: char,
        /// Byte offset in the trimmed expression.
        position: usize,
    },

    /// A string literal without its closing quote.
    #[error("unclosed quote at position {position}")]
    UnclosedQuote {
        /// Byte offset of the opening quote.
        position: usize,
    },

    /// A condition did not start with a field name.
    #[error("expected field name at position {position}")]
    ExpectedField {
        /// Byte offset of the offending token.
        position: usize,
    },

    /// A field name was not followed by an operator.
    #[error("expected operator at position {position}")]
    ExpectedOperator {
        /// Byte offset of the offending token.
        position: usize,
    },

    /// A string or number was required.
    #[error("expected value at position {position}")]
    ExpectedValue {
        /// Byte offset of the offending token.
        position: usize,
    },

    /// `IN` not followed by a parenthesized list.
    #[error("expected '(' at position {position}")]
    ExpectedParen {
        /// Byte offset of the offending token.
        position: usize,
    },

    /// The expression stopped in the middle of a condition.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// A group opened with `(` was never closed.
    #[error("missing closing parenthesis")]
    MissingParen,

    /// `BETWEEN low` not followed by `AND high`.
    #[error("BETWEEN requires AND")]
    BetweenWithoutAnd,

    /// Items of an `IN` list must be separated by commas.
    #[error("expected ',' or ')' in value list")]
    BadValueList,

    /// `LIKE` and `REGEXP` take a quoted pattern.
    #[error("{operator} pattern must be a string")]
    PatternNotString {
        /// `LIKE` or `REGEXP`.
        operator: &'static str,
    },

    /// A `REGEXP` pattern failed to compile.
    #[error("invalid regex pattern '{pattern}'")]
    InvalidRegex {
        /// The pattern as written.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },

    /// Tokens left over after a complete expression.
    #[error("unexpected input at position {position}")]
    TrailingInput {
        /// Byte offset of the first leftover token.
        position: usize,
    },

    /// A field value that is neither equal-typed nor numeric on both sides.
    #[error("unsupported comparison: {field} {operator} {value}")]
    Incomparable {
        /// Field name.
        field: String,
        /// Comparison operator.
        operator: &'static str,
        /// Right-hand side as written.
        value: String,
    },
}

/// Constant on the right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Single-quoted string.
    Str(String),
    /// Integer or decimal number.
    Num(f64),
}

impl Literal {
    fn as_field(&self) -> FieldValue<'_> {
        match self {
            Self::Str(s) => FieldValue::Str(s),
            Self::Num(n) => FieldValue::Num(*n),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Num(n) => write!(f, "{n}"),
        }
    }
}

/// Value of a record field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Text.
    Str(&'a str),
    /// Number.
    Num(f64),
}

impl FieldValue<'_> {
    fn as_f64(self) -> Option<f64> {
        match self {
            Self::Str(s) => s.parse().ok(),
            Self::Num(n) => Some(n),
        }
    }
}

/// Two strings compare as text; anything else compares numerically, with
/// strings parsed as numbers.
fn compare(left: FieldValue<'_>, right: FieldValue<'_>) -> Option<Ordering> {
    match (left, right) {
        (FieldValue::Str(a), FieldValue::Str(b)) => Some(a.cmp(b)),
        _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
    }
}

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            _ => return None,
        })
    }

    /// Operator as written.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Ge => ordering != Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }

    fn holds_opt(self, ordering: Option<Ordering>) -> bool {
        ordering.is_some_and(|o| self.holds(o))
    }
}

/// A record an expression can be evaluated against.
pub trait Record {
    /// Value of `name`, or `None` when the record has no such field.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// Tool calls expose `tool` (alias `tool_name`), `status`, `uuid`, `error`,
/// `output` and `timestamp`.
impl Record for ToolCall {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "tool" | "tool_name" => &self.tool_name,
            "status" => &self.status,
            "uuid" => &self.uuid,
            "error" => &self.error,
            "output" => &self.output,
            "timestamp" => &self.timestamp,
            _ => return None,
        };
        Some(FieldValue::Str(value))
    }
}

/// Parsed filter expression.
#[derive(Debug, Clone)]
pub enum Expression {
    /// `field <op> value`
    Compare {
        /// Field name.
        field: String,
        /// Operator.
        op: CompareOp,
        /// Right-hand side.
        value: Literal,
    },
    /// Both sides hold.
    And(Box<Expression>, Box<Expression>),
    /// Either side holds.
    Or(Box<Expression>, Box<Expression>),
    /// The operand does not hold.
    Not(Box<Expression>),
    /// `field [NOT] IN (v1, v2, ...)`
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<Literal>,
        /// `NOT IN`.
        negate: bool,
    },
    /// `field BETWEEN lower AND upper`, bounds inclusive.
    Between {
        /// Field name.
        field: String,
        /// Lowest accepted value.
        lower: Literal,
        /// Highest accepted value.
        upper: Literal,
    },
    /// `field LIKE 'pattern'`: `%` is any run of characters, `_` any one.
    Like {
        /// Field name.
        field: String,
        /// Pattern as written.
        pattern: String,
        /// Anchored translation of the pattern.
        regex: Regex,
    },
    /// `field REGEXP 'pattern'`, unanchored.
    Regexp {
        /// Field name.
        field: String,
        /// Compiled pattern.
        regex: Regex,
    },
}

impl Expression {
    /// Whether `record` satisfies the expression.
    ///
    /// Fails only when a comparison has a non-numeric side and the other side
    /// is not a string.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool, ExpressionError> {
        Ok(match self {
            Self::Compare { field, op, value } => match record.field(field) {
                None => false,
                Some(actual) => match compare(actual, value.as_field()) {
                    Some(ordering) => op.holds(ordering),
                    None => {
                        return Err(ExpressionError::Incomparable {
                            field: field.clone(),
                            operator: op.symbol(),
                            value: value.to_string(),
                        })
                    }
                },
            },
            Self::And(left, right) => left.evaluate(record)? && right.evaluate(record)?,
            Self::Or(left, right) => left.evaluate(record)? || right.evaluate(record)?,
            Self::Not(inner) => !inner.evaluate(record)?,
            Self::In { field, values, negate } => match record.field(field) {
                None => false,
                Some(actual) => {
                    let found = values
                        .iter()
                        .any(|v| compare(actual, v.as_field()) == Some(Ordering::Equal));
                    found != *negate
                }
            },
            Self::Between { field, lower, upper } => record.field(field).is_some_and(|actual| {
                CompareOp::Ge.holds_opt(compare(actual, lower.as_field()))
                    && CompareOp::Le.holds_opt(compare(actual, upper.as_field()))
            }),
            Self::Like { field, regex, .. } | Self::Regexp { field, regex } => match record.field(field) {
                Some(FieldValue::Str(text)) => regex.is_match(text),
                _ => false,
            },
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { field, op, value } => write!(f, "{field} {} {value}", op.symbol()),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::In { field, values, negate } => {
                let values: Vec<String> = values.iter().map(ToString::to_string).collect();
                let not = if *negate { "NOT " } else { "" };
                write!(f, "{field} {not}IN ({})", values.join(", "))
            }
            Self::Between { field, lower, upper } => write!(f, "{field} BETWEEN {lower} AND {upper}"),
            Self::Like { field, pattern, .. } => write!(f, "{field} LIKE '{pattern}'"),
            Self::Regexp { field, regex } => write!(f, "{field} REGEXP '{}'", regex.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    And,
    Or,
    Not,
    In,
    Between,
    Like,
    Regexp,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "AND" => Self::And,
            "OR" => Self::Or,
            "NOT" => Self::Not,
            "IN" => Self::In,
            "BETWEEN" => Self::Between,
            "LIKE" => Self::Like,
            "REGEXP" => Self::Regexp,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Word(String),
    Keyword(Keyword),
    Str(String),
    Num(f64),
    Op(CompareOp),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut position = 0;

    loop {
        let rest = &input[position..];
        let trimmed = rest.trim_start();
        position += rest.len() - trimmed.len();
        let Some(first) = trimmed.chars().next() else {
            return Ok(tokens);
        };

        let Some(caps) = TOKEN.captures(trimmed) else {
            return Err(if first == '\'' {
                ExpressionError::UnclosedQuote { position }
            } else {
                ExpressionError::UnexpectedChar { ch: first, position }
            });
        };

        let kind = if let Some(m) = caps.name("str") {
            let quoted = m.as_str();
            TokenKind::Str(quoted[1..quoted.len() - 1].to_string())
        } else if let Some(m) = caps.name("num") {
            let n = m.as_str().parse().map_err(|_| ExpressionError::ExpectedValue { position })?;
            TokenKind::Num(n)
        } else if let Some(op) = caps.name("op").and_then(|m| CompareOp::from_symbol(m.as_str())) {
            TokenKind::Op(op)
        } else if let Some(m) = caps.name("word") {
            let word = m.as_str();
            Keyword::from_word(word).map_or_else(|| TokenKind::Word(word.to_string()), TokenKind::Keyword)
        } else {
            match first {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                _ => TokenKind::Comma,
            }
        };

        tokens.push(Token { kind, position });
        position += caps[0].len();
    }
}

/// Recursive descent over the token list: or > and > not > condition.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.position)
    }

    fn next(&mut self) -> Option<TokenKind> {
        let kind = self.tokens.get(self.pos)?.kind.clone();
        self.pos += 1;
        Some(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(keyword))
    }

    fn parse_or(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = Expression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ExpressionError> {
        let mut left = self.parse_unary()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_unary()?;
            left = Expression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ExpressionError> {
        if self.eat_keyword(Keyword::Not) {
            return Ok(Expression::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, ExpressionError> {
        if self.eat(&TokenKind::LParen) {
            let inner = self.parse_or()?;
            if !self.eat(&TokenKind::RParen) {
                return Err(ExpressionError::MissingParen);
            }
            return Ok(inner);
        }

        let position = self.position();
        let Some(TokenKind::Word(field)) = self.next() else {
            return Err(ExpressionError::ExpectedField { position });
        };

        let position = self.position();
        match self.next() {
            Some(TokenKind::Op(op)) => Ok(Expression::Compare {
                field,
                op,
                value: self.parse_value()?,
            }),
            Some(TokenKind::Keyword(Keyword::In)) => Ok(Expression::In {
                field,
                values: self.parse_value_list()?,
                negate: false,
            }),
            Some(TokenKind::Keyword(Keyword::Not)) if self.eat_keyword(Keyword::In) => Ok(Expression::In {
                field,
                values: self.parse_value_list()?,
                negate: true,
            }),
            Some(TokenKind::Keyword(Keyword::Between)) => {
                let lower = self.parse_value()?;
                if !self.eat_keyword(Keyword::And) {
                    return Err(ExpressionError::BetweenWithoutAnd);
                }
                let upper = self.parse_value()?;
                Ok(Expression::Between { field, lower, upper })
            }
            Some(TokenKind::Keyword(Keyword::Like)) => {
                let pattern = self.parse_pattern("LIKE")?;
                let regex = like_regex(&pattern)?;
                Ok(Expression::Like { field, pattern, regex })
            }
            Some(TokenKind::Keyword(Keyword::Regexp)) => {
                let pattern = self.parse_pattern("REGEXP")?;
                let regex = Regex::new(&pattern).map_err(|source| ExpressionError::InvalidRegex { pattern, source })?;
                Ok(Expression::Regexp { field, regex })
            }
            _ => Err(ExpressionError::ExpectedOperator { position }),
        }
    }

    fn parse_value(&mut self) -> Result<Literal, ExpressionError> {
        let position = self.position();
        match self.next() {
            Some(TokenKind::Str(s)) => Ok(Literal::Str(s)),
            Some(TokenKind::Num(n)) => Ok(Literal::Num(n)),
            Some(_) => Err(ExpressionError::ExpectedValue { position }),
            None => Err(ExpressionError::UnexpectedEnd),
        }
    }

    fn parse_pattern(&mut self, operator: &'static str) -> Result<String, ExpressionError> {
        match self.parse_value()? {
            Literal::Str(pattern) => Ok(pattern),
            Literal::Num(_) => Err(ExpressionError::PatternNotString { operator }),
        }
    }

    fn parse_value_list(&mut self) -> Result<Vec<Literal>, ExpressionError> {
        let position = self.position();
        if !self.eat(&TokenKind::LParen) {
            return Err(ExpressionError::ExpectedParen { position });
        }

        let mut values = Vec::new();
        loop {
            values.push(self.parse_value()?);
            match self.next() {
                Some(TokenKind::Comma) => {}
                Some(TokenKind::RParen) => return Ok(values),
                _ => return Err(ExpressionError::BadValueList),
            }
        }
    }
}

/// Anchored regex for a LIKE pattern. `%` also spans newlines.
fn like_regex(pattern: &str) -> Result<Regex, ExpressionError> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push_str("(?s)^");
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            _ => re.push_str(&regex::escape(ch.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');
    Regex::new(&re).map_err(|source| ExpressionError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Parse a filter expression.
#[instrument]
pub fn parse_expression(input: &str) -> Result<Expression, ExpressionError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(input)?,
        pos: 0,
        end: input.len(),
    };
    let expression = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(ExpressionError::TrailingInput {
            position: parser.position(),
        });
    }

    debug!(%expression, "Parsed filter expression");
    Ok(expression)
}

/// Records satisfying `expression`, in input order.
#[instrument(skip_all, fields(records = records.len(), expression = %expression))]
pub fn filter_records<R: Record>(records: Vec<R>, expression: &Expression) -> Result<Vec<R>, ExpressionError> {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if expression.evaluate(&record)? {
            kept.push(record);
        }
    }
    debug!(kept = kept.len(), "Applied filter expression");
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct Row(Vec<(&'static str, FieldValue<'static>)>);

    impl Record for Row {
        fn field(&self, name: &str) -> Option<FieldValue<'_>> {
            self.0.iter().find(|(key, _)| *key == name).map(|(_, value)| *value)
        }
    }

    fn row() -> Row {
        Row(vec![
            ("tool", FieldValue::Str("Bash")),
            ("status", FieldValue::Str("error")),
            ("duration", FieldValue::Num(150.0)),
            ("count", FieldValue::Str("12")),
            ("path", FieldValue::Str("src/a.b(c).rs")),
        ])
    }

    fn eval(input: &str) -> bool {
        parse_expression(input).unwrap().evaluate(&row()).unwrap()
    }

    #[rstest]
    #[case("tool = 'Bash'", true)]
    #[case("tool != 'Bash'", false)]
    #[case("tool < 'Edit'", true)]
    #[case("duration > 100", true)]
    #[case("duration <= 100", false)]
    #[case("duration = 150.0", true)]
    #[case("count >= 10", true)]
    #[case("missing = 'x'", false)]
    #[case("tool IN ('Edit', 'Bash')", true)]
    #[case("tool NOT IN ('Edit', 'Bash')", false)]
    #[case("missing NOT IN ('x')", false)]
    #[case("duration BETWEEN 100 AND 150", true)]
    #[case("duration BETWEEN 151 AND 200", false)]
    #[case("tool LIKE 'B_s%'", true)]
    #[case("tool LIKE 'b%'", false)]
    #[case("duration LIKE '1%'", false)]
    #[case("path LIKE 'src/a.b(%'", true)]
    #[case("path LIKE 'src/a_b%'", true)]
    #[case("path LIKE 'src/a.b'", false)]
    #[case("status REGEXP '^err'", true)]
    #[case("NOT (tool = 'Edit' OR status = 'ok')", true)]
    #[case("tool = 'Edit' OR status = 'error' AND duration > 100", true)]
    fn test_evaluate(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(eval(input), expected, "{input}");
    }

    #[test]
    fn test_precedence() {
        let parsed = parse_expression("a = 1 OR b = 2 AND NOT c = 'x'").unwrap();
        assert_eq!(parsed.to_string(), "(a = 1 OR (b = 2 AND NOT c = 'x'))");

        let grouped = parse_expression("(a = 1 OR b = 2) AND c NOT IN (1, 'y')").unwrap();
        assert_eq!(grouped.to_string(), "((a = 1 OR b = 2) AND c NOT IN (1, 'y'))");
    }

    #[test]
    fn test_keywords_are_upper_case_words() {
        let parsed = parse_expression("ANDROID = 1").unwrap();
        assert!(matches!(parsed, Expression::Compare { ref field, .. } if field == "ANDROID"));

        let err = parse_expression("a = 1 and b = 2").unwrap_err();
        assert!(matches!(err, ExpressionError::TrailingInput { position: 6 }));
    }

    #[rstest]
    #[case("", "empty expression")]
    #[case("   ", "empty expression")]
    #[case("(tool = 'Bash'", "missing closing parenthesis")]
    #[case("= 'Bash'", "expected field name at position 0")]
    #[case("tool 'Bash'", "expected operator at position 5")]
    #[case("tool = 'Bash", "unclosed quote at position 7")]
    #[case("tool =", "unexpected end of input")]
    #[case("tool = Bash", "expected value at position 7")]
    #[case("duration BETWEEN 1 5", "BETWEEN requires AND")]
    #[case("tool IN ('a' 'b')", "expected ',' or ')' in value list")]
    #[case("tool IN 'a'", "expected '(' at position 8")]
    #[case("tool LIKE 5", "LIKE pattern must be a string")]
    #[case("tool REGEXP '('", "invalid regex pattern '('")]
    #[case("tool = 'a' )", "unexpected input at position 11")]
    #[case("tool = 'a' # x", "unexpected character '#' at position 11")]
    fn test_parse_errors(#[case] input: &str, #[case] message: &str) {
        assert_eq!(parse_expression(input).unwrap_err().to_string(), message);
    }

    #[test]
    fn test_incomparable_values() {
        let err = parse_expression("tool > 5").unwrap().evaluate(&row()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported comparison: tool > 5");
    }

    #[test]
    fn test_filter_tool_calls() {
        let calls = vec![
            ToolCall {
                uuid: "a1".into(),
                tool_name: "Bash".into(),
                status: "error".into(),
                error: "command not found".into(),
                ..ToolCall::default()
            },
            ToolCall {
                uuid: "a2".into(),
                tool_name: "Read".into(),
                ..ToolCall::default()
            },
            ToolCall {
                uuid: "a3".into(),
                tool_name: "Bash".into(),
                ..ToolCall::default()
            },
        ];

        let expression = parse_expression("tool_name = 'Bash' AND error LIKE '%not found'").unwrap();
        let kept = filter_records(calls.clone(), &expression).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].uuid, "a1");

        let expression = parse_expression("NOT status = 'error'").unwrap();
        let uuids: Vec<String> = filter_records(calls, &expression)
            .unwrap()
            .into_iter()
            .map(|c| c.uuid)
            .collect();
        assert_eq!(uuids, vec!["a2", "a3"]);
    }
}
