//! Path expressions over probe response bodies
//!
//! The JMESPath grammar used by service waiter metadata:
//!
//! - identifiers and quoted identifiers: `Table`, `"Table Name"`, `@`
//! - sub-expressions: `Table.TableStatus`
//! - list projections: `Reservations[].Instances[].State.Name`,
//!   `Stacks[*].StackStatus`
//! - object projections: `Tags.*.Value`
//! - filter projections: `services[?runningCount == desiredCount]`
//! - indexes, negative from the end: `Items[0]`, `Items[-1]`
//! - literals `` `0` ``, `'raw'`
//! - comparisons `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - `&&`, `||`, `!`, parentheses and pipes (`a[*].b | [0]`)
//! - functions `length(expr)` and `contains(subject, search)`
//!
//! A projection applies its right-hand side to every element and drops
//! `null` results; nested projections produce nested lists. Missing fields
//! evaluate to `null`. Slices, multi-selects and expression references are
//! rejected at parse time.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// A path expression failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct PathError {
    pub position: usize,
    pub message: String,
}

impl PathError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }
}

/// A compiled path expression
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    source: String,
    root: Node,
}

impl PathExpr {
    /// Compile `source`
    ///
    /// # Errors
    /// Returns `PathError` with the character offset of the first problem.
    pub fn parse(source: &str) -> Result<Self, PathError> {
        let mut parser = Parser::new(lex(source)?, source.len());
        let root = parser.expression(0)?;
        let trailing = parser.current();
        if trailing.kind != TokenKind::Eof {
            return Err(PathError::new(trailing.position, format!("unexpected {}", trailing.kind)));
        }
        Ok(Self { source: source.to_string(), root })
    }

    /// Evaluate against a JSON document
    pub fn evaluate(&self, document: &Value) -> Value {
        eval(&self.root, document)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Structural JSON equality where numbers compare by value (`1 == 1.0`)
pub fn json_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| json_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| json_equals(x, y)))
        }
        _ => left == right,
    }
}

/// JMESPath truthiness: `null`, `false` and empty strings, lists and objects
/// are false
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparator {
    fn apply(self, left: &Value, right: &Value) -> Value {
        match self {
            Self::Eq => Value::Bool(json_equals(left, right)),
            Self::Ne => Value::Bool(!json_equals(left, right)),
            ordering => {
                let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
                    return Value::Null;
                };
                let Some(order) = a.partial_cmp(&b) else {
                    return Value::Null;
                };
                Value::Bool(match ordering {
                    Self::Lt => order == Ordering::Less,
                    Self::Le => order != Ordering::Greater,
                    Self::Gt => order == Ordering::Greater,
                    Self::Ge => order != Ordering::Less,
                    Self::Eq | Self::Ne => false,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Length,
    Contains,
}

impl Function {
    fn resolve(name: &str, arity: usize, position: usize) -> Result<Self, PathError> {
        let (function, expected) = match name {
            "length" => (Self::Length, 1),
            "contains" => (Self::Contains, 2),
            other => return Err(PathError::new(position, format!("unknown function '{other}'"))),
        };
        if arity != expected {
            return Err(PathError::new(
                position,
                format!("function '{name}' takes {expected} argument(s), got {arity}"),
            ));
        }
        Ok(function)
    }

    fn call(self, args: &[Value]) -> Value {
        match (self, args) {
            (Self::Length, [Value::Array(items)]) => Value::from(items.len()),
            (Self::Length, [Value::Object(map)]) => Value::from(map.len()),
            (Self::Length, [Value::String(text)]) => Value::from(text.chars().count()),
            (Self::Contains, [Value::Array(items), search]) => {
                Value::Bool(items.iter().any(|item| json_equals(item, search)))
            }
            (Self::Contains, [Value::String(text), Value::String(search)]) => {
                Value::Bool(text.contains(search.as_str()))
            }
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Current,
    Field(String),
    Subexpression(Box<Node>, Box<Node>),
    Index(Box<Node>, i64),
    Flatten(Box<Node>),
    /// Left must be a list; right runs on each element
    Projection(Box<Node>, Box<Node>),
    /// Left must be an object; right runs on each value
    ValueProjection(Box<Node>, Box<Node>),
    FilterProjection { left: Box<Node>, condition: Box<Node>, right: Box<Node> },
    Literal(Value),
    Compare(Box<Node>, Comparator, Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Pipe(Box<Node>, Box<Node>),
    Function(Function, Vec<Node>),
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Ident(String),
    Quoted(String),
    Number(i64),
    Literal(Value),
    Dot,
    Star,
    At,
    Comma,
    LBracket,
    RBracket,
    /// `[]`
    Flatten,
    /// `[?`
    Filter,
    LParen,
    RParen,
    Pipe,
    Or,
    And,
    Not,
    Compare(Comparator),
    Eof,
}

impl TokenKind {
    /// Left binding power for the precedence-climbing parser
    fn binding_power(&self) -> u8 {
        match self {
            Self::Pipe => 1,
            Self::Or => 2,
            Self::And => 3,
            Self::Compare(_) => 5,
            Self::Flatten => 9,
            Self::Star => 20,
            Self::Filter => 21,
            Self::Dot => 40,
            Self::Not => 45,
            Self::LBracket => 55,
            _ => 0,
        }
    }
}

/// Tokens binding weaker than this end a projection's right-hand side
const PROJECTION_STOP: u8 = 10;

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{name}'"),
            Self::Quoted(name) => write!(f, "quoted identifier \"{name}\""),
            Self::Number(n) => write!(f, "number {n}"),
            Self::Literal(value) => write!(f, "literal {value}"),
            Self::Dot => write!(f, "'.'"),
            Self::Star => write!(f, "'*'"),
            Self::At => write!(f, "'@'"),
            Self::Comma => write!(f, "','"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::Flatten => write!(f, "'[]'"),
            Self::Filter => write!(f, "'[?'"),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Pipe => write!(f, "'|'"),
            Self::Or => write!(f, "'||'"),
            Self::And => write!(f, "'&&'"),
            Self::Not => write!(f, "'!'"),
            Self::Compare(op) => write!(f, "comparator {op:?}"),
            Self::Eof => write!(f, "end of expression"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    position: usize,
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn lex(source: &str) -> Result<Vec<Token>, PathError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        let kind = match c {
            c if c.is_whitespace() => continue,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '@' => TokenKind::At,
            ',' => TokenKind::Comma,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => {
                if followed_by(&mut chars, ']') {
                    TokenKind::Flatten
                } else if followed_by(&mut chars, '?') {
                    TokenKind::Filter
                } else {
                    TokenKind::LBracket
                }
            }
            '|' if followed_by(&mut chars, '|') => TokenKind::Or,
            '|' => TokenKind::Pipe,
            '&' if followed_by(&mut chars, '&') => TokenKind::And,
            '!' if followed_by(&mut chars, '=') => TokenKind::Compare(Comparator::Ne),
            '!' => TokenKind::Not,
            '=' if followed_by(&mut chars, '=') => TokenKind::Compare(Comparator::Eq),
            '<' if followed_by(&mut chars, '=') => TokenKind::Compare(Comparator::Le),
            '<' => TokenKind::Compare(Comparator::Lt),
            '>' if followed_by(&mut chars, '=') => TokenKind::Compare(Comparator::Ge),
            '>' => TokenKind::Compare(Comparator::Gt),
            '"' => TokenKind::Quoted(delimited(&mut chars, '"', position)?),
            '\'' => TokenKind::Literal(Value::String(delimited(&mut chars, '\'', position)?)),
            '`' => {
                let raw = delimited(&mut chars, '`', position)?;
                let value = serde_json::from_str(raw.trim()).map_err(|e| {
                    PathError::new(position, format!("invalid JSON literal `{raw}`: {e}"))
                })?;
                TokenKind::Literal(value)
            }
            c if c == '-' || c.is_ascii_digit() => {
                let mut text = String::from(c);
                while let Some((_, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit()) {
                    text.push(d);
                }
                let n = text
                    .parse::<i64>()
                    .map_err(|_| PathError::new(position, format!("invalid number '{text}'")))?;
                TokenKind::Number(n)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some((_, d)) =
                    chars.next_if(|&(_, d)| d.is_ascii_alphanumeric() || d == '_')
                {
                    name.push(d);
                }
                TokenKind::Ident(name)
            }
            '{' | '}' | ':' | '&' => {
                return Err(PathError::new(position, format!("unsupported '{c}'")))
            }
            other => return Err(PathError::new(position, format!("unexpected '{other}'"))),
        };
        tokens.push(Token { kind, position });
    }

    Ok(tokens)
}

fn followed_by(chars: &mut Chars<'_>, expected: char) -> bool {
    chars.next_if(|&(_, next)| next == expected).is_some()
}

/// Read up to the closing `delimiter`; `\` escapes the next character
fn delimited(chars: &mut Chars<'_>, delimiter: char, start: usize) -> Result<String, PathError> {
    let mut text = String::new();
    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    text.push(escaped);
                }
            }
            c if c == delimiter => return Ok(text),
            c => text.push(c),
        }
    }
    Err(PathError::new(start, format!("unterminated {delimiter}")))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl Parser {
    fn new(tokens: Vec<Token>, end: usize) -> Self {
        Self { tokens, pos: 0, eof: Token { kind: TokenKind::Eof, position: end } }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<(), PathError> {
        let token = self.advance();
        if &token.kind == expected {
            Ok(())
        } else {
            Err(PathError::new(token.position, format!("expected {expected}, found {}", token.kind)))
        }
    }

    fn expression(&mut self, binding_power: u8) -> Result<Node, PathError> {
        let token = self.advance();
        let mut left = self.prefix(token)?;
        while binding_power < self.current().kind.binding_power() {
            let token = self.advance();
            left = self.infix(token, left)?;
        }
        Ok(left)
    }

    fn prefix(&mut self, token: Token) -> Result<Node, PathError> {
        match token.kind {
            TokenKind::Literal(value) => Ok(Node::Literal(value)),
            TokenKind::Ident(name) if self.current().kind == TokenKind::LParen => {
                self.function(&name, token.position)
            }
            TokenKind::Ident(name) | TokenKind::Quoted(name) => Ok(Node::Field(name)),
            TokenKind::At => Ok(Node::Current),
            TokenKind::Star => {
                let right = self.projection_rhs(TokenKind::Star.binding_power())?;
                Ok(Node::ValueProjection(Box::new(Node::Current), Box::new(right)))
            }
            TokenKind::Flatten => {
                let right = self.projection_rhs(TokenKind::Flatten.binding_power())?;
                Ok(Node::Projection(
                    Box::new(Node::Flatten(Box::new(Node::Current))),
                    Box::new(right),
                ))
            }
            TokenKind::Filter => self.filter(Node::Current),
            TokenKind::LBracket => self.bracket(Node::Current),
            TokenKind::Not => {
                let operand = self.expression(TokenKind::Not.binding_power())?;
                Ok(Node::Not(Box::new(operand)))
            }
            TokenKind::LParen => {
                let inner = self.expression(0)?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Eof => Err(PathError::new(token.position, "expected an expression")),
            other => Err(PathError::new(token.position, format!("unexpected {other}"))),
        }
    }

    fn infix(&mut self, token: Token, left: Node) -> Result<Node, PathError> {
        let left = Box::new(left);
        match token.kind {
            TokenKind::Dot if self.current().kind == TokenKind::Star => {
                self.advance();
                let right = self.projection_rhs(TokenKind::Star.binding_power())?;
                Ok(Node::ValueProjection(left, Box::new(right)))
            }
            TokenKind::Dot => {
                let right = self.dot_rhs(TokenKind::Dot.binding_power())?;
                Ok(Node::Subexpression(left, Box::new(right)))
            }
            TokenKind::Pipe => Ok(Node::Pipe(left, Box::new(self.expression(1)?))),
            TokenKind::Or => Ok(Node::Or(left, Box::new(self.expression(2)?))),
            TokenKind::And => Ok(Node::And(left, Box::new(self.expression(3)?))),
            TokenKind::Compare(op) => {
                let right = self.expression(TokenKind::Compare(op).binding_power())?;
                Ok(Node::Compare(left, op, Box::new(right)))
            }
            TokenKind::Flatten => {
                let right = self.projection_rhs(TokenKind::Flatten.binding_power())?;
                Ok(Node::Projection(Box::new(Node::Flatten(left)), Box::new(right)))
            }
            TokenKind::Filter => self.filter(*left),
            TokenKind::LBracket => self.bracket(*left),
            other => Err(PathError::new(token.position, format!("unexpected {other}"))),
        }
    }

    /// After `[`: an index or a `*]` list projection
    fn bracket(&mut self, left: Node) -> Result<Node, PathError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(index) => {
                self.expect(&TokenKind::RBracket)?;
                Ok(Node::Index(Box::new(left), index))
            }
            TokenKind::Star => {
                self.expect(&TokenKind::RBracket)?;
                let right = self.projection_rhs(TokenKind::Star.binding_power())?;
                Ok(Node::Projection(Box::new(left), Box::new(right)))
            }
            _ => Err(PathError::new(token.position, "expected '*' or an index inside brackets")),
        }
    }

    /// After `[?`: condition, `]`, then the projected right-hand side
    fn filter(&mut self, left: Node) -> Result<Node, PathError> {
        let condition = self.expression(0)?;
        self.expect(&TokenKind::RBracket)?;
        let right = self.projection_rhs(TokenKind::Filter.binding_power())?;
        Ok(Node::FilterProjection {
            left: Box::new(left),
            condition: Box::new(condition),
            right: Box::new(right),
        })
    }

    fn function(&mut self, name: &str, position: usize) -> Result<Node, PathError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.current().kind == TokenKind::RParen {
            self.advance();
        } else {
            loop {
                args.push(self.expression(0)?);
                if self.current().kind == TokenKind::Comma {
                    self.advance();
                } else {
                    self.expect(&TokenKind::RParen)?;
                    break;
                }
            }
        }
        Ok(Node::Function(Function::resolve(name, args.len(), position)?, args))
    }

    fn dot_rhs(&mut self, binding_power: u8) -> Result<Node, PathError> {
        let Token { kind, position } = self.current().clone();
        match kind {
            TokenKind::Ident(_) | TokenKind::Quoted(_) | TokenKind::Star => {
                self.expression(binding_power)
            }
            other => Err(PathError::new(
                position,
                format!("expected identifier after '.', found {other}"),
            )),
        }
    }

    /// What a projection applies to each element
    fn projection_rhs(&mut self, binding_power: u8) -> Result<Node, PathError> {
        let Token { kind, position } = self.current().clone();
        if kind.binding_power() < PROJECTION_STOP {
            return Ok(Node::Current);
        }
        match kind {
            TokenKind::LBracket | TokenKind::Filter => self.expression(binding_power),
            TokenKind::Dot => {
                self.advance();
                self.dot_rhs(binding_power)
            }
            other => Err(PathError::new(position, format!("unexpected {other} after projection"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(node: &Node, value: &Value) -> Value {
    match node {
        Node::Current => value.clone(),
        Node::Field(name) => {
            value.as_object().and_then(|map| map.get(name)).cloned().unwrap_or(Value::Null)
        }
        Node::Subexpression(left, right) | Node::Pipe(left, right) => {
            eval(right, &eval(left, value))
        }
        Node::Index(inner, index) => match eval(inner, value) {
            Value::Array(items) => resolve_index(items.len(), *index)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        Node::Flatten(inner) => match eval(inner, value) {
            Value::Array(items) => {
                let mut flattened = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Array(nested) => flattened.extend(nested),
                        other => flattened.push(other),
                    }
                }
                Value::Array(flattened)
            }
            _ => Value::Null,
        },
        Node::Projection(left, right) => match eval(left, value) {
            Value::Array(items) => project(items.iter(), right),
            _ => Value::Null,
        },
        Node::ValueProjection(left, right) => match eval(left, value) {
            Value::Object(map) => project(map.values(), right),
            _ => Value::Null,
        },
        Node::FilterProjection { left, condition, right } => match eval(left, value) {
            Value::Array(items) => {
                project(items.iter().filter(|item| is_truthy(&eval(condition, item))), right)
            }
            _ => Value::Null,
        },
        Node::Literal(literal) => literal.clone(),
        Node::Compare(left, op, right) => op.apply(&eval(left, value), &eval(right, value)),
        Node::And(left, right) => {
            let left = eval(left, value);
            if is_truthy(&left) {
                eval(right, value)
            } else {
                left
            }
        }
        Node::Or(left, right) => {
            let left = eval(left, value);
            if is_truthy(&left) {
                left
            } else {
                eval(right, value)
            }
        }
        Node::Not(inner) => Value::Bool(!is_truthy(&eval(inner, value))),
        Node::Function(function, args) => {
            let args: Vec<Value> = args.iter().map(|arg| eval(arg, value)).collect();
            function.call(&args)
        }
    }
}

fn project<'a>(items: impl Iterator<Item = &'a Value>, right: &Node) -> Value {
    Value::Array(items.map(|item| eval(right, item)).filter(|v| !v.is_null()).collect())
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let resolved = if index < 0 { len + index } else { index };
    if (0..len).contains(&resolved) {
        usize::try_from(resolved).ok()
    } else {
        None
    }
}
