//! Formula validation: lexer, Pratt-style parser, and AST.
//!
//! Operator-authored formula text is parsed into a small fixed-grammar AST
//! before it is ever evaluated. The grammar has no loops, no assignment,
//! and no calls outside a hard-coded allow-list, so a validated formula is
//! guaranteed to evaluate in time linear in its node count. Complexity is
//! bounded at parse time by [`MAX_DEPTH`] and [`MAX_NODES`].

use std::collections::BTreeSet;

use thiserror::Error;

/// Maximum nesting depth of a formula AST.
pub const MAX_DEPTH: usize = 32;

/// Maximum number of nodes in a formula AST.
pub const MAX_NODES: usize = 500;

/// Why a formula failed validation. Positions are byte offsets into the
/// formula text where known.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected '{found}' at position {pos}")]
    UnexpectedToken { found: String, pos: usize },

    #[error("unexpected end of formula")]
    UnexpectedEnd,

    #[error("unknown function '{name}' at position {pos}")]
    UnknownFunction { name: String, pos: usize },

    #[error("{name} expects {expected} argument(s), got {got}")]
    WrongArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("formula too complex: {0}")]
    TooComplex(String),
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Comparison operators; evaluation yields 1.0 for true and 0.0 for false.
/// `Eq`/`Ne` compare floats exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

/// Allow-listed functions. Anything else fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Sqrt,
    Abs,
    Round,
    Clamp,
    If,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Function::Min),
            "max" => Some(Function::Max),
            "sqrt" => Some(Function::Sqrt),
            "abs" => Some(Function::Abs),
            "round" => Some(Function::Round),
            "clamp" => Some(Function::Clamp),
            "if" => Some(Function::If),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Sqrt => "sqrt",
            Function::Abs => "abs",
            Function::Round => "round",
            Function::Clamp => "clamp",
            Function::If => "if",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Sqrt | Function::Abs | Function::Round => 1,
            Function::Min | Function::Max => 2,
            Function::Clamp | Function::If => 3,
        }
    }
}

/// A node in a validated formula AST.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

impl Expr {
    fn node_count(&self) -> usize {
        match self {
            Expr::Number(_) | Expr::Variable(_) => 1,
            Expr::Neg(inner) => 1 + inner.node_count(),
            Expr::Binary { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                1 + lhs.node_count() + rhs.node_count()
            }
            Expr::Call { args, .. } => 1 + args.iter().map(Expr::node_count).sum::<usize>(),
        }
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Variable(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_variables(out),
            Expr::Binary { lhs, rhs, .. } | Expr::Compare { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.collect_variables(out);
                }
            }
        }
    }
}

/// A validated formula: the original text plus its AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    text: String,
    root: Expr,
}

impl Formula {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Census of every variable name the formula references.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.root.collect_variables(&mut out);
        out
    }
}

/// Parse and validate formula text into a [`Formula`].
///
/// Never evaluates the formula and never requires a variable environment;
/// this is a pure syntax check plus complexity bounds.
pub fn validate(text: &str) -> Result<Formula, ValidationError> {
    let tokens = lex(text)?;
    if tokens.is_empty() {
        return Err(ValidationError::Empty);
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let root = parser.parse_expr()?;
    if let Some(tok) = parser.peek() {
        return Err(ValidationError::UnexpectedToken {
            found: tok.kind.describe(),
            pos: tok.pos,
        });
    }
    let nodes = root.node_count();
    if nodes > MAX_NODES {
        return Err(ValidationError::TooComplex(format!(
            "{nodes} nodes exceeds the limit of {MAX_NODES}"
        )));
    }
    Ok(Formula {
        text: text.to_string(),
        root,
    })
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Compare(CompareOp),
}

impl TokenKind {
    fn describe(&self) -> String {
        match self {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Ident(name) => name.clone(),
            TokenKind::Plus => "+".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Star => "*".into(),
            TokenKind::Slash => "/".into(),
            TokenKind::Caret => "^".into(),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::Compare(op) => match op {
                CompareOp::Lt => "<".into(),
                CompareOp::Le => "<=".into(),
                CompareOp::Gt => ">".into(),
                CompareOp::Ge => ">=".into(),
                CompareOp::Eq => "==".into(),
                CompareOp::Ne => "!=".into(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn lex(text: &str) -> Result<Vec<Token>, ValidationError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let ch = bytes[i] as char;
        let pos = i;

        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                i += 1;
            }
            '+' => {
                tokens.push(Token { kind: TokenKind::Plus, pos });
                i += 1;
            }
            '-' => {
                tokens.push(Token { kind: TokenKind::Minus, pos });
                i += 1;
            }
            '*' => {
                tokens.push(Token { kind: TokenKind::Star, pos });
                i += 1;
            }
            '/' => {
                tokens.push(Token { kind: TokenKind::Slash, pos });
                i += 1;
            }
            '^' => {
                tokens.push(Token { kind: TokenKind::Caret, pos });
                i += 1;
            }
            '(' => {
                tokens.push(Token { kind: TokenKind::LParen, pos });
                i += 1;
            }
            ')' => {
                tokens.push(Token { kind: TokenKind::RParen, pos });
                i += 1;
            }
            ',' => {
                tokens.push(Token { kind: TokenKind::Comma, pos });
                i += 1;
            }
            '<' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Le), pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Lt), pos });
                    i += 1;
                }
            }
            '>' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Ge), pos });
                    i += 2;
                } else {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Gt), pos });
                    i += 1;
                }
            }
            '=' => {
                // A single '=' would be assignment, which the grammar forbids.
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Eq), pos });
                    i += 2;
                } else {
                    return Err(ValidationError::UnexpectedChar { ch: '=', pos });
                }
            }
            '!' => {
                if bytes.get(i + 1) == Some(&b'=') {
                    tokens.push(Token { kind: TokenKind::Compare(CompareOp::Ne), pos });
                    i += 2;
                } else {
                    return Err(ValidationError::UnexpectedChar { ch: '!', pos });
                }
            }
            '0'..='9' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'.' {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let value: f64 = text[start..i].parse().map_err(|_| {
                    ValidationError::UnexpectedToken {
                        found: text[start..i].to_string(),
                        pos: start,
                    }
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    pos: start,
                });
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(text[start..i].to_string()),
                    pos: start,
                });
            }
            other => {
                // Non-ASCII input lands here with only the first byte of the
                // character in hand; decode the whole character so the error
                // quotes it correctly. Every prior arm advances by whole
                // ASCII characters, so `pos` is a char boundary.
                let ch = text[pos..].chars().next().unwrap_or(other);
                return Err(ValidationError::UnexpectedChar { ch, pos });
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

// Precedence, loosest to tightest: comparison, additive, multiplicative,
// unary minus, power (right-associative), primary.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<(), ValidationError> {
        match self.tokens.get(self.pos) {
            Some(tok) if &tok.kind == kind => {
                self.pos += 1;
                Ok(())
            }
            Some(tok) => Err(ValidationError::UnexpectedToken {
                found: tok.kind.describe(),
                pos: tok.pos,
            }),
            None => Err(ValidationError::UnexpectedEnd),
        }
    }

    fn enter(&mut self) -> Result<(), ValidationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ValidationError::TooComplex(format!(
                "nesting exceeds the depth limit of {MAX_DEPTH}"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expr(&mut self) -> Result<Expr, ValidationError> {
        self.enter()?;
        let result = self.parse_comparison();
        self.leave();
        result
    }

    fn parse_comparison(&mut self) -> Result<Expr, ValidationError> {
        let mut lhs = self.parse_additive()?;
        while let Some(Token {
            kind: TokenKind::Compare(op),
            ..
        }) = self.peek()
        {
            let op = *op;
            self.advance();
            let rhs = self.parse_additive()?;
            lhs = Expr::Compare {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ValidationError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ValidationError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ValidationError> {
        if let Some(Token {
            kind: TokenKind::Minus,
            ..
        }) = self.peek()
        {
            self.advance();
            self.enter()?;
            let inner = self.parse_unary();
            self.leave();
            return Ok(Expr::Neg(Box::new(inner?)));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, ValidationError> {
        let lhs = self.parse_primary()?;
        if let Some(Token {
            kind: TokenKind::Caret,
            ..
        }) = self.peek()
        {
            self.advance();
            // Right-associative; the recursion through parse_unary also
            // allows a negated exponent like `x ^ -2`. Counted against the
            // depth limit so a long `^` chain cannot recurse unboundedly.
            self.enter()?;
            let rhs = self.parse_unary();
            self.leave();
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs?),
            });
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, ValidationError> {
        let tok = match self.advance() {
            Some(tok) => tok.clone(),
            None => return Err(ValidationError::UnexpectedEnd),
        };

        match tok.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    let Some(function) = Function::from_name(&name) else {
                        return Err(ValidationError::UnknownFunction { name, pos: tok.pos });
                    };
                    self.advance(); // consume '('
                    let args = self.parse_args()?;
                    if args.len() != function.arity() {
                        return Err(ValidationError::WrongArity {
                            name: function.name(),
                            expected: function.arity(),
                            got: args.len(),
                        });
                    }
                    Ok(Expr::Call { function, args })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            other => Err(ValidationError::UnexpectedToken {
                found: other.describe(),
                pos: tok.pos,
            }),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ValidationError> {
        let mut args = Vec::new();
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::RParen)) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(args),
                Some(tok) => {
                    return Err(ValidationError::UnexpectedToken {
                        found: tok.kind.describe(),
                        pos: tok.pos,
                    })
                }
                None => return Err(ValidationError::UnexpectedEnd),
            }
        }
    }
}
