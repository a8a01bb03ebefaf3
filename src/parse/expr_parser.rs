use std::fmt;

use crate::model::task::{TAG_MARKER, Task, is_tag_char};

/// Error type for tag expressions. Positions are byte offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },
    #[error("unbalanced parenthesis at {pos}")]
    UnbalancedParen { pos: usize },
    #[error("operator {op} at {pos} has no right operand")]
    DanglingOperator { op: &'static str, pos: usize },
    #[error("expected a tag, NOT or '(' at {pos}")]
    MissingOperand { pos: usize },
    #[error("expected AND or OR before '{token}' at {pos}")]
    UnknownOperator { token: String, pos: usize },
    #[error("expression nested too deeply at {pos}")]
    TooDeep { pos: usize },
}

/// Deepest expression tree the parser builds. Evaluation recurses once per
/// level, and long AND/OR chains count one level per operator.
pub const MAX_DEPTH: usize = 256;

/// A boolean expression over tag names.
///
/// `AND` binds tighter than `OR`; both are left-associative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Group(Box<Expr>),
}

impl Expr {
    /// Whether a task's tag set satisfies this expression
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Expr::Tag(tag) => task.has_tag(tag),
            Expr::Not(inner) => !inner.matches(task),
            Expr::And(lhs, rhs) => lhs.matches(task) && rhs.matches(task),
            Expr::Or(lhs, rhs) => lhs.matches(task) || rhs.matches(task),
            Expr::Group(inner) => inner.matches(task),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Tag(tag) => write!(f, "{}", tag),
            Expr::Not(inner) => write!(f, "NOT {}", inner),
            Expr::And(lhs, rhs) => write!(f, "{} AND {}", lhs, rhs),
            Expr::Or(lhs, rhs) => write!(f, "{} OR {}", lhs, rhs),
            Expr::Group(inner) => write!(f, "({})", inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Tag(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    pos: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let kind = match c {
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            c if c == TAG_MARKER || is_tag_char(c) => {
                chars.next();
                let mut word = String::new();
                if c != TAG_MARKER {
                    word.push(c);
                }
                while let Some(&(_, next)) = chars.peek() {
                    if !is_tag_char(next) {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                if word.is_empty() {
                    return Err(ExprError::UnexpectedChar { ch: c, pos });
                }
                // `#and` is always a tag; bare keywords are operators
                if c == TAG_MARKER {
                    TokenKind::Tag(word)
                } else {
                    match word.to_ascii_uppercase().as_str() {
                        "AND" => TokenKind::And,
                        "OR" => TokenKind::Or,
                        "NOT" => TokenKind::Not,
                        _ => TokenKind::Tag(word),
                    }
                }
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, pos }),
        };
        tokens.push(Token { kind, pos });
    }

    Ok(tokens)
}

/// Parse a tag expression. Blank input means "no filter" and yields `None`.
pub fn parse_expr(input: &str) -> Result<Option<Expr>, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut parser = Parser {
        tokens,
        next: 0,
        end: input.len(),
        depth: 0,
    };
    let (expr, _) = parser.expr()?;
    match parser.peek() {
        None => Ok(Some(expr)),
        Some(Token {
            kind: TokenKind::RParen,
            pos,
        }) => Err(ExprError::UnbalancedParen { pos: *pos }),
        Some(Token {
            kind: TokenKind::Tag(tag),
            pos,
        }) => Err(ExprError::UnknownOperator {
            token: tag.clone(),
            pos: *pos,
        }),
        Some(token) => Err(ExprError::UnknownOperator {
            token: describe(&token.kind).to_string(),
            pos: token.pos,
        }),
    }
}

fn describe(kind: &TokenKind) -> &str {
    match kind {
        TokenKind::LParen => "(",
        TokenKind::RParen => ")",
        TokenKind::And => "AND",
        TokenKind::Or => "OR",
        TokenKind::Not => "NOT",
        TokenKind::Tag(tag) => tag,
    }
}

struct Parser {
    tokens: Vec<Token>,
    next: usize,
    /// Offset reported when the input ends early
    end: usize,
    /// Open NOTs and parentheses around the current position
    depth: usize,
}

/// An expression and the height of its tree
type Parsed = Result<(Expr, usize), ExprError>;

fn check_height(height: usize, pos: usize) -> Result<usize, ExprError> {
    if height > MAX_DEPTH {
        return Err(ExprError::TooDeep { pos });
    }
    Ok(height)
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    fn eat(&mut self, kind: &TokenKind) -> Option<usize> {
        match self.peek() {
            Some(token) if token.kind == *kind => {
                let pos = token.pos;
                self.next += 1;
                Some(pos)
            }
            _ => None,
        }
    }

    /// Enter a NOT or parenthesis. Whatever it wraps adds at least one
    /// more level, so stop before recursing that far.
    fn descend(&mut self, pos: usize) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep { pos });
        }
        Ok(())
    }

    /// expr := term (OR term)*
    fn expr(&mut self) -> Parsed {
        let (mut lhs, mut height) = self.term()?;
        while let Some(pos) = self.eat(&TokenKind::Or) {
            let (rhs, rhs_height) = self.operand("OR", pos, Self::term)?;
            height = check_height(height.max(rhs_height) + 1, pos)?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    /// term := factor (AND factor)*
    fn term(&mut self) -> Parsed {
        let (mut lhs, mut height) = self.factor()?;
        while let Some(pos) = self.eat(&TokenKind::And) {
            let (rhs, rhs_height) = self.operand("AND", pos, Self::factor)?;
            height = check_height(height.max(rhs_height) + 1, pos)?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok((lhs, height))
    }

    /// factor := NOT factor | '(' expr ')' | tag
    fn factor(&mut self) -> Parsed {
        if let Some(pos) = self.eat(&TokenKind::Not) {
            self.descend(pos)?;
            let (inner, height) = self.operand("NOT", pos, Self::factor)?;
            self.depth -= 1;
            return Ok((Expr::Not(Box::new(inner)), check_height(height + 1, pos)?));
        }
        if let Some(open) = self.eat(&TokenKind::LParen) {
            self.descend(open)?;
            let (inner, height) = self.expr()?;
            if self.eat(&TokenKind::RParen).is_none() {
                return Err(ExprError::UnbalancedParen { pos: open });
            }
            self.depth -= 1;
            return Ok((Expr::Group(Box::new(inner)), check_height(height + 1, open)?));
        }
        match self.peek() {
            Some(Token {
                kind: TokenKind::Tag(tag),
                ..
            }) => {
                let expr = Expr::Tag(tag.clone());
                self.next += 1;
                Ok((expr, 1))
            }
            Some(token) => Err(ExprError::MissingOperand { pos: token.pos }),
            None => Err(ExprError::MissingOperand { pos: self.end }),
        }
    }

    /// Parse the operand following operator `op`, reporting a dangling
    /// operator when nothing usable follows it.
    fn operand(
        &mut self,
        op: &'static str,
        pos: usize,
        rule: fn(&mut Self) -> Parsed,
    ) -> Parsed {
        match self.peek().map(|t| &t.kind) {
            None | Some(TokenKind::RParen) => Err(ExprError::DanglingOperator { op, pos }),
            _ => rule(self),
        }
    }
}
