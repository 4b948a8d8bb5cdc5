//! a module turns a String expression into a symbolic expression
//!
//! Parsing happens in two passes:
//! 1) a `nom` lexer cuts the text into numbers, identifiers and operators and
//!    resolves every identifier against the [`ParseContext`] (variables, `pi`, `e`)
//!    or the list of elementary functions. Identifiers that are not known as a whole
//!    are split into known names, so `x1x2` reads as `x1 x2` and `pix1` as `pi x1`;
//! 2) a recursive descent pass builds the [`Expr`] tree, inserting a multiplication
//!    wherever two operands stand next to each other (`2x1`, `(x1 + 1)(x2 - 1)`).
//!
//!```text
//!  sum      := product (('+' | '-') product)*
//!  product  := unary (('*' | '/') unary | power)*      <- second arm is implicit '*'
//!  unary    := ('-' | '+') unary | power
//!  power    := primary ('^' unary)?                   <- right associative, '**' == '^'
//!  primary  := number | variable | constant | '(' sum ')'
//!            | function '(' sum ')' | function power power*   <- implicit '*' inside
//!```
//!# Example
//! ```
//! use RustedNewton::symbolic::parse_expr::{parse, ParseContext};
//! let context = ParseContext::indexed(2, "x");
//! let expr = parse("2x1^2 + pi x2", &context).unwrap();
//! println!("parsed expression {}", expr);
//! ```
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, one_of},
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::pair,
};

use crate::error::SyntaxError;
use crate::symbolic::symbolic_engine::{ElemFn, Expr, NamedConst};

/// What a name stands for inside a parsing context.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(String),
    Constant(NamedConst),
}

/// Names visible to the parser.
///
/// Variables keep the order in which they were declared; that order is the one the
/// Jacobian columns and the solution vector use.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    symbols: HashMap<String, Symbol>,
    order: Vec<String>,
}

impl ParseContext {
    /// context without any names, not even `pi` and `e`
    pub fn new() -> Self {
        Self::default()
    }

    /// `pi` and `e` only: the grammar for initial guesses
    pub fn constants() -> Self {
        let mut context = Self::new();
        for constant in [NamedConst::Pi, NamedConst::E] {
            context
                .symbols
                .insert(constant.to_string(), Symbol::Constant(constant));
        }
        context
    }

    /// constants plus the given variables, in the given order
    pub fn with_variables(names: &[&str]) -> Self {
        let mut context = Self::constants();
        for name in names {
            context.insert_variable(name);
        }
        context
    }

    /// constants plus `{stem}1 .. {stem}{n}`
    pub fn indexed(n: usize, stem: &str) -> Self {
        let (_, names) = Expr::IndexedVars(n, stem);
        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        Self::with_variables(&names)
    }

    /// Declares a variable. A variable may shadow `pi` or `e`.
    pub fn insert_variable(&mut self, name: &str) {
        let previous = self
            .symbols
            .insert(name.to_string(), Symbol::Variable(name.to_string()));
        if !matches!(previous, Some(Symbol::Variable(_))) {
            self.order.push(name.to_string());
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// declared variables in declaration order
    pub fn variables(&self) -> &[String] {
        &self.order
    }
}

/// Parses `text` into an expression, resolving names against `context`.
pub fn parse(text: &str, context: &ParseContext) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(text, context)?;
    if tokens.is_empty() {
        return Err(SyntaxError::new(text, 0, "empty expression"));
    }
    let mut parser = ExprParser {
        text,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_sum()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.error(format!("unexpected {}", token))),
    }
}

/// Parses a numeric expression that may only use `pi` and `e`, e.g. `pi/4`.
pub fn parse_constant(text: &str) -> Result<Expr, SyntaxError> {
    parse(text, &ParseContext::constants())
}

//___________________________________LEXER____________________________________

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Var(String),
    Const(NamedConst),
    Func(ElemFn),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "number {}", v),
            Token::Var(name) => write!(f, "variable '{}'", name),
            Token::Const(c) => write!(f, "constant '{}'", c),
            Token::Func(func) => write!(f, "function '{}'", func),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Caret => write!(f, "'^'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    /// character offset in the source text
    pos: usize,
}

/// `12`, `1.5`, `.5`, `2.`, `6.02e23`. An `e` not followed by digits is left alone,
/// so `2e` lexes as `2` followed by the constant `e`.
fn number_literal(input: &str) -> IResult<&str, &str> {
    let mantissa = alt((
        map((digit1, opt((char('.'), digit0))), |_| ()),
        map((char('.'), digit1), |_| ()),
    ));
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    let result: IResult<&str, _> = (mantissa, exponent).parse(input);
    let (rest, _) = result?;
    Ok((rest, &input[..input.len() - rest.len()]))
}

/// word characters starting with a letter or underscore
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn char_offset(text: &str, rest: &str) -> usize {
    text[..text.len() - rest.len()].chars().count()
}

fn tokenize(text: &str, context: &ParseContext) -> Result<Vec<Spanned>, SyntaxError> {
    let mut tokens = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        let pos = char_offset(text, rest);
        let Some(c) = rest.chars().next() else {
            break;
        };
        if c.is_ascii_digit() || c == '.' {
            let (remaining, literal) = number_literal(rest)
                .map_err(|_| SyntaxError::new(text, pos, "malformed number"))?;
            let value = literal
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    SyntaxError::new(text, pos, format!("number '{}' is out of range", literal))
                })?;
            tokens.push(Spanned {
                token: Token::Number(value),
                pos,
            });
            rest = remaining;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let (remaining, word) = identifier(rest)
                .map_err(|_| SyntaxError::new(text, pos, "malformed identifier"))?;
            resolve_identifier(text, word, pos, context, &mut tokens)?;
            rest = remaining;
        } else {
            let (token, len) = match c {
                '+' => (Token::Plus, 1),
                '-' => (Token::Minus, 1),
                '*' if rest.starts_with("**") => (Token::Caret, 2),
                '*' => (Token::Star, 1),
                '/' => (Token::Slash, 1),
                '^' => (Token::Caret, 1),
                '(' => (Token::LParen, 1),
                ')' => (Token::RParen, 1),
                _ => {
                    return Err(SyntaxError::new(
                        text,
                        pos,
                        format!("unexpected character '{}'", c),
                    ));
                }
            };
            tokens.push(Spanned { token, pos });
            rest = &rest[len..];
        }
    }
    Ok(tokens)
}

fn known_name(name: &str, context: &ParseContext) -> Option<Token> {
    match context.lookup(name) {
        Some(Symbol::Variable(var)) => Some(Token::Var(var.clone())),
        Some(Symbol::Constant(constant)) => Some(Token::Const(*constant)),
        None => ElemFn::from_str(name).ok().map(Token::Func),
    }
}

/// Turns one identifier into tokens: the whole word if it is known, otherwise the
/// longest known names from left to right, with digit runs read as numeric factors.
fn resolve_identifier(
    text: &str,
    word: &str,
    pos: usize,
    context: &ParseContext,
    tokens: &mut Vec<Spanned>,
) -> Result<(), SyntaxError> {
    if let Some(token) = known_name(word, context) {
        tokens.push(Spanned { token, pos });
        return Ok(());
    }
    let mut offset = 0;
    while offset < word.len() {
        let rest = &word[offset..];
        let longest = (1..=rest.len())
            .rev()
            .find_map(|end| known_name(&rest[..end], context).map(|token| (end, token)));
        if let Some((len, token)) = longest {
            tokens.push(Spanned {
                token,
                pos: pos + offset,
            });
            offset += len;
            continue;
        }
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return Err(SyntaxError::new(
                text,
                pos,
                format!("unknown symbol '{}'", word),
            ));
        }
        let value = rest[..digits]
            .parse::<f64>()
            .map_err(|_| SyntaxError::new(text, pos + offset, "malformed number"))?;
        tokens.push(Spanned {
            token: Token::Number(value),
            pos: pos + offset,
        });
        offset += digits;
    }
    Ok(())
}

//___________________________________PARSER____________________________________

struct ExprParser<'a> {
    text: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn previous(&self) -> Option<&Token> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        let position = self
            .tokens
            .get(self.pos)
            .map(|s| s.pos)
            .unwrap_or_else(|| self.text.chars().count());
        SyntaxError::new(self.text, position, message)
    }

    fn expect_closing_bracket(&mut self) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(Token::RParen) => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.error(format!("expected ')' but found {}", token))),
            None => Err(self.error("missing ')'")),
        }
    }

    /// true when the next token starts an operand glued to the previous one
    fn implicit_product_follows(&self) -> bool {
        match self.peek() {
            Some(Token::Var(_) | Token::Const(_) | Token::Func(_) | Token::LParen) => true,
            Some(Token::Number(_)) => matches!(
                self.previous(),
                Some(Token::RParen | Token::Var(_) | Token::Const(_))
            ),
            _ => false,
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    let rhs = self.parse_product()?;
                    lhs = Expr::Add(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Minus) => {
                    self.advance();
                    let rhs = self.parse_product()?;
                    lhs = Expr::Sub(lhs.boxed(), rhs.boxed());
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_product(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Mul(lhs.boxed(), rhs.boxed());
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Div(lhs.boxed(), rhs.boxed());
                }
                _ if self.implicit_product_follows() => {
                    let rhs = self.parse_power()?;
                    lhs = Expr::Mul(lhs.boxed(), rhs.boxed());
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let operand = self.parse_unary()?;
                Ok(match operand {
                    Expr::Const(v) => Expr::Const(-v),
                    other => -other,
                })
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_primary()?;
        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(Expr::Pow(base.boxed(), exponent.boxed()));
        }
        Ok(base)
    }

    /// argument of a function written without brackets: the run of implicitly
    /// multiplied factors up to the next operator or function name, so `sin 2x1`
    /// is `sin(2*x1)` and `sin x1 cos x2` is `sin(x1)*cos(x2)`
    fn parse_bare_argument(&mut self) -> Result<Expr, SyntaxError> {
        let mut arg = self.parse_power()?;
        while self.implicit_product_follows() && !matches!(self.peek(), Some(Token::Func(_))) {
            let rhs = self.parse_power()?;
            arg = Expr::Mul(arg.boxed(), rhs.boxed());
        }
        Ok(arg)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error("unexpected end of expression"));
        };
        match token {
            Token::Number(v) => {
                self.advance();
                Ok(Expr::Const(v))
            }
            Token::Var(name) => {
                self.advance();
                Ok(Expr::Var(name))
            }
            Token::Const(constant) => {
                self.advance();
                Ok(Expr::NamedConst(constant))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_sum()?;
                self.expect_closing_bracket()?;
                Ok(inner)
            }
            Token::Func(func) => {
                self.advance();
                let arg = match self.peek() {
                    Some(Token::LParen) => {
                        self.advance();
                        let inner = self.parse_sum()?;
                        self.expect_closing_bracket()?;
                        inner
                    }
                    Some(Token::Number(_) | Token::Var(_) | Token::Const(_) | Token::Func(_)) => {
                        self.parse_bare_argument()?
                    }
                    _ => return Err(self.error(format!("missing argument of '{}'", func))),
                };
                Ok(Expr::Func(func, arg.boxed()))
            }
            other => Err(self.error(format!("unexpected {}", other))),
        }
    }
}
