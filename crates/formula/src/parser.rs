use crate::ast::{BinaryOp, Expr, Function, CONSTANTS};
use crate::error::ParseError;
use crate::lexer::{Spanned, Token};

/// Upper bound on nested unary operators, parentheses, and calls.
pub(crate) const MAX_DEPTH: usize = 64;

/// Formulas may spell names with this qualifier, e.g. `math.cos(t)`.
const QUALIFIER: &str = "math.";

/// Recursive-descent parser over the token stream.
///
/// ```text
///   expr    := term (('+' | '-') term)*
///   term    := unary (('*' | '/' | '%') unary)*
///   unary   := ('+' | '-') unary | power
///   power   := primary ('^' unary)?
///   primary := NUMBER | NAME | NAME '(' args ')' | '(' expr ')'
/// ```
pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::Empty);
        }
        let expr = self.expr()?;
        match self.tokens.get(self.pos) {
            None => Ok(expr),
            Some((offset, token)) => Err(ParseError::UnexpectedToken {
                found: token.describe(),
                offset: *offset,
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn next(&mut self) -> Result<Spanned, ParseError> {
        let spanned = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(spanned)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        let (offset, token) = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                found: token.describe(),
                offset,
            })
        }
    }

    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            Err(ParseError::TooDeep { max: MAX_DEPTH })
        } else {
            Ok(())
        }
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.unary()?;
                self.ascend();
                Ok(Expr::Neg(Box::new(inner)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let inner = self.unary()?;
                self.ascend();
                Ok(inner)
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            self.descend()?;
            let exponent = self.unary()?;
            self.ascend();
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let (offset, token) = self.next()?;
        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::LParen => {
                self.descend()?;
                let inner = self.expr()?;
                self.ascend();
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => self.name(name),
            other => Err(ParseError::UnexpectedToken {
                found: other.describe(),
                offset,
            }),
        }
    }

    fn name(&mut self, raw: String) -> Result<Expr, ParseError> {
        let name = raw.strip_prefix(QUALIFIER).unwrap_or(&raw);
        if name.contains('.') {
            return Err(ParseError::UnknownName(raw));
        }
        let is_call = matches!(self.peek(), Some(Token::LParen));

        if let Some(function) = Function::lookup(name) {
            if !is_call {
                return Err(ParseError::MissingCall(function.name().to_string()));
            }
            self.pos += 1;
            self.descend()?;
            let args = self.arguments()?;
            self.ascend();
            let (min, max) = function.arity();
            if args.len() < min || max.is_some_and(|max| args.len() > max) {
                return Err(ParseError::Arity {
                    name: function.name(),
                    expected: function.describe_arity(),
                    found: args.len(),
                });
            }
            return Ok(Expr::Call(function, args));
        }

        let value = if name == "t" {
            Some(Expr::Time)
        } else {
            CONSTANTS
                .iter()
                .find(|(constant, _)| *constant == name)
                .map(|(_, value)| Expr::Number(*value))
        };

        match value {
            Some(_) if is_call => Err(ParseError::NotAFunction(name.to_string())),
            Some(expr) => Ok(expr),
            None => Err(ParseError::UnknownName(raw)),
        }
    }

    /// Parses a comma separated list; the opening parenthesis is already consumed.
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            let (offset, token) = self.next()?;
            match token {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        found: other.describe(),
                        offset,
                    })
                }
            }
        }
    }
}
