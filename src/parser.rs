//! Parser for npcli expressions
//!
//! Converts tokens into a Program (sequence of statements) by recursive
//! descent, one function per precedence level. Precedence, lowest first:
//! `or`, `and`, `not`, comparisons, `|`, `&`, `+ -`, `* / // %`,
//! unary `- + ~`, `**`, then calls, subscripts and attributes.

use crate::ast::{BinOp, BoolOp, Expr, IndexExpr, Program, Stmt, UnaryOp};
use crate::lexer::{Operator, Token};
use thiserror::Error;

/// Words with syntactic meaning that cannot be assigned to
const KEYWORDS: &[&str] = &["and", "or", "not", "True", "False", "None"];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token: {0:?}")]
    UnexpectedToken(Token),
    #[error("Expected {expected}, got {got:?}")]
    Expected { expected: &'static str, got: Token },
    #[error("Cannot assign to keyword '{0}'")]
    KeywordAssignment(String),
    #[error("Empty input")]
    EmptyInput,
}

/// Parser state
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Consume and return the current token
    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check if we're at the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consume the current token if it equals `expected`
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        match self.advance() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(ParseError::Expected { expected: what, got: t }),
            None => Err(ParseError::UnexpectedEof),
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(Token::Ident(s)) if s == word => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn skip_separators(&mut self) {
        while self.eat(&Token::Separator) {}
    }

    /// Parse the entire input into a Program
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        self.skip_separators();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
            if !self.is_at_end() {
                self.expect(Token::Separator, "';' or newline")?;
            }
            self.skip_separators();
        }

        if statements.is_empty() {
            return Err(ParseError::EmptyInput);
        }

        Ok(Program::new(statements))
    }

    /// `name = expr` or a bare expression
    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        if let (Some(Token::Ident(name)), Some(Token::Assign)) = (self.peek(), self.peek_at(1)) {
            let name = name.clone();
            if KEYWORDS.contains(&name.as_str()) {
                return Err(ParseError::KeywordAssignment(name));
            }
            self.pos += 2;
            let value = self.parse_expr()?;
            return Ok(Stmt::Assign { name, value });
        }
        Ok(Stmt::Expr(self.parse_expr()?))
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("or") {
            let right = self.parse_and()?;
            left = Expr::Logical { op: BoolOp::Or, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("and") {
            let right = self.parse_not()?;
            left = Expr::Logical { op: BoolOp::And, left: Box::new(left), right: Box::new(right) };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.eat_keyword("not") {
            let operand = self.parse_not()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(Operator::Eq)) => BinOp::Eq,
                Some(Token::Operator(Operator::Ne)) => BinOp::Ne,
                Some(Token::Operator(Operator::Lt)) => BinOp::Lt,
                Some(Token::Operator(Operator::Le)) => BinOp::Le,
                Some(Token::Operator(Operator::Gt)) => BinOp::Gt,
                Some(Token::Operator(Operator::Ge)) => BinOp::Ge,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_bitor()?;
            left = binary(op, left, right);
        }
    }

    fn parse_bitor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_bitand()?;
        while self.eat(&Token::Operator(Operator::Bar)) {
            let right = self.parse_bitand()?;
            left = binary(BinOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;
        while self.eat(&Token::Operator(Operator::Amp)) {
            let right = self.parse_additive()?;
            left = binary(BinOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(Operator::Plus)) => BinOp::Add,
                Some(Token::Operator(Operator::Minus)) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Operator(Operator::Star)) => BinOp::Mul,
                Some(Token::Operator(Operator::Slash)) => BinOp::Div,
                Some(Token::Operator(Operator::FloorDiv)) => BinOp::FloorDiv,
                Some(Token::Operator(Operator::Percent)) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Some(Token::Operator(Operator::Minus)) => UnaryOp::Neg,
            Some(Token::Operator(Operator::Plus)) => UnaryOp::Pos,
            Some(Token::Operator(Operator::Tilde)) => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        self.pos += 1;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary { op, operand: Box::new(operand) })
    }

    /// `**` is right-associative and binds tighter than a unary minus on its left
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.eat(&Token::Operator(Operator::Power)) {
            let exponent = self.parse_unary()?;
            return Ok(binary(BinOp::Pow, base, exponent));
        }
        Ok(base)
    }

    /// Calls, subscripts and attribute access
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let args = self.parse_sequence(Token::RParen)?;
                    expr = Expr::Call { func: Box::new(expr), args };
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.parse_subscript()?;
                    expr = Expr::Index { value: Box::new(expr), index };
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.advance() {
                        Some(Token::Ident(name)) => {
                            expr = Expr::Attribute { value: Box::new(expr), name };
                        }
                        Some(t) => {
                            return Err(ParseError::Expected { expected: "attribute name", got: t })
                        }
                        None => return Err(ParseError::UnexpectedEof),
                    }
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        let token = self.advance().ok_or(ParseError::UnexpectedEof)?;

        match token {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::Ident(name) => Ok(match name.as_str() {
                "True" => Expr::Bool(true),
                "False" => Expr::Bool(false),
                "None" => Expr::None,
                _ => Expr::Name(name),
            }),
            Token::LParen => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.parse_sequence(Token::RBracket)?)),
            other => Err(ParseError::UnexpectedToken(other)),
        }
    }

    /// Comma-separated expressions up to `close`, trailing comma allowed
    fn parse_sequence(&mut self, close: Token) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        loop {
            if self.eat(&close) {
                return Ok(items);
            }
            items.push(self.parse_expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close, "',' or closing bracket")?;
                return Ok(items);
            }
        }
    }

    /// Everything between `[` and `]` after a value
    fn parse_subscript(&mut self) -> Result<Vec<IndexExpr>, ParseError> {
        let mut parts = vec![self.parse_index_item()?];
        while self.eat(&Token::Comma) {
            parts.push(self.parse_index_item()?);
        }
        self.expect(Token::RBracket, "']'")?;
        Ok(parts)
    }

    fn at_slice_boundary(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Colon) | Some(Token::Comma) | Some(Token::RBracket)
        )
    }

    fn parse_index_item(&mut self) -> Result<IndexExpr, ParseError> {
        let start = if self.at_slice_boundary() { None } else { Some(self.parse_expr()?) };

        if !self.eat(&Token::Colon) {
            return start.map(IndexExpr::Single).ok_or(ParseError::Expected {
                expected: "index",
                got: self.peek().cloned().unwrap_or(Token::RBracket),
            });
        }

        let stop = if self.at_slice_boundary() { None } else { Some(self.parse_expr()?) };
        let step = if self.eat(&Token::Colon) && !self.at_slice_boundary() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(IndexExpr::Slice { start, stop, step })
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
}

/// Parse tokens into a Program
pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse_one(input: &str) -> Expr {
        let program = parse(lex(input).unwrap()).unwrap();
        match program.statements.into_iter().last().unwrap() {
            Stmt::Expr(e) => e,
            other => panic!("expected expression, got {:?}", other),
        }
    }

    #[test]
    fn parse_precedence() {
        // d + 2 * 3 groups the multiplication first
        assert_eq!(
            parse_one("d + 2 * 3"),
            binary(
                BinOp::Add,
                Expr::Name("d".into()),
                binary(BinOp::Mul, Expr::Number(2.0), Expr::Number(3.0)),
            )
        );
    }

    #[test]
    fn parse_power_binds_tighter_than_neg() {
        assert_eq!(
            parse_one("-2 ** 2"),
            Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(binary(BinOp::Pow, Expr::Number(2.0), Expr::Number(2.0))),
            }
        );
    }

    #[test]
    fn parse_power_right_assoc() {
        assert_eq!(
            parse_one("2 ** 3 ** 2"),
            binary(
                BinOp::Pow,
                Expr::Number(2.0),
                binary(BinOp::Pow, Expr::Number(3.0), Expr::Number(2.0)),
            )
        );
    }

    #[test]
    fn parse_method_call() {
        assert_eq!(
            parse_one("np.sum(d)"),
            Expr::Call {
                func: Box::new(Expr::Attribute {
                    value: Box::new(Expr::Name("np".into())),
                    name: "sum".into(),
                }),
                args: vec![Expr::Name("d".into())],
            }
        );
    }

    #[test]
    fn parse_slices() {
        let expr = parse_one("d[1:, ::2]");
        let Expr::Index { index, .. } = expr else { panic!("expected index") };
        assert_eq!(
            index,
            vec![
                IndexExpr::Slice { start: Some(Expr::Number(1.0)), stop: None, step: None },
                IndexExpr::Slice { start: None, stop: None, step: Some(Expr::Number(2.0)) },
            ]
        );
    }

    #[test]
    fn parse_mask_index() {
        let expr = parse_one("d[d > 2]");
        let Expr::Index { index, .. } = expr else { panic!("expected an index, got {:?}", expr) };
        assert!(matches!(index[0], IndexExpr::Single(Expr::Binary { op: BinOp::Gt, .. })));
    }

    #[test]
    fn parse_assignment_then_expression() {
        let program = parse(lex("x = d * 2; x + 1").unwrap()).unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(&program.statements[0], Stmt::Assign { name, .. } if name == "x"));
    }

    #[test]
    fn parse_keywords() {
        assert_eq!(
            parse_one("not True or False"),
            Expr::Logical {
                op: BoolOp::Or,
                left: Box::new(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(Expr::Bool(true)),
                }),
                right: Box::new(Expr::Bool(false)),
            }
        );
    }

    #[test]
    fn parse_list_trailing_comma() {
        assert_eq!(
            parse_one("[1, 2,]"),
            Expr::List(vec![Expr::Number(1.0), Expr::Number(2.0)])
        );
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(parse(lex("").unwrap()), Err(ParseError::EmptyInput)));
        assert!(matches!(parse(lex("(d").unwrap()), Err(ParseError::UnexpectedEof)));
        assert!(matches!(parse(lex("True = 1").unwrap()), Err(ParseError::KeywordAssignment(_))));
        assert!(matches!(parse(lex("d d").unwrap()), Err(ParseError::Expected { .. })));
    }
}
