use super::ast::{BinaryOp, Expression, Statement, UnaryOp};
use super::callable::Function;
use super::token::{Token, TokenType};
use std::mem;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyntaxError {
    #[error("[line {line}] Error: Expected '{{' after {construct}")]
    MissingBlock { line: usize, construct: &'static str },
    #[error("[line {line}] Error: Expected 'in' in for loop")]
    MissingIn { line: usize },
    #[error("[line {line}] Error: Expected '..' in for loop")]
    MissingRange { line: usize },
    #[error("[line {line}] Warning: Unterminated block, no matching '}}' before end of input")]
    UnterminatedBlock { line: usize },
}

/// The parsed statements plus every syntax diagnostic met on the way.
#[derive(Debug)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub diagnostics: Vec<SyntaxError>,
}

static END_OF_INPUT: TokenType = TokenType::EOF;

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    // Exclusive bound of the block extent being parsed; tokens at or past it
    // read as end of input.
    end: usize,
    halted: bool,
    diagnostics: Vec<SyntaxError>,
}

pub fn parse(tokens: &[Token]) -> Program {
    Parser::new(tokens).parse()
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Parser<'a> {
        Parser {
            tokens,
            current: 0,
            end: tokens.len(),
            halted: false,
            diagnostics: Vec::new(),
        }
    }
    pub fn parse(mut self) -> Program {
        let statements = self.statements();
        Program {
            statements,
            diagnostics: self.diagnostics,
        }
    }
    fn statements(&mut self) -> Vec<Statement> {
        let mut statements: Vec<Statement> = Vec::new();
        while !self.is_at_end() && !self.halted {
            if let Some(stmt) = self.statement() {
                statements.push(stmt);
            }
        }
        statements
    }
    fn statement(&mut self) -> Option<Statement> {
        let stmt = match self.peek() {
            TokenType::Let => {
                self.advance();
                self.let_statement()
            }
            TokenType::Fn => {
                self.advance();
                self.function_declaration()
            }
            TokenType::Puts => {
                self.advance();
                let expr = self.expression();
                self.match_token(&TokenType::Semicolon);
                Statement::Puts(expr)
            }
            TokenType::If => {
                self.advance();
                self.if_statement()
            }
            TokenType::While => {
                self.advance();
                self.while_statement()
            }
            TokenType::For => {
                self.advance();
                self.for_statement()
            }
            TokenType::Return => {
                self.advance();
                let expr = self.expression();
                self.match_token(&TokenType::Semicolon);
                Statement::Return(expr)
            }
            TokenType::Identifier(name) if matches!(self.peek_next(), TokenType::Equal) => {
                let name = name.clone();
                self.advance();
                self.advance();
                let value = self.expression();
                self.match_token(&TokenType::Semicolon);
                Statement::Assign { name, value }
            }
            _ => return self.expression_statement(),
        };
        Some(stmt)
    }
    fn let_statement(&mut self) -> Statement {
        if self.is_at_end() {
            return Statement::Expression(Expression::Nil);
        }
        let name = self.advance().lexeme.clone();
        self.match_token(&TokenType::Equal);
        let value = self.expression();
        self.match_token(&TokenType::Semicolon);
        Statement::Assign { name, value }
    }
    fn function_declaration(&mut self) -> Statement {
        let line = self.previous().line;
        if self.is_at_end() {
            return self.malformed(SyntaxError::MissingBlock {
                line,
                construct: "function signature",
            });
        }
        let name = self.advance().lexeme.clone();
        let mut params: Vec<String> = Vec::new();
        if self.match_token(&TokenType::LeftParen) {
            while !self.match_token(&TokenType::RightParen) && !self.is_at_end() {
                params.push(self.advance().lexeme.clone());
                if !self.match_token(&TokenType::Comma) {
                    self.match_token(&TokenType::RightParen);
                    break;
                }
            }
        }
        if !self.match_token(&TokenType::LeftBrace) {
            return self.malformed(SyntaxError::MissingBlock {
                line,
                construct: "function signature",
            });
        }
        let body = self.block();
        Statement::Function(Rc::new(Function::new(name, params, body)))
    }
    fn if_statement(&mut self) -> Statement {
        let line = self.previous().line;
        let condition = self.expression();
        if !self.match_token(&TokenType::LeftBrace) {
            return self.malformed(SyntaxError::MissingBlock {
                line,
                construct: "if condition",
            });
        }
        let then_branch = self.block();
        let else_branch = if !self.halted && self.match_token(&TokenType::Else) {
            if self.match_token(&TokenType::If) {
                Some(vec![self.if_statement()])
            } else if self.match_token(&TokenType::LeftBrace) {
                Some(self.block())
            } else {
                let line = self.previous().line;
                return self.malformed(SyntaxError::MissingBlock {
                    line,
                    construct: "else",
                });
            }
        } else {
            None
        };
        Statement::If {
            condition,
            then_branch,
            else_branch,
        }
    }
    fn while_statement(&mut self) -> Statement {
        let line = self.previous().line;
        let condition = self.expression();
        if !self.match_token(&TokenType::LeftBrace) {
            return self.malformed(SyntaxError::MissingBlock {
                line,
                construct: "while condition",
            });
        }
        let body = self.block();
        Statement::While { condition, body }
    }
    fn for_statement(&mut self) -> Statement {
        let line = self.previous().line;
        let variable = match self.peek() {
            TokenType::EOF => return self.malformed(SyntaxError::MissingIn { line }),
            _ => self.advance().lexeme.clone(),
        };
        if !self.match_token(&TokenType::In) {
            return self.malformed(SyntaxError::MissingIn { line });
        }
        let start = self.expression();
        if !self.match_token(&TokenType::DotDot) {
            return self.malformed(SyntaxError::MissingRange { line });
        }
        let end = self.expression();
        if !self.match_token(&TokenType::LeftBrace) {
            return self.malformed(SyntaxError::MissingBlock {
                line,
                construct: "for range",
            });
        }
        let body = self.block();
        Statement::For {
            variable,
            start,
            end,
            body,
        }
    }
    fn expression_statement(&mut self) -> Option<Statement> {
        let start = self.current;
        let expr = self.expression();
        if self.current == start {
            // Nothing here can start a statement; step over it.
            let skipped = self.advance();
            trace!(line = skipped.line, lexeme = %skipped.lexeme, "skipping stray token");
            return None;
        }
        self.match_token(&TokenType::Semicolon);
        Some(Statement::Expression(expr))
    }
    /// Parses the body of a block whose `{` was just consumed. The extent is
    /// located first by brace depth counting, then parsed within that bound.
    fn block(&mut self) -> Vec<Statement> {
        let opened_on = self.previous().line;
        let close = self.block_extent();
        let limit = match close {
            Some(close) => close,
            None => {
                warn!(line = opened_on, "block runs to end of input");
                self.diagnostics
                    .push(SyntaxError::UnterminatedBlock { line: opened_on });
                self.end
            }
        };
        let outer = mem::replace(&mut self.end, limit);
        let statements = self.statements();
        self.end = outer;
        self.current = match close {
            Some(close) if !self.halted => close + 1,
            _ => self.end,
        };
        statements
    }
    fn block_extent(&self) -> Option<usize> {
        let mut depth = 1;
        for idx in self.current..self.end {
            match self.tokens[idx].tokentype {
                TokenType::LeftBrace => depth += 1,
                TokenType::RightBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                _ => (),
            }
        }
        None
    }
    // Records the error and gives up on the rest of the token stream.
    fn malformed(&mut self, err: SyntaxError) -> Statement {
        debug!(%err, "malformed block header, halting parse");
        self.diagnostics.push(err.clone());
        self.current = self.end;
        self.halted = true;
        Statement::Malformed(err)
    }
    fn expression(&mut self) -> Expression {
        self.or()
    }
    fn or(&mut self) -> Expression {
        let mut expr = self.and();
        while self.match_token(&TokenType::Or) {
            let right = self.and();
            expr = binary(expr, BinaryOp::Or, right);
        }
        expr
    }
    fn and(&mut self) -> Expression {
        let mut expr = self.comparison();
        while self.match_token(&TokenType::And) {
            let right = self.comparison();
            expr = binary(expr, BinaryOp::And, right);
        }
        expr
    }
    fn comparison(&mut self) -> Expression {
        let mut expr = self.term();
        loop {
            let operator = match self.peek() {
                TokenType::EqualEqual => BinaryOp::Equal,
                TokenType::BangEqual => BinaryOp::NotEqual,
                TokenType::Less => BinaryOp::Less,
                TokenType::Greater => BinaryOp::Greater,
                TokenType::LessEqual => BinaryOp::LessEqual,
                TokenType::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.advance();
            let right = self.term();
            expr = binary(expr, operator, right);
        }
        expr
    }
    fn term(&mut self) -> Expression {
        let mut expr = self.factor();
        loop {
            let operator = match self.peek() {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.factor();
            expr = binary(expr, operator, right);
        }
        expr
    }
    fn factor(&mut self) -> Expression {
        let mut expr = self.unary();
        loop {
            let operator = match self.peek() {
                TokenType::Star => BinaryOp::Multiply,
                TokenType::Slash => BinaryOp::Divide,
                TokenType::Percent => BinaryOp::Remainder,
                _ => break,
            };
            self.advance();
            let right = self.unary();
            expr = binary(expr, operator, right);
        }
        expr
    }
    fn unary(&mut self) -> Expression {
        let operator = match self.peek() {
            TokenType::Bang => UnaryOp::Not,
            TokenType::Minus => UnaryOp::Negate,
            _ => return self.postfix(),
        };
        self.advance();
        let right = self.unary();
        Expression::Unary {
            operator,
            right: Box::new(right),
        }
    }
    fn postfix(&mut self) -> Expression {
        let mut expr = self.primary();
        loop {
            if self.match_token(&TokenType::LeftParen) {
                let arguments = self.elements(&TokenType::RightParen);
                expr = Expression::Call {
                    callee: Box::new(expr),
                    arguments,
                };
            } else if self.match_token(&TokenType::LeftBracket) {
                let index = self.expression();
                self.match_token(&TokenType::RightBracket);
                expr = Expression::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        expr
    }
    // Comma separated expressions up to `close`, which has not been consumed yet.
    fn elements(&mut self, close: &TokenType) -> Vec<Expression> {
        let mut items: Vec<Expression> = Vec::new();
        while !self.match_token(close) {
            items.push(self.expression());
            if !self.match_token(&TokenType::Comma) {
                self.match_token(close);
                break;
            }
        }
        items
    }
    fn primary(&mut self) -> Expression {
        let expr = match self.peek() {
            TokenType::Number(n) => Expression::Number(*n),
            TokenType::String(s) => Expression::Str(s.clone()),
            TokenType::True => Expression::Boolean(true),
            TokenType::False => Expression::Boolean(false),
            TokenType::Identifier(name) => Expression::Variable(name.clone()),
            TokenType::LeftBracket => {
                self.advance();
                return Expression::Array(self.elements(&TokenType::RightBracket));
            }
            TokenType::LeftParen => {
                self.advance();
                let expr = self.expression();
                self.match_token(&TokenType::RightParen);
                return Expression::Grouping(Box::new(expr));
            }
            _ => return Expression::Nil,
        };
        self.advance();
        expr
    }
    fn match_token(&mut self, expected: &TokenType) -> bool {
        if mem::discriminant(self.peek()) == mem::discriminant(expected) {
            self.advance();
            true
        } else {
            false
        }
    }
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }
    fn is_at_end(&self) -> bool {
        matches!(self.peek(), TokenType::EOF)
    }
    fn peek(&self) -> &'a TokenType {
        self.token_type_at(self.current)
    }
    fn peek_next(&self) -> &'a TokenType {
        self.token_type_at(self.current + 1)
    }
    fn token_type_at(&self, idx: usize) -> &'a TokenType {
        if idx < self.end {
            if let Some(token) = self.tokens.get(idx) {
                return &token.tokentype;
            }
        }
        &END_OF_INPUT
    }
    fn previous(&self) -> &'a Token {
        let idx = self.current.saturating_sub(1).min(self.tokens.len().saturating_sub(1));
        &self.tokens[idx]
    }
}

fn binary(left: Expression, operator: BinaryOp, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

#[cfg(test)]
mod parser_tests {
    use crate::ast::{AstPrinter, Statement};
    use crate::parser::{parse, Program, SyntaxError};
    use crate::scanner::scan_tokens;

    fn parse_source(source: &str) -> Program {
        parse(&scan_tokens(source).unwrap())
    }

    fn printed(source: &str) -> String {
        let program = parse_source(source);
        assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
        AstPrinter {}.print(&program.statements)
    }

    #[test]
    fn precedence_ladder() {
        assert_eq!(
            printed("puts 1 + 2 * 3 - -4 % 2"),
            "(puts (- (+ 1 (* 2 3)) (% (- 4) 2)))"
        );
        assert_eq!(
            printed("puts a < b == !c && d || e"),
            "(puts (|| (&& (== (< a b) (! c)) d) e))"
        );
    }

    #[test]
    fn let_and_bare_assignment() {
        assert_eq!(
            printed("let x = 1; y = x; let z;"),
            "(assign x 1)\n(assign y x)\n(assign z nil)"
        );
    }

    #[test]
    fn function_declaration_and_calls() {
        assert_eq!(
            printed("fn add(a, b) { return a + b } puts add(1, add(2, 3))[0]"),
            "(fn add (a b) (block (return (+ a b))))\n(puts (index (call add 1 (call add 2 3)) 0))"
        );
    }

    #[test]
    fn nested_blocks_and_else_if() {
        assert_eq!(
            printed("if a { while b { puts 1 } } else if c { puts 2 } else { puts 3 }"),
            "(if a (block (while b (block (puts 1)))) (block (if c (block (puts 2)) (block (puts 3)))))"
        );
    }

    #[test]
    fn for_loop_header() {
        assert_eq!(
            printed("for i in 0..n + 1 { puts i }"),
            "(for i 0 (+ n 1) (block (puts i)))"
        );
    }

    #[test]
    fn arrays_and_strings() {
        assert_eq!(
            printed("let xs = [1, \"two #{x}\", [true]]"),
            "(assign xs (array 1 \"two #{x}\" (array true)))"
        );
    }

    #[test]
    fn stray_tokens_are_skipped() {
        assert_eq!(printed("} ) ; puts 1"), "(puts 1)");
    }

    #[test]
    fn malformed_header_halts_parsing() {
        let program = parse_source("puts 1\nif x puts 2\nputs 3");
        assert_eq!(
            program.diagnostics,
            vec![SyntaxError::MissingBlock {
                line: 2,
                construct: "if condition"
            }]
        );
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[1], Statement::Malformed(_)));
    }

    #[test]
    fn for_header_errors() {
        let program = parse_source("for i 0..3 { }");
        assert_eq!(program.diagnostics, vec![SyntaxError::MissingIn { line: 1 }]);
        let program = parse_source("for i in 3 { }");
        assert_eq!(program.diagnostics, vec![SyntaxError::MissingRange { line: 1 }]);
    }

    #[test]
    fn malformed_inside_function_body() {
        let program = parse_source("fn f() { while true puts 1 }\nf()");
        assert_eq!(program.diagnostics.len(), 1);
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::Function(f) => {
                assert!(matches!(f.body[0], Statement::Malformed(_)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        let program = parse_source("if true {\nputs 1\nputs 2");
        assert_eq!(
            program.diagnostics,
            vec![SyntaxError::UnterminatedBlock { line: 1 }]
        );
        assert_eq!(
            AstPrinter {}.print(&program.statements),
            "(if true (block (puts 1) (puts 2)))"
        );
    }
}
