use super::callable::Function;
use super::parser::SyntaxError;
use super::value::Value;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BinaryOp {
    #[strum(serialize = "||")]
    Or,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Remainder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum UnaryOp {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "-")]
    Negate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Number(f64),
    /// String literal text; `#{name}` spans are substituted when evaluated.
    Str(String),
    Boolean(bool),
    /// Produced where no expression could be parsed.
    Nil,
    Array(Vec<Expression>),
    Variable(String),
    Grouping(Box<Expression>),
    Unary {
        operator: UnaryOp,
        right: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
}

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

impl Expression {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Expression, T>) -> T {
        v.visit(self)
    }
}

#[derive(Debug)]
pub enum Statement {
    /// Both `let name = value` and bare `name = value`.
    Assign {
        name: String,
        value: Expression,
    },
    Function(Rc<Function>),
    Puts(Expression),
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    For {
        variable: String,
        start: Expression,
        end: Expression,
        body: Vec<Statement>,
    },
    Return(Expression),
    Expression(Expression),
    /// A statement whose block header could not be parsed. Executing it halts
    /// the program.
    Malformed(SyntaxError),
}

impl Statement {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Statement, T>) -> T {
        v.visit(self)
    }
}

/// Renders a parsed program as s-expressions, one statement per line.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn print(&mut self, statements: &[Statement]) -> String {
        statements
            .iter()
            .map(|stmt| self.statement(stmt))
            .collect::<Vec<String>>()
            .join("\n")
    }
    fn expression(&mut self, expr: &Expression) -> String {
        expr.accept(self)
    }
    fn statement(&mut self, stmt: &Statement) -> String {
        stmt.accept(self)
    }
    fn parenthesize(&mut self, name: &str, args: Vec<&Expression>) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(&self.expression(arg));
        }
        x.push(')');
        x
    }
    fn block(&mut self, statements: &[Statement]) -> String {
        let mut x = String::from("(block");
        for stmt in statements {
            x.push(' ');
            x.push_str(&self.statement(stmt));
        }
        x.push(')');
        x
    }
}

impl Visitor<Expression, String> for AstPrinter {
    fn visit(&mut self, n: &Expression) -> String {
        match n {
            Expression::Number(x) => Value::Number(*x).to_string(),
            Expression::Str(x) => format!("{:?}", x),
            Expression::Boolean(x) => x.to_string(),
            Expression::Nil => String::from("nil"),
            Expression::Array(items) => self.parenthesize("array", items.iter().collect()),
            Expression::Variable(x) => x.clone(),
            Expression::Grouping(x) => self.parenthesize("group", vec![&**x]),
            Expression::Unary { operator, right } => {
                self.parenthesize(&operator.to_string(), vec![&**right])
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => self.parenthesize(&operator.to_string(), vec![&**left, &**right]),
            Expression::Call { callee, arguments } => {
                let mut args: Vec<&Expression> = vec![&**callee];
                args.extend(arguments.iter());
                self.parenthesize("call", args)
            }
            Expression::Index { object, index } => {
                self.parenthesize("index", vec![&**object, &**index])
            }
        }
    }
}

impl Visitor<Statement, String> for AstPrinter {
    fn visit(&mut self, n: &Statement) -> String {
        match n {
            Statement::Assign { name, value } => {
                format!("(assign {} {})", name, self.expression(value))
            }
            Statement::Function(function) => format!(
                "(fn {} ({}) {})",
                function.name,
                function.params.join(" "),
                self.block(&function.body)
            ),
            Statement::Puts(e) => self.parenthesize("puts", vec![e]),
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut x = format!(
                    "(if {} {}",
                    self.expression(condition),
                    self.block(then_branch)
                );
                if let Some(else_branch) = else_branch {
                    x.push(' ');
                    x.push_str(&self.block(else_branch));
                }
                x.push(')');
                x
            }
            Statement::While { condition, body } => {
                format!("(while {} {})", self.expression(condition), self.block(body))
            }
            Statement::For {
                variable,
                start,
                end,
                body,
            } => format!(
                "(for {} {} {} {})",
                variable,
                self.expression(start),
                self.expression(end),
                self.block(body)
            ),
            Statement::Return(e) => self.parenthesize("return", vec![e]),
            Statement::Expression(e) => self.expression(e),
            Statement::Malformed(err) => format!("(malformed {:?})", err.to_string()),
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use crate::ast::{AstPrinter, BinaryOp, Expression, Statement, UnaryOp};

    #[test]
    fn basic_ast_test() {
        let expression = Expression::Binary {
            left: Box::new(Expression::Unary {
                operator: UnaryOp::Negate,
                right: Box::new(Expression::Number(123.0)),
            }),
            operator: BinaryOp::Multiply,
            right: Box::new(Expression::Grouping(Box::new(Expression::Number(45.67)))),
        };
        let mut visitor = AstPrinter {};
        let printed: String = expression.accept(&mut visitor);
        assert_eq!(printed, "(* (- 123) (group 45.67))");
    }

    #[test]
    fn statements_print_blocks() {
        let program = vec![
            Statement::Assign {
                name: "xs".to_string(),
                value: Expression::Array(vec![
                    Expression::Number(1.0),
                    Expression::Str("a".to_string()),
                ]),
            },
            Statement::If {
                condition: Expression::Variable("xs".to_string()),
                then_branch: vec![Statement::Puts(Expression::Index {
                    object: Box::new(Expression::Variable("xs".to_string())),
                    index: Box::new(Expression::Number(0.0)),
                })],
                else_branch: Some(vec![]),
            },
        ];
        let mut printer = AstPrinter {};
        assert_eq!(
            printer.print(&program),
            "(assign xs (array 1 \"a\"))\n(if xs (block (puts (index xs 0))) (block))"
        );
    }
}
