use crate::ast::{Expression, Statement, Visitor};
use crate::callable::FunctionTable;
use crate::coercion;
use crate::environment::Environment;
use crate::parser::SyntaxError;
use crate::value::Value;
use std::io::{self, Stdout, Write};
use thiserror::Error;
use tracing::{debug, trace};

/// How a statement finished. `Return` unwinds every enclosing block until the
/// owning call consumes it.
#[derive(Debug, PartialEq)]
pub enum Signal {
    Normal,
    Return(Value),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Halted(SyntaxError),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

pub struct Interpreter<W: Write = Stdout> {
    environment: Environment,
    functions: FunctionTable,
    output: W,
}

impl<W: Write> Visitor<Expression, RuntimeResult<Value>> for Interpreter<W> {
    fn visit(&mut self, expr: &Expression) -> RuntimeResult<Value> {
        let value = match expr {
            Expression::Number(n) => Value::Number(*n),
            Expression::Str(text) => Value::String(self.interpolate(text)),
            Expression::Boolean(b) => Value::Boolean(*b),
            Expression::Nil => Value::Nil,
            Expression::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?);
                }
                Value::Array(values)
            }
            Expression::Variable(name) => {
                // A registered function name evaluates to itself so that a
                // following call operator can resolve it.
                if self.functions.contains(name) {
                    Value::String(name.clone())
                } else {
                    self.environment.get(name)
                }
            }
            Expression::Grouping(inner) => self.evaluate(inner)?,
            Expression::Unary { operator, right } => {
                let value = self.evaluate(right)?;
                coercion::unary(*operator, value)
            }
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let lv = self.evaluate(left)?;
                let rv = self.evaluate(right)?;
                coercion::binary(*operator, lv, rv)
            }
            Expression::Call { callee, arguments } => {
                let callee = self.evaluate(callee)?;
                match callee {
                    Value::String(ref name) if self.functions.contains(name) => {
                        let mut evaluated_arguments: Vec<Value> = Vec::new();
                        for argument in arguments {
                            evaluated_arguments.push(self.evaluate(argument)?);
                        }
                        self.call(name, evaluated_arguments)?
                    }
                    other => {
                        trace!(callee = %other, "value is not callable");
                        other
                    }
                }
            }
            Expression::Index { object, index } => {
                let base = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                coercion::index(base, &index)
            }
        };
        Ok(value)
    }
}

impl<W: Write> Visitor<Statement, RuntimeResult<Signal>> for Interpreter<W> {
    fn visit(&mut self, stmt: &Statement) -> RuntimeResult<Signal> {
        match stmt {
            Statement::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.assign(name, value);
            }
            Statement::Function(function) => {
                debug!(name = %function.name, arity = function.arity(), "registering function");
                self.functions.declare(function.clone());
            }
            Statement::Puts(e) => {
                let value = self.evaluate(e)?;
                writeln!(self.output, "{}", value)?;
            }
            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate(condition)?;
                if coercion::is_truthy(&condition) {
                    return self.execute_block(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.execute_block(else_branch);
                }
            }
            Statement::While { condition, body } => {
                let mut iterations = 0usize;
                while coercion::loop_continues(&self.evaluate(condition)?) {
                    iterations += 1;
                    if let Signal::Return(value) = self.execute_block(body)? {
                        return Ok(Signal::Return(value));
                    }
                }
                trace!(iterations, "while loop finished");
            }
            Statement::For {
                variable,
                start,
                end,
                body,
            } => {
                let start = self.evaluate(start)?;
                let end = self.evaluate(end)?;
                if let (Value::Number(from), Value::Number(to)) = (start, end) {
                    for i in (from.trunc() as i64)..(to.trunc() as i64) {
                        self.environment.assign(variable, Value::Number(i as f64));
                        if let Signal::Return(value) = self.execute_block(body)? {
                            return Ok(Signal::Return(value));
                        }
                    }
                }
            }
            Statement::Return(e) => {
                let value = self.evaluate(e)?;
                return Ok(Signal::Return(value));
            }
            Statement::Expression(e) => {
                self.evaluate(e)?;
            }
            Statement::Malformed(err) => {
                debug!(%err, "reached malformed statement, halting");
                return Err(RuntimeError::Halted(err.clone()));
            }
        }
        Ok(Signal::Normal)
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_output(io::stdout())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// An interpreter whose `puts` output goes to `output`.
    pub fn with_output(output: W) -> Interpreter<W> {
        Interpreter {
            environment: Environment::new(),
            functions: FunctionTable::new(),
            output,
        }
    }
    pub fn into_output(self) -> W {
        self.output
    }
    /// Reads a binding from the global frame.
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.environment.global(name)
    }
    pub fn interpret(&mut self, statements: &[Statement]) -> RuntimeResult<()> {
        let result = self.run_statements(statements);
        self.output.flush()?;
        result
    }
    fn run_statements(&mut self, statements: &[Statement]) -> RuntimeResult<()> {
        for stmt in statements {
            if let Signal::Return(value) = self.execute(stmt)? {
                debug!(%value, "return outside of a function, stopping");
                break;
            }
        }
        Ok(())
    }
    fn evaluate(&mut self, expr: &Expression) -> RuntimeResult<Value> {
        expr.accept(self)
    }
    fn execute(&mut self, stmt: &Statement) -> RuntimeResult<Signal> {
        stmt.accept(self)
    }
    fn execute_block(&mut self, statements: &[Statement]) -> RuntimeResult<Signal> {
        for stmt in statements {
            match self.execute(stmt)? {
                Signal::Normal => (),
                signal => return Ok(signal),
            }
        }
        Ok(Signal::Normal)
    }
    /// Calls a declared function by name. Unknown names yield Nil. Extra
    /// arguments are dropped; missing ones leave the parameter unbound.
    pub fn call(&mut self, name: &str, arguments: Vec<Value>) -> RuntimeResult<Value> {
        let function = match self.functions.get(name) {
            Some(function) => function,
            None => return Ok(Value::Nil),
        };
        self.environment.push_frame();
        trace!(function = name, depth = self.environment.depth(), "call");
        for (param, value) in function.params.iter().zip(arguments) {
            self.environment.define(param, value);
        }
        let result = self.execute_block(&function.body);
        self.environment.pop_frame();
        let value = match result? {
            Signal::Return(value) => value,
            Signal::Normal => Value::Nil,
        };
        trace!(function = name, returned = %value, "return");
        Ok(value)
    }
    // Replaces each `#{name}` with the rendered value of `name`. An opening
    // marker without a closing brace is kept verbatim.
    fn interpolate(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(open) = rest.find("#{") {
            let after = &rest[open + 2..];
            let close = match after.find('}') {
                Some(close) => close,
                None => break,
            };
            result.push_str(&rest[..open]);
            result.push_str(&self.environment.get(&after[..close]).to_string());
            rest = &after[close + 1..];
        }
        result.push_str(rest);
        result
    }
}
