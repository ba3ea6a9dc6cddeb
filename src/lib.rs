pub mod ast;
pub mod callable;
pub mod coercion;
pub mod environment;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use crate::interpreter::{Interpreter, RuntimeError};
use crate::scanner::ScanError;
use std::io::Write;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Scans, parses and runs `source`, writing `puts` output to `output`.
pub fn run<W: Write>(source: &str, output: W) -> Result<(), Error> {
    let tokens = scanner::scan_tokens(source)?;
    let program = parser::parse(&tokens);
    for diagnostic in &program.diagnostics {
        warn!(%diagnostic, "syntax diagnostic");
    }
    let mut interpreter = Interpreter::with_output(output);
    interpreter.interpret(&program.statements)?;
    Ok(())
}
