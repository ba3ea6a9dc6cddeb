use choco::ast::AstPrinter;
use choco::interpreter::{Interpreter, RuntimeError};
use choco::parser::{self, SyntaxError};
use choco::scanner;
use choco::token::Token;
use clap::{crate_version, App, Arg, ArgMatches};
use std::fs;
use std::io::{self, Write};
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let matches = App::new("choco")
        .version(crate_version!())
        .about("Runs a Choco script")
        .arg(
            Arg::with_name("SCRIPT")
                .help("Path to the .choco source file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("tokens")
                .long("tokens")
                .help("Print the token stream instead of running"),
        )
        .arg(
            Arg::with_name("ast")
                .long("ast")
                .help("Print the parsed program instead of running"),
        )
        .arg(
            Arg::with_name("trace")
                .long("trace")
                .help("Log interpreter activity to stderr"),
        )
        .get_matches();

    init_tracing(matches.is_present("trace"));
    process::exit(run_file(&matches));
}

// Only installs a subscriber when asked to, so plain runs stay quiet.
fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("choco=trace")
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        return;
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();
}

fn run_file(matches: &ArgMatches) -> i32 {
    let path = match matches.value_of("SCRIPT") {
        Some(path) => path,
        None => {
            eprintln!("{}", matches.usage());
            return 1;
        }
    };
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(_) => {
            eprintln!("Error: Could not open file {}", path);
            return 1;
        }
    };
    let tokens = match scanner::scan_tokens(&source) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };
    if matches.is_present("tokens") {
        return exit_code(print_tokens(&tokens));
    }

    let program = parser::parse(&tokens);
    report(&program.diagnostics);
    if matches.is_present("ast") {
        let printed = AstPrinter {}.print(&program.statements);
        return exit_code(writeln!(io::stdout().lock(), "{}", printed));
    }

    let mut interpreter = Interpreter::new();
    match interpreter.interpret(&program.statements) {
        // The diagnostic was already reported above.
        Ok(()) | Err(RuntimeError::Halted(_)) => 0,
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

fn report(diagnostics: &[SyntaxError]) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

fn print_tokens(tokens: &[Token]) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for token in tokens {
        writeln!(
            out,
            "{:4} {:<11} {}",
            token.line,
            token.tokentype.kind().to_string(),
            token.lexeme
        )?;
    }
    out.flush()
}

// A reader that hung up early (`| head`) is not a failure.
fn exit_code(result: io::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}
