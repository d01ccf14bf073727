// Quirinus: runs a script file

use std::fs;
use std::path::Path;
use std::thread;

use quirinus::error::Error;
use quirinus::interpreter::constants::EVALUATOR_STACK_SIZE;
use quirinus::interpreter::{Interpreter, InterpreterConfig};
use tracing_subscriber::EnvFilter;

fn report(err: &Error) {
    eprintln!("{}", err.traceback_string());
    eprintln!(
        "File {}, line {}, column {}",
        err.file, err.span.start.line, err.span.start.column
    );
}

fn run(path: String, source: String) -> bool {
    let mut interpreter = Interpreter::new(InterpreterConfig::new());
    match interpreter.run_source(&path, &source) {
        Ok(_) => true,
        Err(err) => {
            report(&err);
            false
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command-line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        let program_name = args.first().map(|s| s.as_str()).unwrap_or("quirinus");
        eprintln!("Error: No input file provided");
        eprintln!();
        eprintln!("Usage: {} <file>", program_name);
        std::process::exit(1);
    }

    let script = args[1].clone();

    if !Path::new(&script).exists() {
        eprintln!("Error: File '{}' not found", script);
        std::process::exit(1);
    }

    let source = match fs::read_to_string(&script) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Could not read '{}': {}", script, e);
            std::process::exit(1);
        }
    };

    // Deeply nested scripts recurse deeply in the evaluator.
    let worker = thread::Builder::new()
        .name("evaluator".to_string())
        .stack_size(EVALUATOR_STACK_SIZE)
        .spawn(move || run(script, source));

    let succeeded = match worker {
        Ok(handle) => handle.join().unwrap_or(false),
        Err(e) => {
            eprintln!("Error: Could not start the evaluator: {}", e);
            false
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
}
