use std::env;
use std::path::Path;
use std::process;

use hannac::error::HannaError;
use hannac::frontend::diagnostic::render_error;
use hannac::frontend::lexer::Lexer;
use hannac::frontend::parser::Parser;
use hannac::frontend::source::SourceFile;
use hannac::jit::Jit;
use hannac::runtime::executor::Executor;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!(
        "\
Hannac compiler/interpreter ({VERSION})

Usage:
  hannac <file.hanna> [options]

Options:
  -v, --verbose  Raise the verbosity level (can be repeated)
  -h, --help     Show this help message
  --version      Print the version
"
    );
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        println!("No hanna file provided.");
        process::exit(0);
    }

    let mut filename: Option<String> = None;
    let mut verbosity: u8 = 0;
    for arg in &args {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = verbosity.saturating_add(1),
            "-h" | "--help" => {
                print_help();
                process::exit(0);
            }
            "--version" => {
                println!("{VERSION}");
                process::exit(0);
            }
            other if !other.starts_with('-') => filename = Some(other.to_string()),
            other => {
                println!("Unknown argument: {other}");
                process::exit(0);
            }
        }
    }

    let Some(filename) = filename else {
        println!("No hanna file provided.");
        process::exit(0);
    };

    println!("Compiling: {filename}");
    if let Err((err, source)) = run_file(&filename, verbosity) {
        eprintln!("{}", render_error(&err, source.as_deref(), &filename));
    }
    process::exit(1);
}

fn run_file(path: &str, verbosity: u8) -> Result<(), (HannaError, Option<String>)> {
    let source = SourceFile::open(Path::new(path)).map_err(|err| (err, None))?;

    let mut parser = Parser::new(Lexer::new(source.text.as_str()));
    let program = parser
        .parse_program()
        .map_err(|err| (err, Some(source.text.clone())))?;

    if verbosity > 1 {
        for method in program.methods.values() {
            println!("Produced method definition: {}", method.decl);
        }
    }

    let mut jit = Jit::new(verbosity).map_err(|err| (err, None))?;
    if verbosity > 1 {
        println!("Jit target: {}", jit.host.triple());
    }

    jit.registry.load_definitions(program.methods);
    Executor::new(program.toplevel)
        .run(&mut jit)
        .map_err(|err| (err, Some(source.text.clone())))?;

    Ok(())
}
