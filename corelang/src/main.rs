//! Core interpreter CLI

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use corelang::error::report_error;
use corelang::{CompileError, Interpreter, RunConfig, RuntimeError};

#[derive(Parser)]
#[command(name = "corelang", version, about = "Interpreter for the Core language")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check and run a Core program
    Run {
        /// Source file to run
        file: PathBuf,
        /// Whitespace-separated integers consumed by `in`
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// TOML run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Hide `gc:N` lines
        #[arg(long)]
        no_gc: bool,
        /// Deepest procedure nesting allowed
        #[arg(long)]
        max_call_depth: Option<usize>,
        /// Largest array a single allocation may request
        #[arg(long)]
        max_array_len: Option<usize>,
    },
    /// Check a Core source file without running it
    Check {
        /// Source file to check
        file: PathBuf,
    },
    /// Parse and dump AST as JSON (debug)
    Parse {
        /// Source file to parse
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Source file to tokenize
        file: PathBuf,
    },
}

enum Failure {
    /// A compile error together with the text it points into
    Compile {
        filename: String,
        source: String,
        error: CompileError,
    },
    /// The program started but stopped on a runtime error
    Runtime(RuntimeError),
}

type CliResult = Result<(), Failure>;

fn main() -> ExitCode {
    corelang::init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            file,
            input,
            config,
            no_gc,
            max_call_depth,
            max_array_len,
        } => run_file(
            &file,
            input.as_deref(),
            config.as_deref(),
            no_gc,
            max_call_depth,
            max_array_len,
        ),
        Command::Check { file } => check_file(&file),
        Command::Parse { file } => parse_file(&file),
        Command::Tokens { file } => tokenize_file(&file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Compile {
            filename,
            source,
            error,
        }) => {
            if report_error(&filename, &source, &error).is_err() {
                eprintln!("Error: {error}");
            }
            ExitCode::FAILURE
        }
        Err(Failure::Runtime(error)) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn read_source(path: &Path) -> Result<(String, String), Failure> {
    let filename = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(source) => Ok((filename, source)),
        Err(e) => Err(Failure::Compile {
            error: CompileError::io_error(format!("cannot read {filename}: {e}")),
            filename,
            source: String::new(),
        }),
    }
}

/// Attach file context to a compile result
fn in_file<T>(filename: &str, source: &str, result: corelang::Result<T>) -> Result<T, Failure> {
    result.map_err(|error| Failure::Compile {
        filename: filename.to_string(),
        source: source.to_string(),
        error,
    })
}

fn run_file(
    path: &Path,
    input: Option<&Path>,
    config: Option<&Path>,
    no_gc: bool,
    max_call_depth: Option<usize>,
    max_array_len: Option<usize>,
) -> CliResult {
    let mut run_config = match config {
        Some(config_path) => in_file(
            &config_path.display().to_string(),
            "",
            RunConfig::load(config_path),
        )?,
        None => RunConfig::default(),
    };
    if no_gc {
        run_config = run_config.show_gc(false);
    }
    if let Some(depth) = max_call_depth {
        run_config = run_config.max_call_depth(depth);
    }
    if let Some(len) = max_array_len {
        run_config = run_config.max_array_len(len);
    }

    let values = match input {
        Some(input_path) => {
            let (input_name, input_source) = read_source(input_path)?;
            in_file(&input_name, &input_source, corelang::lexer::parse_input(&input_source))?
        }
        None => Vec::new(),
    };

    let (filename, source) = read_source(path)?;
    let program = in_file(&filename, &source, corelang::compile(&source))?;

    let show_gc = run_config.show_gc;
    let mut interp = Interpreter::with_config(run_config).with_input(values);
    let outcome = interp.run(&program);

    // Events recorded before a failure are still printed
    print!("{}", interp.transcript().render(show_gc));
    outcome.map_err(Failure::Runtime)
}

fn check_file(path: &Path) -> CliResult {
    let (filename, source) = read_source(path)?;
    in_file(&filename, &source, corelang::compile(&source))?;
    println!("✓ {filename} checks successfully");
    Ok(())
}

fn parse_file(path: &Path) -> CliResult {
    let (filename, source) = read_source(path)?;
    let ast = in_file(&filename, &source, corelang::parser::parse_source(&source))?;

    let json = serde_json::to_string_pretty(&ast)
        .map_err(|e| CompileError::io_error(format!("cannot serialize AST: {e}")));
    println!("{}", in_file(&filename, &source, json)?);
    Ok(())
}

fn tokenize_file(path: &Path) -> CliResult {
    let (filename, source) = read_source(path)?;

    let tokens = in_file(&filename, &source, corelang::lexer::tokenize(&source))?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}
