use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use palc::Parser;
use tracing_subscriber::EnvFilter;

use dust::driver::{self, CompileOptions, Session, SessionOptions, DEFAULT_OUTPUT};
use dust::source::{LineSource, StdinLines};

#[derive(Parser)]
#[command(name = "dust", after_long_help = "Without an input file, reads constructs interactively from stdin.")]
struct Cli {
    /// Source file to compile
    input: Option<PathBuf>,
    /// Object file to write
    output: Option<PathBuf>,
    /// Also write the object as WebAssembly text
    #[arg(long)]
    emit_wat: bool,
    /// Disable the optimization passes
    #[arg(long)]
    no_opt: bool,
    /// Print the IR of every lowered construct
    #[arg(long)]
    print_ir: bool,
    /// Log pipeline stages to stderr
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.input {
        Some(input) => {
            let output = cli.output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
            let options = CompileOptions {
                optimize: !cli.no_opt,
                print_ir: cli.print_ir,
                emit_wat: cli.emit_wat,
                ..CompileOptions::default()
            };
            driver::compile_file(&input, &output, options)
                .with_context(|| format!("failed to compile {}", input.display()))?;
        }
        None => {
            let source = LineSource::new(StdinLines::new(), io::stderr());
            let options = SessionOptions { optimize: !cli.no_opt, echo_ir: true };
            Session::new(source, options).run().context("session aborted")?;
        }
    }
    Ok(())
}
