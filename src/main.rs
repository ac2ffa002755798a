//! Etch compiler - CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use etch::frontend::config::CompilerConfig;
use etch::frontend::{CompileError, Compiler};
use etch::util::logger::{self, LogLevel};
use etch::{read_sources, NAME, VERSION};

/// Compiler front end for the Etch smart-contract language
#[derive(Parser, Debug)]
#[command(name = "etchc")]
#[command(version = VERSION)]
#[command(about = NAME, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Compiler configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse source files and report every syntax error
    Check {
        /// Source files, parsed together as one program
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the syntax tree of a source file
    Tree {
        /// Source file to parse
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print version information
    Version,
}

fn load_config(args: &Args) -> Result<CompilerConfig> {
    let config = match &args.config {
        Some(path) => CompilerConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    Ok(if args.verbose {
        config.with_log_level(LogLevel::Debug)
    } else {
        config
    })
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;
    logger::init_with_level(config.log_level);

    if args.verbose {
        eprintln!("{} version: {}", NAME, VERSION);
        eprintln!("Host: {}", std::env::consts::OS);
    }

    let compiler = Compiler::new(config);
    match args.command {
        Commands::Check { files } => {
            let sources = read_sources(&files)?;
            match compiler.parse(&sources) {
                Ok(_) => {
                    eprintln!("Check passed!");
                    Ok(ExitCode::SUCCESS)
                }
                Err(diagnostics) => {
                    eprint!("{}", diagnostics);
                    eprintln!("{} error(s)", diagnostics.len());
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Tree { file } => {
            let sources = read_sources(std::slice::from_ref(&file))?;
            let tree = compiler
                .parse(&sources)
                .map_err(CompileError::from)
                .with_context(|| format!("Failed to parse: {}", file.display()))?;
            print!("{}", tree);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("{} {}", NAME, VERSION);
            Ok(ExitCode::SUCCESS)
        }
    }
}
