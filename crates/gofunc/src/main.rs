//! gofunc CLI - Go function context from the command line.
//!
//! Extracts a Go function together with the declarations of its parameter
//! and result types and the signatures of the functions it calls, and
//! renders them as a prompt.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// gofunc: Go function context extraction.
#[derive(Parser)]
#[command(name = "gofunc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory to search (defaults to current directory)
    #[arg(short = 'C', long = "dir", global = true)]
    dir: Option<PathBuf>,

    /// Configuration file (defaults to .gofunc.yaml in the search directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a function and render its context
    Extract {
        /// Function name, or `Receiver.Method` for pointer-receiver methods
        name: String,

        /// Print the bundle as JSON instead of rendering a template
        #[arg(long, conflicts_with = "template")]
        json: bool,

        /// Tera template to render with
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Module cache root
        #[arg(long, env = "GOMODCACHE")]
        modcache: Option<PathBuf>,
    },

    /// Show the directory an import path resolves to
    Resolve {
        /// Import path (e.g. "github.com/acme/widgets/v2/render")
        import_path: String,

        /// Module cache root
        #[arg(long, env = "GOMODCACHE")]
        modcache: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let dir = match cli.dir {
        Some(d) => d,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let result = match cli.command {
        Commands::Extract {
            name,
            json,
            template,
            modcache,
        } => cli::load_config(&dir, cli.config.as_deref(), modcache, template)
            .and_then(|config| cli::extract::run(&dir, &name, &config, json)),
        Commands::Resolve {
            import_path,
            modcache,
        } => cli::load_config(&dir, cli.config.as_deref(), modcache, None)
            .and_then(|config| cli::resolve::run(&dir, &import_path, &config)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}
