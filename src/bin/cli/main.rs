//! CLI tool for streaming tar archives.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use exit_codes::ExitCode;

/// Stream files and directories as tar archives
#[derive(Parser)]
#[command(name = "tarstream")]
#[command(author, version, about = "Stream files and directories as tar archives", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a tar archive of a file or directory (alias: c)
    #[command(alias = "c")]
    Create {
        /// File or directory to archive
        source: PathBuf,

        /// Archive file to write (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Chunk size in bytes
        #[arg(long, default_value_t = tarstream::DEFAULT_BUFFER_SIZE, env = "TARSTREAM_BUFFER_LENGTH")]
        buffer_length: usize,

        /// Zero ownership and timestamps for reproducible output
        #[arg(long)]
        deterministic: bool,

        /// Archive the targets of symbolic links instead of the links
        #[arg(short = 'L', long)]
        follow_links: bool,
    },

    /// Print the size of the archive without producing it (alias: s)
    #[command(alias = "s")]
    Size {
        /// File or directory to measure
        source: PathBuf,

        /// Measure with symbolic links followed
        #[arg(short = 'L', long)]
        follow_links: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    // Set up Ctrl+C handler; the create loop polls the flag between chunks
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted");
            std::process::exit(exit_codes::USER_INTERRUPT);
        }
    })
    .ok();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Create {
            source,
            output,
            buffer_length,
            deterministic,
            follow_links,
        } => commands::create(&commands::CreateConfig {
            source: &source,
            output: output.as_deref(),
            buffer_length,
            deterministic,
            follow_links,
            format: cli.format,
            quiet: cli.quiet,
            interrupted: &interrupted,
        }),

        Commands::Size {
            source,
            follow_links,
        } => commands::size(&source, follow_links, cli.format),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
