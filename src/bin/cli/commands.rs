//! Command implementations for the CLI tool.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tarstream::{StreamConfig, TarStream};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{CreateReport, SizeReport, create_formatter};
use crate::progress::ByteProgress;

/// Configuration for the create command.
pub struct CreateConfig<'a> {
    pub source: &'a Path,
    pub output: Option<&'a Path>,
    pub buffer_length: usize,
    pub deterministic: bool,
    pub follow_links: bool,
    pub format: OutputFormat,
    pub quiet: bool,
    pub interrupted: &'a AtomicBool,
}

/// Create command implementation
pub fn create(config: &CreateConfig<'_>) -> ExitCode {
    let stream_config = if config.deterministic {
        StreamConfig::deterministic()
    } else {
        StreamConfig::new()
    }
    .buffer_size(config.buffer_length)
    .follow_links(config.follow_links);

    let mut stream = match TarStream::from_path(config.source, stream_config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let mut out: Box<dyn Write> = match config.output {
        Some(path) => match File::create(path) {
            Ok(f) => Box::new(BufWriter::new(f)),
            Err(e) => {
                eprintln!("Error creating {}: {}", path.display(), e);
                return ExitCode::IoError;
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    // The archive itself may be on stdout, so the bar only goes to a file
    let progress = ByteProgress::new(stream.tell(), config.quiet || config.output.is_none());
    progress.set_message(config.source.display().to_string());

    let outcome = pump(&mut stream, out.as_mut(), &progress, config.interrupted);
    stream.close();
    drop(out);

    match outcome {
        Ok(bytes_written) => {
            progress.finish();
            let report = CreateReport {
                source: config.source,
                output: config.output,
                entries: stream.entry_count(),
                bytes_written,
            };
            let text = create_formatter(config.format).format_create_result(&report);
            if config.output.is_some() {
                if !config.quiet || config.format == OutputFormat::Json {
                    println!("{}", text.trim_end());
                }
            } else if !config.quiet {
                eprintln!("{}", text.trim_end());
            }
            ExitCode::Success
        }
        Err(e) => {
            progress.abandon_with_message("Failed");
            let code = error_to_exit_code(&e);
            if code != ExitCode::UserInterrupt {
                eprintln!("Error: {}", e);
            }
            // Don't leave a truncated archive behind
            if let Some(path) = config.output {
                let _ = std::fs::remove_file(path);
            }
            code
        }
    }
}

/// Moves every chunk from `stream` into `out`, stopping early on Ctrl+C.
fn pump(
    stream: &mut TarStream,
    out: &mut dyn Write,
    progress: &ByteProgress,
    interrupted: &AtomicBool,
) -> tarstream::Result<u64> {
    let mut written = 0u64;
    loop {
        if interrupted.load(Ordering::SeqCst) {
            eprintln!("\nInterrupted after {} of {} bytes", written, stream.tell());
            return Err(io::Error::from(io::ErrorKind::Interrupted).into());
        }

        let chunk = stream.next_chunk()?;
        if chunk.is_empty() {
            break;
        }
        out.write_all(&chunk)?;
        written += chunk.len() as u64;
        progress.inc(chunk.len() as u64);
    }
    out.flush()?;
    Ok(written)
}

/// Size command implementation
pub fn size(source: &Path, follow_links: bool, format: OutputFormat) -> ExitCode {
    let config = StreamConfig::new().follow_links(follow_links);
    let stream = match TarStream::from_path(source, config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let report = SizeReport {
        source,
        entries: stream.entry_count(),
        total_size: stream.tell(),
    };
    print!("{}", create_formatter(format).format_size(&report));
    if format == OutputFormat::Json {
        println!();
    }

    ExitCode::Success
}
