//! linepump - split a byte stream into delimiter-terminated records.
//!
//! ```text
//! main() -> resolve_config() -> DelimitedReader::split()
//!                                  |               |
//!                                  v               v
//!                   "linepump-<name>" thread    pump(): select! { record, ctrl-c }
//!                      Producer::run()             |
//!                                                  v
//!                                   Finish::{Exhausted, Stop, Fault}
//! ```
//!
//! Records go to stdout, one per line. Logs go to stderr, filtered by
//! `RUST_LOG` (default `warn`).

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use linepump_config::{LinepumpConfig, parse_delimiter};
use linepump_reader::{DelimitedReader, ReadFault, ReaderConfig, RecordStream, TracingSink};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// How long a stop may wait for a producer stuck inside a read.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "linepump")]
#[command(about = "Split a byte stream into delimiter-terminated records")]
struct Cli {
    /// Input file; stdin when omitted or `-`
    file: Option<PathBuf>,
    /// Record delimiter: a single character, an escape (\n \r \t \0 \\) or 0xNN
    #[arg(short, long, value_parser = parse_delimiter_arg)]
    delimiter: Option<u8>,
    /// Maximum number of records buffered between reader and writer
    #[arg(short, long)]
    capacity: Option<usize>,
    /// Reader name used in log output
    #[arg(short, long)]
    name: Option<String>,
    /// Config file to use instead of ~/.linepump/config.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many records
    #[arg(long)]
    limit: Option<u64>,
    /// Print only the number of records
    #[arg(long)]
    count: bool,
}

fn parse_delimiter_arg(raw: &str) -> Result<u8, String> {
    parse_delimiter(raw).map_err(|e| e.to_string())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries records only.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

/// Defaults, then the config file, then `LINEPUMP_*`, then flags.
fn resolve_config(cli: &Cli) -> Result<ReaderConfig> {
    let file = match &cli.config {
        Some(path) => Some(
            LinepumpConfig::load_from(path)?
                .with_context(|| format!("config file {} does not exist", path.display()))?,
        ),
        None => LinepumpConfig::load()?,
    };

    let mut config = LinepumpConfig::resolve(file.as_ref())?;
    if let Some(name) = &cli.name {
        config = config.with_name(name.clone());
    }
    if let Some(delimiter) = cli.delimiter {
        config = config.with_delimiter(delimiter);
    }
    if let Some(capacity) = cli.capacity {
        config = config.try_with_queue_capacity(capacity)?;
    }
    Ok(config)
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read + Send>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        _ => Ok(Box::new(io::stdin())),
    }
}

enum Finish {
    Exhausted,
    Stop,
    Fault(ReadFault),
}

/// Consume `stream` until it ends, the limit is hit, stdout closes, or Ctrl-C.
///
/// Returns the number of records consumed.
async fn pump(stream: &mut RecordStream, cli: &Cli, out: &mut impl Write) -> Result<(u64, Finish)> {
    let mut records: u64 = 0;
    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());

    let finish = loop {
        if cli.limit.is_some_and(|limit| records >= limit) {
            tracing::debug!(records, "limit reached");
            break Finish::Stop;
        }

        tokio::select! {
            next = stream.next_record() => match next {
                Ok(Some(record)) => {
                    records += 1;
                    if cli.count {
                        continue;
                    }
                    if let Err(err) = out.write_all(&record).and_then(|()| out.write_all(b"\n")) {
                        if err.kind() == io::ErrorKind::BrokenPipe {
                            tracing::debug!("stdout closed");
                            break Finish::Stop;
                        }
                        return Err(err).context("failed to write to stdout");
                    }
                }
                Ok(None) => break Finish::Exhausted,
                Err(fault) => break Finish::Fault(fault),
            },
            signal = &mut ctrl_c => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::info!(records, "interrupted");
                break Finish::Stop;
            }
        }
    };

    Ok((records, finish))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = resolve_config(&cli)?;
    let input = open_input(cli.file.as_deref())?;
    let (producer, mut stream) = DelimitedReader::with_config(input, config)
        .with_sink(Arc::new(TracingSink))
        .split();

    // Detached: a read blocked on stdin must not keep the process alive.
    thread::Builder::new()
        .name(format!("linepump-{}", producer.name()))
        .spawn(move || producer.run())
        .context("failed to start reader thread")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let (records, finish) = pump(&mut stream, &cli, &mut out).await?;

    if matches!(finish, Finish::Stop) {
        match tokio::time::timeout(STOP_TIMEOUT, stream.stop()).await {
            Ok(discarded) => tracing::debug!(discarded, "reader stopped"),
            Err(_) => tracing::warn!(
                timeout = ?STOP_TIMEOUT,
                reader = stream.name(),
                "reader is still blocked in a read, exiting without it"
            ),
        }
    }

    if cli.count {
        writeln!(out, "{records}").context("failed to write to stdout")?;
    }
    if let Err(err) = out.flush()
        && err.kind() != io::ErrorKind::BrokenPipe
    {
        return Err(err).context("failed to write to stdout");
    }

    if let Finish::Fault(fault) = finish {
        return Err(fault.into());
    }
    Ok(())
}
