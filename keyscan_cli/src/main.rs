use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use keyscan_cli::config::{AppConfig, ConfigManager};
use keyscan_cli::scan::{KeyMatcher, ScanSummary, count_keys, scan_keys};
use keyscan_core::{
    NullProgress, ProgressMode, ProgressSession, ProgressWriter, StdoutProbe, TerminalProbe,
};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "keyscan")]
#[command(author, version, about = "keyscan - Scan key lists with terminal-aware progress", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file to use instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan newline-delimited keys from a file ("-" reads stdin)
    Scan {
        /// Key file to scan
        input: PathBuf,

        /// Glob patterns a key must match (can be specified multiple times)
        #[arg(short = 'p', long = "pattern", value_name = "PATTERN")]
        patterns: Vec<String>,

        /// Don't count keys up front; progress shows a plain count
        #[arg(long)]
        stream: bool,

        /// Progress rendering mode
        #[arg(long, value_enum, value_name = "MODE")]
        progress: Option<ProgressArg>,

        /// Pause after each key, in milliseconds
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        /// Write matched keys to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key (e.g., progress.mode)
        key: String,
    },

    /// Print the configuration file path
    Path,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ProgressArg {
    Auto,
    Bar,
    Log,
    Json,
    None,
}

impl ProgressArg {
    fn mode(self) -> Option<ProgressMode> {
        match self {
            ProgressArg::Auto => Some(ProgressMode::Auto),
            ProgressArg::Bar => Some(ProgressMode::Bar),
            ProgressArg::Log => Some(ProgressMode::Log),
            ProgressArg::Json => Some(ProgressMode::Json),
            ProgressArg::None => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on debug flag
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("keyscan_core", log::LevelFilter::Debug)
            .filter_module("keyscan_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if !StdoutProbe.is_interactive() {
        colored::control::set_override(false);
    }

    let manager = match cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };

    match cli.command {
        Commands::Scan {
            input,
            patterns,
            stream,
            progress,
            delay_ms,
            output,
        } => {
            let config = manager.load()?;
            log::debug!("Starting scan of {input:?}");
            scan_command(config, &input, patterns, stream, progress, delay_ms, output).await?;
        }
        Commands::Config { command } => match command {
            ConfigCommand::Show => {
                for (key, value) in manager.list()? {
                    println!("{} = {}", key.cyan(), value);
                }
            }
            ConfigCommand::Get { key } => {
                println!("{}", manager.get(&key)?);
            }
            ConfigCommand::Path => {
                println!("{}", manager.get_config_path().display());
            }
        },
    }

    Ok(())
}

async fn scan_command(
    config: AppConfig,
    input: &Path,
    patterns: Vec<String>,
    stream: bool,
    progress_arg: Option<ProgressArg>,
    delay_ms: Option<u64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let patterns = if patterns.is_empty() {
        config.scan.patterns.clone()
    } else {
        patterns
    };
    let matcher = KeyMatcher::new(&patterns)?;
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.scan.delay_ms));

    let from_stdin = input == Path::new("-");
    let total = if stream || from_stdin {
        0
    } else {
        count_keys(input)?
    };
    let reader: Box<dyn BufRead + Send> = if from_stdin {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file =
            File::open(input).with_context(|| format!("Failed to open key file {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let mut options = config.progress;
    let mut progress: Box<dyn ProgressWriter> = match progress_arg {
        Some(ProgressArg::None) => Box::new(NullProgress),
        arg => {
            if let Some(mode) = arg.and_then(ProgressArg::mode) {
                options.mode = mode;
            }
            Box::new(ProgressSession::with_probe(io::stdout(), options.clone(), &StdoutProbe))
        }
    };

    let summary = scan_keys(reader, total, &matcher, delay, progress.as_mut()).await?;

    if let Some(path) = output {
        write_matches(&path, &summary)?;
    }

    let line = format!(
        "{} Scanned {} keys, {} matched in {:.2?}",
        "✓".green(),
        summary.scanned,
        summary.matched.len(),
        summary.elapsed
    );
    // Keep stdout machine-readable when progress is emitted as JSON lines
    if options.mode == ProgressMode::Json {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }

    Ok(())
}

fn write_matches(path: &Path, summary: &ScanSummary) -> Result<()> {
    let mut contents = summary.matched.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    fs::write(path, contents).with_context(|| format!("Failed to write matches to {}", path.display()))
}
