use broadcast_core::EmitFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "bcast")]
#[command(about = "bcast - Discover event listeners and generate the static listeners provider")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute (defaults to generate if not provided)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// RUST_LOG takes precedence when set
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to <project>/broadcast.toml)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root containing composer.json
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Maximum number of classes reflected at once (overrides config file)
    #[arg(short = 'j', long, global = true)]
    pub concurrency: Option<usize>,

    /// Marker interface identifying listeners (overrides config file)
    #[arg(long, global = true)]
    pub marker: Option<String>,
}

impl Cli {
    /// Level used when RUST_LOG is not set
    pub fn level_filter(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::DEBUG
        } else {
            self.log_level.unwrap_or(LogLevel::Off).into()
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover listeners and write the generated provider
    Generate {
        /// Print the rendered provider instead of writing it
        #[arg(long)]
        dry_run: bool,

        /// Registry literal format (php, json; overrides config file)
        #[arg(short = 'f', long)]
        format: Option<EmitFormat>,
    },

    /// Print the discovered event registry
    List {
        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: ListFormat,
    },

    /// Exit non-zero when the generated provider is out of date
    Check,
}

/// Output formats of `bcast list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    Text,
    Json,
}
