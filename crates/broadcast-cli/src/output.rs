//! Console output
//!
//! Progress goes to stderr so that `generate --dry-run` and `list` keep
//! stdout for their payload.

use async_trait::async_trait;
use colored::Colorize;

use broadcast_core::{
    ClassIdentifier, DiscoveryReporter, DiscoveryStats, ReflectionError, SourceDirectory,
};

/// Prefix of every progress line
pub const PREFIX: &str = "wyrihaximus/broadcast:";

fn prefix() -> colored::ColoredString {
    PREFIX.bright_blue().bold()
}

pub fn status(message: impl AsRef<str>) {
    eprintln!("{} {}", prefix(), message.as_ref());
}

pub fn success(message: impl AsRef<str>) {
    eprintln!("{} {}", prefix(), message.as_ref().green());
}

pub fn warning(message: impl AsRef<str>) {
    eprintln!("{} {}", prefix(), message.as_ref().yellow());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{} {}", prefix(), message.as_ref().red().bold());
}

/// "1 directory", "3 directories"
pub fn directory_count(count: usize) -> String {
    if count == 1 {
        "1 directory".to_string()
    } else {
        format!("{count} directories")
    }
}

/// Reporter printing discovery progress to the console
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DiscoveryReporter for ConsoleReporter {
    async fn directories_resolved(&self, directories: &[SourceDirectory]) {
        status(format!("Scanned {}", directory_count(directories.len())));
    }

    async fn class_skipped(&self, class: &ClassIdentifier, error: &ReflectionError) {
        warning(format!("Error while reflecting \"{class}\": {error}"));
    }

    async fn completed(&self, stats: &DiscoveryStats) {
        for line in summary(stats) {
            status(line);
        }
    }
}

/// Completion lines, listeners first
fn summary(stats: &DiscoveryStats) -> [String; 2] {
    [
        format!("Found {} listener(s)", stats.listeners),
        format!("Found {} event(s)", stats.events),
    ]
}
