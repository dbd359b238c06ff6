// src/utils/log.rs

//! Console report formatting for CLI commands.
//!
//! Diagnostics go through the `log` facade; these helpers print the
//! human-facing report (headers, item lists, summaries) with the same
//! timestamped prefix so the two interleave cleanly.

use std::sync::OnceLock;

use chrono::Local;

/// Report verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

static LOG_LEVEL: OnceLock<LogLevel> = OnceLock::new();

/// Set the report level once; later calls are ignored.
pub fn init(level: &str) {
    let _ = LOG_LEVEL.set(LogLevel::parse(level));
}

fn should_log(level: LogLevel) -> bool {
    level >= LOG_LEVEL.get().copied().unwrap_or(LogLevel::Info)
}

fn format_log(level: LogLevel, message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    format!("[{}] [{}] {}", timestamp, level.as_str(), message)
}

/// Print a boxed section header.
pub fn header(title: &str) {
    if should_log(LogLevel::Info) {
        let border = "═".repeat(60);
        println!("{}", format_log(LogLevel::Info, &border));
        println!("{}", format_log(LogLevel::Info, &format!("  {}", title)));
        println!("{}", format_log(LogLevel::Info, &border));
    }
}

/// Print an indented line.
pub fn sub_item(message: &str) {
    if should_log(LogLevel::Info) {
        println!("{}", format_log(LogLevel::Info, &format!("    {}", message)));
    }
}

/// Print a success line regardless of level.
pub fn success(message: &str) {
    println!("{}", format_log(LogLevel::Info, message));
}

/// Print an error line.
pub fn error(message: &str) {
    if should_log(LogLevel::Error) {
        eprintln!("{}", format_log(LogLevel::Error, message));
    }
}

/// Print a titled key/value summary.
pub fn summary(title: &str, items: &[(&str, String)]) {
    if should_log(LogLevel::Info) {
        println!();
        println!("{}", format_log(LogLevel::Info, &format!("[SUMMARY] {}", title)));
        for (key, value) in items {
            println!("{}", format_log(LogLevel::Info, &format!("    {}: {}", key, value)));
        }
    }
}
