use colored::*;
use lazy_static::lazy_static;
use serde::Serialize;
use std::io::{self, Write};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::FATAL_EXIT_CODE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Debug => "debug",
        }
    }

    /// Severity tag placed after the operation name in diagnostics.
    fn tag(self) -> &'static str {
        match self {
            Level::Info | Level::Success => "Info:",
            Level::Warn => "Warning:",
            Level::Error => "Error:",
            Level::Debug => "Debug:",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Renderer {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

lazy_static! {
    static ref RENDERER: RwLock<Renderer> = RwLock::new(Renderer::default());
}

// Global debug state
static DEBUG_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_debug_mode(enabled: bool) {
    DEBUG_MODE.store(enabled, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

pub fn init(format: OutputFormat, color: bool) {
    if let Ok(mut r) = RENDERER.write() {
        r.format = format;
        r.color = color;
    }
}

fn renderer() -> Renderer {
    RENDERER
        .read()
        .map(|r| r.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
}

pub const SEPARATOR_WIDTH: usize = 80;

#[derive(Serialize)]
struct Event<'a> {
    level: &'a str,
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn colorize(level: Level, s: &str, enable: bool) -> String {
    if !enable {
        return s.to_string();
    }
    match level {
        Level::Info => s.normal().to_string(),
        Level::Success => s.green().bold().to_string(),
        Level::Warn => s.yellow().bold().to_string(),
        Level::Error => s.red().bold().to_string(),
        Level::Debug => s.cyan().to_string(),
    }
}

fn event_json(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) -> String {
    let ev = Event {
        level: level.as_str(),
        code,
        message,
        data,
    };
    // Event only holds strings and an optional JSON value
    serde_json::to_string(&ev).unwrap_or_default()
}

/// Write regular command output. Errors and warnings go to stderr.
pub fn emit(level: Level, code: &str, message: &str, data: Option<serde_json::Value>) {
    let r = renderer();
    let line = match r.format {
        OutputFormat::Text => colorize(level, message, r.color),
        OutputFormat::Json => event_json(level, code, message, data),
    };
    let mut out: Box<dyn Write> = match level {
        Level::Error | Level::Warn => Box::new(io::stderr()),
        _ => Box::new(io::stdout()),
    };
    let _ = writeln!(out, "{}", line);
}

/// Format a diagnostic line as `<operation>: <Tag> <message>`.
pub fn format_diagnostic(level: Level, operation: &str, message: &str) -> String {
    format!("{}: {} {}", operation, level.tag(), message)
}

/// Write a diagnostic for `operation` to stderr.
///
/// Debug diagnostics are dropped unless debug mode is on.
pub fn diag(level: Level, operation: &str, message: &str) {
    if level == Level::Debug && !is_debug_enabled() {
        return;
    }
    let r = renderer();
    let line = match r.format {
        OutputFormat::Text => {
            colorize(level, &format_diagnostic(level, operation, message), r.color)
        }
        OutputFormat::Json => event_json(level, operation, message, None),
    };
    let _ = writeln!(io::stderr(), "{}", line);
}

/// Report a configuration-level programming error and terminate the process.
pub fn fatal(operation: &str, message: &str) -> ! {
    diag(Level::Error, operation, message);
    std::process::exit(FATAL_EXIT_CODE)
}

/// Validate a separator argument: it must be exactly one character.
pub fn parse_separator(separator: &str) -> Option<char> {
    let mut chars = separator.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Print a step header for a multi-step operation.
///
/// A malformed separator is a caller bug and aborts the process.
pub fn progress(operation: &str, message: &str, separator: &str) {
    let Some(glyph) = parse_separator(separator) else {
        fatal(
            operation,
            &format!("progress separator must be a single character, got '{separator}'"),
        );
    };

    let r = renderer();
    // In JSON mode, do not print separators to avoid breaking jq parsing
    if matches!(r.format, OutputFormat::Json) {
        emit(Level::Info, operation, message, None);
        return;
    }
    let rule = glyph.to_string().repeat(SEPARATOR_WIDTH);
    let mut out = io::stdout();
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "{}",
        if r.color {
            message.bold().to_string()
        } else {
            message.to_string()
        }
    );
}

pub mod prelude {
    pub use super::{Level, OutputFormat, diag, emit, fatal, progress};
}
