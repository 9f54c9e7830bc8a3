//! Host access layer.
//!
//! Every component reaches the machine through [`Host`]: PATH lookups,
//! external commands, file reads, modification times and the clock. The
//! production implementation is [`SystemHost`]; tests drive components with
//! the scripted host in [`mock`].

use std::fmt;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use duct::cmd;

use crate::ui::prelude::*;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Environment overrides applied to this invocation only.
    pub env: Vec<(String, String)>,
    /// Capture stdout/stderr instead of inheriting the terminal.
    pub capture: bool,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            env: Vec::new(),
            capture: false,
        }
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Program and arguments joined by spaces, for logs and matching.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.command_line())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code as text, `signal` when the process was killed.
    pub fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

pub trait Host {
    /// Whether `name` resolves to an executable in PATH.
    fn command_in_path(&self, name: &str) -> bool;

    /// Run an invocation to completion. A non-zero exit is not an error here.
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    fn now(&self) -> SystemTime;
}

/// The real machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl Host for SystemHost {
    fn command_in_path(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        diag(Level::Debug, "run", &format!("executing: {}", invocation));

        let mut expression = cmd(&invocation.program, &invocation.args).unchecked();
        for (key, value) in &invocation.env {
            expression = expression.env(key, value);
        }
        if invocation.capture {
            expression = expression.stdout_capture().stderr_capture();
        }

        let output = expression.run()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
