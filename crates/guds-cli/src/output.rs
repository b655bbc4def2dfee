//! Human and JSON rendering for the `guds` binary
//!
//! In JSON mode stdout carries exactly one document (the command result);
//! status lines other than success and warnings are dropped.

use console::{style, StyledObject};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green().bold(),
            Level::Info => style("ℹ").blue().bold(),
            Level::Warning => style("⚠").yellow().bold(),
        }
    }

    fn status(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }
}

pub struct OutputWriter {
    format: OutputFormat,
}

fn to_pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json { OutputFormat::Json } else { OutputFormat::Human };
        Self { format }
    }

    fn line(&self, level: Level, message: impl Display) {
        match (self.format, level) {
            (OutputFormat::Human, Level::Warning) => eprintln!("{} {}", level.marker(), message),
            (OutputFormat::Human, _) => println!("{} {}", level.marker(), message),
            (OutputFormat::Json, Level::Warning) => {
                let doc = json!({"status": level.status(), "message": message.to_string()});
                eprintln!("{}", to_pretty(&doc));
            }
            (OutputFormat::Json, _) => {}
        }
    }

    pub fn success(&self, message: impl Display) {
        self.line(Level::Success, message);
    }

    pub fn info(&self, message: impl Display) {
        self.line(Level::Info, message);
    }

    pub fn warning(&self, message: impl Display) {
        self.line(Level::Warning, message);
    }

    /// Rounded table, human mode only
    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.is_json() {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(no layers)").dim());
            return;
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    /// Final result of a command, wrapped in a status envelope under `--json`
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let body = match self.format {
            OutputFormat::Human => serde_json::to_value(&data)?,
            OutputFormat::Json => json!({"status": "success", "data": data}),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}
