use console::{style, StyledObject};
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Kind of status line
#[derive(Debug, Clone, Copy)]
enum Level {
    Success,
    Info,
    Warning,
}

impl Level {
    fn status(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Warning => "warning",
        }
    }

    fn marker(self) -> StyledObject<&'static str> {
        match self {
            Level::Success => style("✓").green().bold(),
            Level::Info => style("ℹ").blue().bold(),
            Level::Warning => style("⚠").yellow().bold(),
        }
    }
}

/// Writes command results either for a terminal or as JSON on stdout
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = if json { OutputFormat::Json } else { OutputFormat::Human };
        Self { format }
    }

    fn line(&self, level: Level, message: impl Display) {
        let text = match self.format {
            OutputFormat::Human => format!("{} {}", level.marker(), message),
            OutputFormat::Json => serde_json::json!({
                "status": level.status(),
                "message": message.to_string(),
            })
            .to_string(),
        };

        // Warnings stay off stdout so JSON results remain parseable
        match level {
            Level::Warning => eprintln!("{}", text),
            _ => println!("{}", text),
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

    /// Human-only tabular listing
    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
            return;
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{}", table);
    }

    /// Structured result: wrapped in a status envelope in JSON mode
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let text = match self.format {
            OutputFormat::Human => serde_json::to_string_pretty(&data)?,
            OutputFormat::Json => serde_json::to_string_pretty(&serde_json::json!({
                "status": "success",
                "data": data,
            }))?,
        };
        println!("{}", text);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        println!("  {}: {}", style(key).bold(), value);
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
