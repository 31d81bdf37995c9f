use console::style;
use geowrangle_core::GeowrangleError;
use std::fmt;

/// Enhanced error type with suggestions
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
    pub help_command: Option<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
            help_command: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_help(mut self, command: impl Into<String>) -> Self {
        self.help_command = Some(command.into());
        self
    }

    /// Full report: headline, context, numbered fixes, help pointer
    pub fn report(&self) -> String {
        let mut lines = vec![format!(
            "{} {}",
            style("✗").red().bold(),
            style(&self.message).red().bold()
        )];

        if let Some(context) = &self.context {
            lines.push(String::new());
            lines.push(context.clone());
        }

        if !self.suggestions.is_empty() {
            lines.push(String::new());
            lines.push(style("To fix this:").yellow().bold().to_string());
            lines.extend(
                self.suggestions.iter().enumerate().map(|(i, s)| format!("  {}. {}", i + 1, s)),
            );
        }

        if let Some(help) = &self.help_command {
            lines.push(String::new());
            lines.push(format!("{} {}", style("Need help?").cyan(), style(help).cyan().bold()));
        }

        lines.join("\n")
    }

    pub fn display(&self) {
        eprintln!("{}", self.report());
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Attach fix-it hints to library errors a user can act on
pub fn explain(err: GeowrangleError, command: &str) -> CliError {
    let help = format!("Run: geowrangle {} --help", command);
    match &err {
        GeowrangleError::FileNotFound { path } => CliError::new("Dataset file not found")
            .with_context(format!("The specified file does not exist.\n\nPath: {}", path.display()))
            .with_suggestion("Check the file path and try again")
            .with_suggestion("Shapefiles need their .shx and .dbf next to the .shp")
            .with_help(help),
        GeowrangleError::UnsupportedFormat { extension, supported } => {
            CliError::new(format!("Unsupported format '.{}'", extension))
                .with_suggestion(format!("Use one of: {}", supported.join(", ")))
                .with_help(help)
        }
        GeowrangleError::FieldNotFound { field, dataset } => {
            CliError::new(format!("Column '{}' not found", field))
                .with_context(format!("Dataset {} has no column named {}.", dataset, field))
                .with_suggestion("Pass the right column with --id-field")
                .with_suggestion("Or set it in the config file or GEOWRANGLE_* environment")
                .with_help(help)
        }
        GeowrangleError::InsufficientBands { path, found, required } => {
            CliError::new("Not enough bands for this preview")
                .with_context(format!(
                    "{} has {} bands; this window needs {}.",
                    path.display(),
                    found,
                    required
                ))
                .with_suggestion("Drop --infrared to show the first three bands")
                .with_help(help)
        }
        _ => CliError::new(err.to_string()).with_help(help),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_field_not_found_suggests_flag() {
        let err = explain(
            GeowrangleError::FieldNotFound { field: "osm_id".into(), dataset: "roads".into() },
            "clip",
        );
        assert!(err.message.contains("osm_id"));
        assert!(err.suggestions.iter().any(|s| s.contains("--id-field")));
        assert_eq!(err.help_command.as_deref(), Some("Run: geowrangle clip --help"));
        assert!(err.report().contains("1. Pass the right column with --id-field"));
    }

    #[test]
    fn test_other_errors_keep_message() {
        let err = explain(
            GeowrangleError::InvalidPath { path: PathBuf::from("x"), reason: "bad".into() },
            "subset",
        );
        assert_eq!(err.to_string(), "Invalid path x: bad");
        assert!(err.suggestions.is_empty());
        assert!(!err.report().contains("To fix this"));
    }
}
