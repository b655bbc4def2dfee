use console::style;
use guds_core::GudsError;
use std::fmt;

/// Error rendered with context and suggestions
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

    pub fn display(&self) {
        eprintln!("{} {}\n", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("{}", context);
            eprintln!();
        }

        if !self.suggestions.is_empty() {
            eprintln!("{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
            eprintln!();
        }

        if let Some(ref help_cmd) = self.help_command {
            eprintln!("{} {}", style("Need help?").cyan(), style(help_cmd).cyan().bold());
        }
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

/// Create error for a run with nothing to do
pub fn no_files() -> CliError {
    CliError::new("No files to upload")
        .with_context("Pass the files to upload with -f/--files, or a date with --download.")
        .with_suggestion("Upload model output: guds -f snow.nc -b kings -t modeled")
        .with_suggestion("Download a day: guds -b kings --download 2019-04-18")
        .with_help("Run: guds --help")
}

/// Create error for a missing basin
pub fn no_basin() -> CliError {
    CliError::new("No basin given")
        .with_context("Every upload and download is associated with a basin (GeoServer workspace).")
        .with_suggestion("Add -b/--basin, e.g. -b kings")
        .with_help("Run: guds --help")
}

fn credentials_missing(key: &str) -> CliError {
    CliError::new(format!("Missing credential: {}", key))
        .with_context(format!(
            "The credentials file does not set '{}' and no override was given.",
            key
        ))
        .with_suggestion("Write a blank template: guds --write_json")
        .with_suggestion(format!(
            "Or set GUDS_{} in the environment",
            key.to_uppercase()
        ))
}

/// Convert a core error into a rendered error
pub fn from_guds(error: &GudsError) -> CliError {
    let message = error.to_string();
    match error {
        GudsError::FileNotFound { path } => CliError::new("File not found")
            .with_context(format!("Path: {}", path.display()))
            .with_suggestion("Check the file path and try again")
            .with_suggestion("Credentials default to ./geoserver.json, use -c to point elsewhere"),
        GudsError::ConfigMissing { key } => credentials_missing(key),
        GudsError::InvalidUrl { .. } => CliError::new(message)
            .with_suggestion("Use the full GeoServer url, e.g. http://host:8080/geoserver"),
        GudsError::MissingProjection { .. } => CliError::new(message)
            .with_suggestion("Pass the EPSG code of the data with -e/--espg"),
        GudsError::Aborted(_) => CliError::new(message)
            .with_suggestion("Use -y/--bypass to answer yes to every prompt"),
        GudsError::UnsupportedUploadType(_) | GudsError::Unsupported(_) => {
            CliError::new(message).with_help("Run: guds --help")
        }
        GudsError::RemoteNotFound { .. } | GudsError::UnexpectedStatus { .. } => {
            CliError::new(message)
                .with_suggestion("Check the url in the credentials file")
                .with_suggestion("Rerun with --debug to log every request")
        }
        GudsError::Http(_) => CliError::new("Cannot reach the GeoServer")
            .with_context(format!("Error: {}", message))
            .with_suggestion("Check that the server is running and the url is correct")
            .with_suggestion("Raise the request timeout with --timeout or timeout_secs for slow links"),
        _ => CliError::new(message),
    }
}

/// Convert anyhow::Error to CliError with context
pub fn from_anyhow(error: anyhow::Error) -> CliError {
    if let Some(guds) = error.downcast_ref::<GudsError>() {
        return from_guds(guds);
    }
    match error.downcast::<CliError>() {
        Ok(cli) => cli,
        Err(other) => CliError::new(other.to_string()),
    }
}
