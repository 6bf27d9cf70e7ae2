//! classsheet - Extract class rosters from Google Sheets

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use termcolor::{ColorChoice, StandardStream};

use classsheet::config::{parse_timezone, Config, TitleStyle, DEFAULT_FOLDER_ID};
use classsheet::google::{CredentialSource, GoogleClient, GoogleSession, ServiceAccountKey};
use classsheet::operator::{write_error, Operator, ScriptedOperator, TerminalOperator};
use classsheet::source::SheetReference;
use classsheet::{Pipeline, PipelineError, RunOutcome};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTitleStyle {
    Interactive,
    Batch,
}

impl From<CliTitleStyle> for TitleStyle {
    fn from(s: CliTitleStyle) -> Self {
        match s {
            CliTitleStyle::Interactive => TitleStyle::Interactive,
            CliTitleStyle::Batch => TitleStyle::Batch,
        }
    }
}

/// Extract class rosters from a Google Sheet into a new sheet in Google Drive
#[derive(Parser, Debug)]
#[command(name = "classsheet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address of the source spreadsheet (must contain /d/<id>)
    #[arg(env = "CLASSSHEET_SHEET")]
    sheet: String,

    /// Drive folder the new spreadsheet is created in
    #[arg(long, env = "CLASSSHEET_FOLDER", default_value = DEFAULT_FOLDER_ID)]
    folder: String,

    /// Service account JSON key file
    #[arg(long, env = "CLASSSHEET_CREDENTIALS", conflicts_with = "secrets")]
    credentials: Option<PathBuf>,

    /// TOML secrets file with a [gcp_service_account] table
    #[arg(long, env = "CLASSSHEET_SECRETS")]
    secrets: Option<PathBuf>,

    /// Column holding the class of each student
    #[arg(long, default_value = "Classe")]
    class_column: String,

    /// Classes to export, without prompting (positions or names, comma-separated, * for all)
    #[arg(long, requires = "name")]
    classes: Option<String>,

    /// Name of the new spreadsheet, without prompting; a timestamp is appended
    #[arg(long, requires = "classes")]
    name: Option<String>,

    /// Timezone of the timestamp appended to the name
    #[arg(long, default_value = "Europe/Brussels", value_parser = parse_timezone)]
    timezone: chrono_tz::Tz,

    /// Timestamp format of the title (defaults to batch when --classes is given)
    #[arg(long, value_enum)]
    title_style: Option<CliTitleStyle>,

    /// Rows shown in the preview of the selection
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,

    /// Log debug information to stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn scripted(&self) -> bool {
        self.classes.is_some()
    }

    fn credential_source(&self) -> Result<CredentialSource, PipelineError> {
        match (&self.credentials, &self.secrets) {
            (Some(path), _) => Ok(CredentialSource::KeyFile(path.clone())),
            (None, Some(path)) => Ok(CredentialSource::SecretsFile(path.clone())),
            (None, None) => Err(PipelineError::Configuration(
                "no credentials given, use --credentials <key.json> or --secrets <secrets.toml>"
                    .to_string(),
            )),
        }
    }

    fn config(&self) -> Result<Config, PipelineError> {
        let title_style = match self.title_style {
            Some(style) => style.into(),
            None if self.scripted() => TitleStyle::Batch,
            None => TitleStyle::Interactive,
        };

        Ok(Config::new(self.sheet.clone())
            .with_folder_id(self.folder.clone())
            .with_class_column(self.class_column.clone())
            .with_timezone(self.timezone)
            .with_title_style(title_style)
            .with_preview_rows(self.preview_rows)
            .with_credentials(self.credential_source()?))
    }
}

fn main() -> ExitCode {
    let mut stderr = StandardStream::stderr(color_choice(io::stderr().is_terminal()));
    match run() {
        Ok(RunOutcome::Exported(_)) => ExitCode::SUCCESS,
        Ok(RunOutcome::NothingToExport) | Ok(RunOutcome::Cancelled) => ExitCode::from(1),
        Err(e) => {
            if write_error(&mut stderr, &format!("{:#}", e)).is_err() {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<RunOutcome> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    // Address and credentials are checked before any network access
    SheetReference::parse(&cli.sheet)?;
    let config = cli.config()?;
    let source = config
        .credentials
        .as_ref()
        .context("credentials are required")?;
    let key = ServiceAccountKey::load(source)?;

    let session = GoogleSession::new(key);
    let client = GoogleClient::new(&session);
    let pipeline = Pipeline::new(&config, &client);

    let stdout = StandardStream::stdout(color_choice(io::stdout().is_terminal()));
    let mut operator: Box<dyn Operator> = match (&cli.classes, &cli.name) {
        (Some(classes), Some(name)) => Box::new(
            ScriptedOperator::new(classes.as_str(), name.as_str(), stdout)
                .with_preview_rows(config.preview_rows),
        ),
        _ => Box::new(
            TerminalOperator::new(io::stdin().lock(), stdout)
                .with_preview_rows(config.preview_rows),
        ),
    };

    let outcome = pipeline
        .run(operator.as_mut())
        .with_context(|| format!("Failed to extract classes from {}", config.sheet_address))?;
    Ok(outcome)
}

fn color_choice(is_terminal: bool) -> ColorChoice {
    if is_terminal {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("CLASSSHEET_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
