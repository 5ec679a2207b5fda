//! Build-status relay entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Load configuration**: fetch the parameter document once and parse it
//!    into [`settings::Settings`].
//! 2. **Wire observability**: install the JSON `tracing-subscriber` layer and,
//!    when configured, the OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: settings → [`github::GitHubHttpClient`] →
//!    [`github::GitHubStatusClient`], injected into [`app::App`].
//! 4. **Invoke once**: read one event, process it, print the sentinel
//!    (`event:success`, `event:noop` or `event:error`) and exit non-zero on
//!    error.

mod app;
mod observability;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use relay::{InboundEvent, InvocationResult};
use settings::{FileParameterSource, InlineParameterSource, ParameterSource, Settings};

use crate::app::App;

/// Relay one CodeBuild event to the matching GitHub pull request status.
#[derive(Debug, Parser)]
#[command(name = "codebuild-status", version)]
struct Args {
    /// Event JSON file. Read from stdin when omitted.
    #[arg(long, value_name = "FILE")]
    event: Option<PathBuf>,

    /// Parameter document as a JSON file.
    #[arg(
        long,
        value_name = "FILE",
        env = "CODEBUILD_STATUS_CONFIG_FILE",
        conflicts_with = "parameters",
        required_unless_present = "parameters"
    )]
    config: Option<PathBuf>,

    /// Parameter document as an inline JSON string.
    #[arg(
        long,
        value_name = "JSON",
        env = "CODEBUILD_STATUS_PARAMETERS",
        hide_env_values = true
    )]
    parameters: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let result = match run(args).await {
        Ok(result) => result,
        Err(err) => {
            // The subscriber may not be installed yet.
            eprintln!("{}: {err:#}", InvocationResult::Error);
            InvocationResult::Error
        }
    };

    println!("{result}");
    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(args: Args) -> Result<InvocationResult> {
    let settings = load_settings(&args)?;
    let telemetry = observability::init(settings.log_level())?;

    let result = match invoke(&args, &settings).await {
        Ok(result) => result,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "{}", InvocationResult::Error);
            InvocationResult::Error
        }
    };

    telemetry.shutdown();
    Ok(result)
}

async fn invoke(args: &Args, settings: &Settings) -> Result<InvocationResult> {
    let app = App::from_settings(settings)?;
    let event = read_event(args.event.as_deref())?;
    Ok(app.handle(event).await)
}

fn load_settings(args: &Args) -> Result<Settings> {
    let source: Box<dyn ParameterSource> = match (&args.config, &args.parameters) {
        (Some(path), _) => Box::new(FileParameterSource::new(path)),
        (None, Some(document)) => Box::new(InlineParameterSource::new(document.as_str())),
        (None, None) => anyhow::bail!("either --config or --parameters is required"),
    };
    Ok(Settings::load(source.as_ref())?)
}

fn read_event(path: Option<&Path>) -> Result<InboundEvent> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read event from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read event from stdin")?;
            buf
        }
    };
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("event is not valid JSON")?;
    Ok(InboundEvent::new(value))
}
