//! Command implementations

mod download;
mod styles;
mod upload;
mod write_json;

use crate::cli::Cli;
use crate::dry_run::{display_planned_actions, DryRunTransport};
use crate::errors;
use crate::interactive::TerminalConfirm;
use crate::output::OutputWriter;
use crate::output_types::source_rows;
use anyhow::Result;
use guds_core::config::{CliCredentialOverrides, LayeredCredentials, RunOptions};
use guds_core::models::{OverwritePolicy, StatusPolicy, UploadType};
use guds_core::ports::Transport;
use guds_core::rest::GeoServerClient;
use guds_core::Publisher;
use std::sync::Arc;

/// Publisher over whichever transport the run uses
pub type CliPublisher = Publisher<Arc<dyn Transport>>;

/// What a run does, decided from the flags
#[derive(Debug, PartialEq, Eq)]
enum Action {
    WriteJson,
    Download(String),
    Styles,
    Upload,
}

fn plan(cli: &Cli) -> Result<Action> {
    if cli.write_json {
        return Ok(Action::WriteJson);
    }
    if cli.basin.is_none() && cli.data_type != UploadType::Styles {
        return Err(errors::no_basin().into());
    }
    if let Some(date) = &cli.download {
        return Ok(Action::Download(date.clone()));
    }
    if cli.files.is_empty() {
        return Err(errors::no_files().into());
    }
    if cli.data_type == UploadType::Styles {
        Ok(Action::Styles)
    } else {
        Ok(Action::Upload)
    }
}

fn run_options(cli: &Cli) -> RunOptions {
    RunOptions {
        overwrite: overwrite_policy(cli),
        status: if cli.strict_status {
            StatusPolicy::Fail
        } else {
            StatusPolicy::Continue
        },
        cleanup: !cli.no_cleanup,
        ..RunOptions::default()
    }
}

fn credential_overrides(cli: &Cli) -> CliCredentialOverrides {
    CliCredentialOverrides {
        url: cli.url.clone(),
        timeout_secs: cli.timeout,
    }
}

fn overwrite_policy(cli: &Cli) -> OverwritePolicy {
    if cli.bypass {
        OverwritePolicy::Always
    } else {
        OverwritePolicy::Ask
    }
}

/// Execute the run described by the flags
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let action = plan(&cli)?;

    if action == Action::WriteJson {
        return write_json::execute(overwrite_policy(&cli), &output);
    }

    let mut layered = LayeredCredentials::with_defaults()
        .load_from_file(&cli.credentials)?
        .load_from_env();
    layered.update_from_cli(credential_overrides(&cli));
    if cli.debug {
        output.section("Credentials");
        output.table(source_rows(layered.to_inspection_map()));
    }
    let credentials = layered.resolve()?;
    tracing::debug!("Using GeoServer REST root {}", credentials.rest_url()?);

    let options = run_options(&cli);
    let client = GeoServerClient::new(&credentials, options.status)?;

    let mut recorder = None;
    let transport: Arc<dyn Transport> = if cli.dry_run {
        let dry = Arc::new(DryRunTransport::new(client));
        recorder = Some(dry.clone());
        dry
    } else {
        Arc::new(client)
    };
    let publisher = Publisher::new(transport, Box::new(TerminalConfirm), options);

    match action {
        Action::Download(date) => download::execute(&publisher, &cli, &date, &output).await?,
        Action::Styles => styles::execute(&publisher, &cli.files, &output).await?,
        Action::Upload => upload::execute(&publisher, &cli, &credentials, &output).await?,
        Action::WriteJson => {}
    }

    if let Some(recorder) = recorder {
        display_planned_actions(&output, &recorder.actions());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use guds_core::config::ConfigSource;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("guds").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_plan() {
        assert_eq!(plan(&parse(&["--write_json"])).unwrap(), Action::WriteJson);
        assert_eq!(
            plan(&parse(&["-b", "kings", "--download", "2019-04-18"])).unwrap(),
            Action::Download("2019-04-18".to_string())
        );
        assert_eq!(plan(&parse(&["-f", "a.sld", "-t", "styles"])).unwrap(), Action::Styles);
        assert_eq!(plan(&parse(&["-f", "snow.nc", "-b", "kings"])).unwrap(), Action::Upload);
    }

    #[test]
    fn test_plan_requires_basin_and_files() {
        let err = plan(&parse(&["-f", "snow.nc"])).unwrap_err();
        assert_eq!(err.to_string(), "No basin given");
        let err = plan(&parse(&["-b", "kings"])).unwrap_err();
        assert_eq!(err.to_string(), "No files to upload");
    }

    #[test]
    fn test_run_options_from_flags() {
        let options = run_options(&parse(&["-y", "--no_cleanup", "--strict_status"]));
        assert_eq!(options.overwrite, OverwritePolicy::Always);
        assert_eq!(options.status, StatusPolicy::Fail);
        assert!(!options.cleanup);

        let options = run_options(&parse(&[]));
        assert_eq!(options.overwrite, OverwritePolicy::Ask);
        assert_eq!(options.status, StatusPolicy::Continue);
        assert!(options.cleanup);
    }

    #[test]
    fn test_timeout_flag_overrides_credentials() {
        let mut layered = LayeredCredentials::with_defaults();
        layered.timeout_secs.update(Some(30), ConfigSource::File);
        layered.update_from_cli(credential_overrides(&parse(&["--timeout", "120"])));
        assert_eq!(layered.timeout_secs.value, Some(120));
        assert_eq!(layered.timeout_secs.source, ConfigSource::Cli);

        layered.update_from_cli(credential_overrides(&parse(&["--url", "http://gs/geoserver"])));
        assert_eq!(layered.timeout_secs.value, Some(120));
        assert_eq!(layered.url.source, ConfigSource::Cli);
    }

    #[test]
    fn test_credential_sources_table() {
        let mut layered = LayeredCredentials::with_defaults();
        layered.geoserver_password.update("secret".to_string(), ConfigSource::File);
        layered.update_from_cli(credential_overrides(&parse(&["--url", "http://gs/geoserver"])));

        let rows = source_rows(layered.to_inspection_map());
        let settings: Vec<_> = rows.iter().map(|r| r.setting.as_str()).collect();
        assert_eq!(
            settings,
            vec!["data", "geoserver_password", "geoserver_username", "pem", "remote_username", "timeout_secs", "url"]
        );

        let password = rows.iter().find(|r| r.setting == "geoserver_password").unwrap();
        assert_eq!(password.value, "********");
        assert_eq!(password.source, "file");
        let url = rows.iter().find(|r| r.setting == "url").unwrap();
        assert_eq!((url.value.as_str(), url.source.as_str()), ("http://gs/geoserver", "cli"));
        let pem = rows.iter().find(|r| r.setting == "pem").unwrap();
        assert_eq!((pem.value.as_str(), pem.source.as_str()), ("none", "default"));
    }
}
