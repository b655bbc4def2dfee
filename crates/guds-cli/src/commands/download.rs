use super::CliPublisher;
use crate::cli::Cli;
use crate::output::OutputWriter;
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::Result;
use std::path::Path;

pub async fn execute(publisher: &CliPublisher, cli: &Cli, date: &str, output: &OutputWriter) -> Result<()> {
    let basin = cli.basin.as_deref().unwrap_or_default();
    let spinner = create_spinner(
        &format!("Downloading {} {} data for {}...", basin, cli.data_type, date),
        !output.is_json(),
    );

    let report = match publisher
        .download(basin, date, cli.data_type, Path::new("."))
        .await
    {
        Ok(report) => {
            finish_success(&spinner, &format!("Downloaded {} bytes", report.bytes));
            report
        }
        Err(e) => {
            finish_error(&spinner, "Download failed");
            return Err(e.into());
        }
    };

    if output.is_json() {
        return output.result(&report);
    }
    output.kv("Resource", &report.resource);
    output.success(format!("Saved {}", report.path.display()));
    Ok(())
}
