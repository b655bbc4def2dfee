use super::CliPublisher;
use crate::cli::Cli;
use crate::interactive::prompt_epsg;
use crate::output::OutputWriter;
use crate::output_types::{LayerRow, UploadOutput};
use crate::progress::{create_spinner, finish_error, finish_success};
use anyhow::Result;
use guds_core::config::Credentials;
use guds_core::models::{OverwritePolicy, UploadReport, UploadRequest};
use guds_core::GudsError;
use std::path::Path;

pub async fn execute(
    publisher: &CliPublisher,
    cli: &Cli,
    credentials: &Credentials,
    output: &OutputWriter,
) -> Result<()> {
    let basin = cli.basin.clone().unwrap_or_default();
    let mut reports = Vec::new();

    for file in &cli.files {
        let request = UploadRequest::new(basin.as_str(), file, cli.data_type)
            .with_epsg(cli.epsg)
            .with_mask(cli.mask.clone())
            .with_latest(cli.latest);

        let report = upload_one(publisher, request, output).await?;
        display_report(output, credentials, &report);
        reports.push(report);
    }

    if output.is_json() {
        output.result(UploadOutput { uploads: reports })?;
    }
    Ok(())
}

/// Upload a file, asking for an EPSG code once if the file has no projection
async fn upload_one(
    publisher: &CliPublisher,
    request: UploadRequest,
    output: &OutputWriter,
) -> Result<UploadReport> {
    let result = run_with_spinner(publisher, &request, output).await;

    match result {
        Err(GudsError::MissingProjection { path }) if request.epsg.is_none() && !output.is_json() => {
            output.warning(format!("{} has no projection information", display_name(&path)));
            let epsg = prompt_epsg(&path)?;
            let retry = request.with_epsg(Some(epsg));
            Ok(run_with_spinner(publisher, &retry, output).await?)
        }
        other => Ok(other?),
    }
}

async fn run_with_spinner(
    publisher: &CliPublisher,
    request: &UploadRequest,
    output: &OutputWriter,
) -> guds_core::Result<UploadReport> {
    // Prompts only happen under the ask policy
    let visible = !output.is_json() && publisher.options().overwrite == OverwritePolicy::Always;
    let name = display_name(&request.file);
    let spinner = create_spinner(&format!("Uploading {}...", name), visible);

    let result = publisher.upload(request).await;
    match &result {
        Ok(report) => finish_success(
            &spinner,
            &format!("Uploaded {} in {:.1}s", name, report.elapsed_secs),
        ),
        Err(_) => finish_error(&spinner, &format!("Upload of {} failed", name)),
    }
    result
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn display_report(output: &OutputWriter, credentials: &Credentials, report: &UploadReport) {
    if output.is_json() {
        return;
    }

    output.section(format!("{} upload to {}", report.upload_type, report.basin));
    if report.created_basin {
        output.success(format!("Created basin {}", report.basin));
    }
    output.kv("Store", &report.store);
    let file_name = report.remote_path.rsplit('/').next().unwrap_or_default();
    output.kv("Remote file", credentials.remote_path(&report.basin, file_name));

    output.table(report.layers.iter().map(LayerRow::from).collect());

    for layer in &report.skipped_layers {
        output.warning(format!("Layer {} already exists and was left alone", layer));
    }
    if let Some(store) = &report.latest_store {
        output.kv("Latest store", store);
        output.kv("Latest layers", report.latest_layers.join(", "));
    }
    output.success(format!(
        "Published {} layer(s) in {:.1}s",
        report.layers.len(),
        report.elapsed_secs
    ));
}
