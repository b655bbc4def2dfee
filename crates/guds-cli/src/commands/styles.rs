use super::CliPublisher;
use crate::output::OutputWriter;
use anyhow::Result;
use std::path::PathBuf;

pub async fn execute(publisher: &CliPublisher, files: &[PathBuf], output: &OutputWriter) -> Result<()> {
    let report = publisher.submit_styles(files).await?;

    if output.is_json() {
        return output.result(&report);
    }

    for name in &report.replaced {
        output.info(format!("Replaced existing style {}", name));
    }
    for name in &report.skipped {
        output.warning(format!("Kept existing style {}", name));
    }
    output.success(format!("Submitted {} style(s)", report.uploaded.len()));
    Ok(())
}
