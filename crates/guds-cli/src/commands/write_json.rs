use crate::interactive::TerminalConfirm;
use crate::output::OutputWriter;
use crate::output_types::WriteJsonOutput;
use anyhow::Result;
use guds_core::config::{write_template, DEFAULT_CREDENTIALS_FILE};
use guds_core::models::OverwritePolicy;
use std::path::Path;

pub fn execute(policy: OverwritePolicy, output: &OutputWriter) -> Result<()> {
    let path = Path::new(DEFAULT_CREDENTIALS_FILE);
    let written = write_template(path, policy, &TerminalConfirm)?;

    if output.is_json() {
        return output.result(WriteJsonOutput {
            path: path.display().to_string(),
            written,
        });
    }

    if written {
        output.success(format!("Wrote blank credentials to {}", path.display()));
        output.info("Fill in the url and GeoServer login before uploading.");
    } else {
        output.warning(format!("Kept existing {}", path.display()));
    }
    Ok(())
}
