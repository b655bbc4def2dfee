//! Terminal prompts behind the core `Confirm` port

use dialoguer::{Confirm, Input};
use guds_core::ports::Confirm as ConfirmPort;
use guds_core::{GudsError, Result};
use std::path::Path;

/// Yes/no prompts on the terminal, defaulting to no
pub struct TerminalConfirm;

impl ConfirmPort for TerminalConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| GudsError::InvalidInput(format!("prompt failed: {}", e)))
    }
}

/// Ask for the EPSG code of a netCDF without a projection variable
pub fn prompt_epsg(path: &Path) -> anyhow::Result<u32> {
    println!(
        "\nNo projection information was found in {}.",
        path.display()
    );
    let epsg: u32 = Input::new()
        .with_prompt("Enter the EPSG code of the data")
        .validate_with(|value: &u32| -> std::result::Result<(), &str> {
            if *value > 0 {
                Ok(())
            } else {
                Err("EPSG codes are positive")
            }
        })
        .interact_text()?;
    Ok(epsg)
}
