use crate::error::{GudsError, Result};
use crate::formats::FormatValidation;
use std::path::{Path, PathBuf};

pub struct FormatValidator;

impl FormatValidator {
    /// Validate that a file exists and is a regular file
    pub fn validate_file_exists(path: &Path) -> FormatValidation {
        let mut validation = FormatValidation::default();

        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => validation.errors.push(format!("Not a file: {}", path.display())),
            Err(_) => validation.errors.push(format!("File not found: {}", path.display())),
        }

        validation
    }

    /// Validate that a file has one of the expected extensions
    pub fn validate_extension(path: &Path, expected: &[&str]) -> FormatValidation {
        let mut validation = FormatValidation::default();
        let listed = expected.iter().map(|e| format!(".{}", e)).collect::<Vec<_>>().join(", ");

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if expected.iter().any(|e| ext.eq_ignore_ascii_case(e)) => {}
            Some(ext) => {
                validation
                    .errors
                    .push(format!("Unexpected file extension: .{} (expected {})", ext, listed));
            }
            None => {
                validation.errors.push(format!("File has no extension (expected {})", listed));
            }
        }

        validation
    }

    /// Validate that required component files exist for multi-file formats
    pub fn validate_component_files(
        base_path: &Path,
        required_extensions: &[&str],
        optional_extensions: &[&str],
    ) -> FormatValidation {
        let mut validation = FormatValidation::default();

        for ext in required_extensions {
            if find_component(base_path, ext).is_none() {
                validation.errors.push(format!(
                    "Missing required file: {}",
                    base_path.with_extension(ext).display()
                ));
            }
        }

        for ext in optional_extensions {
            if find_component(base_path, ext).is_none() {
                validation.warnings.push(format!(
                    "Optional file not found: {} (may affect functionality)",
                    base_path.with_extension(ext).display()
                ));
            }
        }

        validation
    }

    /// Merge multiple validation results
    pub fn merge_validations(validations: Vec<FormatValidation>) -> FormatValidation {
        let mut merged = FormatValidation::default();

        for validation in validations {
            merged.errors.extend(validation.errors);
            merged.warnings.extend(validation.warnings);
        }

        merged
    }

    /// Convert a validation result to a Result, logging warnings
    pub fn validation_to_result(validation: &FormatValidation, format_name: &str) -> Result<()> {
        for warning in &validation.warnings {
            tracing::warn!("{}: {}", format_name, warning);
        }

        if !validation.is_valid() {
            Err(GudsError::FormatError {
                format: format_name.to_string(),
                message: validation.errors.join("; "),
            })
        } else {
            Ok(())
        }
    }
}

/// Locate a sibling component, matching the extension case-insensitively
pub fn find_component(base_path: &Path, ext: &str) -> Option<PathBuf> {
    for candidate in [ext.to_lowercase(), ext.to_uppercase()] {
        let path = base_path.with_extension(candidate);
        if path.is_file() {
            return Some(path);
        }
    }
    None
}

/// Pre-read validation checks shared by every preparer
pub fn pre_read_validation(path: &Path, expected_extensions: &[&str]) -> FormatValidation {
    FormatValidator::merge_validations(vec![
        FormatValidator::validate_file_exists(path),
        FormatValidator::validate_extension(path, expected_extensions),
    ])
}
