use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ports::Confirm;

/// What to do when a remote object already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Delete and recreate without asking
    Always,
    /// Keep the existing object
    Never,
    /// Ask through the confirmation port
    #[default]
    Ask,
}

impl OverwritePolicy {
    /// Decide whether an existing object may be replaced
    pub fn allow_overwrite(&self, confirm: &dyn Confirm, question: &str) -> Result<bool> {
        match self {
            OverwritePolicy::Always => Ok(true),
            OverwritePolicy::Never => Ok(false),
            OverwritePolicy::Ask => confirm.confirm(question),
        }
    }

    /// Decide whether a new object may be created
    pub fn allow_create(&self, confirm: &dyn Confirm, question: &str) -> Result<bool> {
        match self {
            OverwritePolicy::Ask => confirm.confirm(question),
            OverwritePolicy::Always | OverwritePolicy::Never => Ok(true),
        }
    }
}

/// How non-2xx, non-404 responses are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Log at debug level and carry on
    #[default]
    Continue,
    /// Surface as `UnexpectedStatus`
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::StaticConfirm;

    #[test]
    fn test_overwrite_policy() {
        let yes = StaticConfirm(true);
        let no = StaticConfirm(false);

        assert!(OverwritePolicy::Always.allow_overwrite(&no, "?").unwrap());
        assert!(!OverwritePolicy::Never.allow_overwrite(&yes, "?").unwrap());
        assert!(OverwritePolicy::Ask.allow_overwrite(&yes, "?").unwrap());
        assert!(!OverwritePolicy::Ask.allow_overwrite(&no, "?").unwrap());
    }

    #[test]
    fn test_create_only_asks_under_ask() {
        let no = StaticConfirm(false);
        assert!(OverwritePolicy::Never.allow_create(&no, "?").unwrap());
        assert!(OverwritePolicy::Always.allow_create(&no, "?").unwrap());
        assert!(!OverwritePolicy::Ask.allow_create(&no, "?").unwrap());
    }
}
