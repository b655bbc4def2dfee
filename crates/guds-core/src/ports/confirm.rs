use crate::error::Result;

/// Port for yes/no confirmation before destructive or creating steps
pub trait Confirm: Send + Sync {
    fn confirm(&self, question: &str) -> Result<bool>;
}

/// Answers every question the same way
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirm(pub bool);

impl Confirm for StaticConfirm {
    fn confirm(&self, question: &str) -> Result<bool> {
        tracing::debug!("{} -> {}", question, if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}
