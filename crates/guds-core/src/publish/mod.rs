//! Publishing pipeline
//!
//! `Publisher` drives every remote operation through a `Transport`, so the
//! same code runs against a live GeoServer, the in-memory catalog, or the
//! CLI's dry-run recorder. Interactive decisions go through the injected
//! `Confirm` port and the `OverwritePolicy` in `RunOptions`.

use crate::config::RunOptions;
use crate::error::{GudsError, Result};
use crate::ports::{Confirm, Transport};

mod create;
mod download;
mod resolver;
mod styles;
mod upload;

pub use create::{coverage_payload, feature_type_payload, plan_layer, store_payload, StoreSpec};
pub use download::{download_resource, parse_date};
pub use resolver::ExistsQuery;

/// Orchestrates uploads, downloads and style submission
pub struct Publisher<T: Transport> {
    transport: T,
    confirm: Box<dyn Confirm>,
    options: RunOptions,
}

impl<T: Transport> Publisher<T> {
    pub fn new(transport: T, confirm: Box<dyn Confirm>, options: RunOptions) -> Self {
        Self {
            transport,
            confirm,
            options,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Ask before replacing something that exists
    fn allow_overwrite(&self, question: &str) -> Result<bool> {
        self.options.overwrite.allow_overwrite(self.confirm.as_ref(), question)
    }

    /// Ask before creating something new, aborting when declined
    fn require_create(&self, question: &str, what: &str) -> Result<()> {
        if self.options.overwrite.allow_create(self.confirm.as_ref(), question)? {
            Ok(())
        } else {
            tracing::info!("Aborting creating {}", what);
            Err(GudsError::Aborted(format!("creating {} was declined", what)))
        }
    }
}
