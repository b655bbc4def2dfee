//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod confirm;
pub mod transport;

pub use confirm::{Confirm, StaticConfirm};
pub use transport::Transport;
