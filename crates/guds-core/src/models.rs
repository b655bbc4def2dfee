pub mod catalog;
pub mod policy;
pub mod report;
pub mod upload;

pub use catalog::{listing_names, StoreKind, StyleCategory};
pub use policy::{OverwritePolicy, StatusPolicy};
pub use report::{DownloadReport, LayerReport, StyleReport, UploadReport};
pub use upload::{PreparedFile, UploadRequest, UploadType, ValueRange, KNOWN_BASINS};
