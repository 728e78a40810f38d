pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;

pub use config::{ConnectionParams, ReaperConfig, StoreBackend};
pub use error::{ConfigError, ParseError, StoreError};
pub use models::{OperationOutcome, RunMode, SkipReason, Summary, UploadRecord};
pub use services::reconciler::{ReconcileSettings, Reconciler, preview};
pub use services::store::UploadStore;
