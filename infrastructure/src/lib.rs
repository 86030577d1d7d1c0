//! Infrastructure layer for loanflow
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod extraction;
pub mod logging;
pub mod process;
pub mod report;
pub mod stages;
pub mod store;

// Re-export commonly used types
pub use config::{
    ColorMode, ConfigLoader, ConfigValidationError, FileConfig, FileExtractorConfig, FileOutputConfig,
    FileStageConfig, StageKind,
};
pub use extraction::CommandExtractor;
pub use logging::JsonlBatchLogger;
pub use report::{COMPARISON_FILE, ReportError, write_comparison_csv};
pub use stages::{CommandStage, RegistryError, StageRegistry};
pub use store::FsLoanStore;
