//! Document store configuration from TOML (`[store]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// Directory holding one subdirectory per loan
    pub root: PathBuf,
    /// Where store-wide reports such as the comparison CSV are written
    pub aggregate_dir: PathBuf,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("loan_docs"),
            aggregate_dir: PathBuf::from("aggregate_data"),
        }
    }
}
