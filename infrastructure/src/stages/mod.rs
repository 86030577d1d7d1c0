//! Stage adapters and the registry that binds them to configured pipelines

mod command;
#[cfg(feature = "http-stage")]
mod http;
mod registry;

pub use command::{CommandStage, render_args};
#[cfg(feature = "http-stage")]
pub use http::HttpStage;
pub use registry::{RegistryError, StageRegistry};
