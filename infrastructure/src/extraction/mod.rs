//! Extraction adapters

mod command_extractor;

pub use command_extractor::CommandExtractor;
