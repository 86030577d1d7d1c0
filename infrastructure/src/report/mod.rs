//! Store-wide report writers

mod csv_writer;

pub use csv_writer::{COMPARISON_FILE, ReportError, write_comparison_csv};
