//! Filesystem-backed loan store
//!
//! Each loan is a directory `<root>/<loan_id>/` holding the artifacts the
//! pipeline stages write.

pub mod artifacts;
mod fs_store;

pub use fs_store::FsLoanStore;
