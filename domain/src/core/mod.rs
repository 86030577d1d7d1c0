//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: invariant violations in domain entities
//! - [`error::LoanError`]: per-loan failure taxonomy
//! - [`output_format::OutputFormat`]: report rendering
//! - [`string::truncate_detail`]: bounded reason strings for summaries

pub mod error;
pub mod output_format;
pub mod string;
