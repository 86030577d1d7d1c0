//! Loan subdomain: the unit of work.

pub mod entities;
