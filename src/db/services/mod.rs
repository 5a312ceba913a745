//! Database access functions, one sub-module per table.
//!
//! Callers outside `db` normally go through [`crate::monitor::registry`]
//! rather than these functions directly.

pub mod ip_service;
pub mod settings_service;
