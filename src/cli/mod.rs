//! CLI command implementations

pub mod integration;
pub mod session;
