// ABOUTME: Library root for switchyard - exposes the orchestrator for the binary and tests.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod proxy;
pub mod retry;
pub mod runtime;
pub mod stack;
pub mod types;

#[cfg(test)]
mod testing;
