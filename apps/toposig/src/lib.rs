//! # toposig
//!
//! Command-line front end of the topology signature engine.
//!
//! The library target exposes the CLI, configuration and report modules so
//! integration tests can drive them without spawning the binary.

pub mod cli;
pub mod config;
pub mod report;
