//! CLI module for postloop - command-line interface and subcommands.
//!
//! Runs queries against a content fixture and walks the resulting loop,
//! printing each item as a template would see it.

pub mod commands;

pub use commands::Cli;
