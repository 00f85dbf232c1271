//! CLI module for trainsign - command-line interface and subcommands.
//!
//! Runs the resident loop by default; the other subcommands exercise one
//! component at a time for bench testing.

pub mod commands;

pub use commands::Cli;
