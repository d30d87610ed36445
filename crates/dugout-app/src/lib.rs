// Command-line application: configuration, subcommand runners, and
// plain-text reports over the stored season.

pub mod cli;
pub mod commands;
pub mod config;
pub mod report;
