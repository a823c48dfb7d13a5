//! Command-line host for the importer: configuration, logging, state
//! persistence and the commands that drive the core and engine.
pub mod args;
pub mod commands;
pub mod config;
pub mod platform;
