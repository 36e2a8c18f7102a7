//! CLI module for haggle

pub mod app;
pub mod commands;

pub use app::{BatchReport, HaggleApp};
pub use commands::{Cli, Commands, LlmArgs, OutputArgs};
