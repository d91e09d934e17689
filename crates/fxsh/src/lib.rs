//! # fxsh
//!
//! A line-oriented interpreter for deploying and calling functions.

pub mod command;
pub mod settings;
pub mod shell;

pub use command::Command;
pub use command::ParseError;
pub use command::parse;
pub use settings::Settings;
pub use shell::Error;
pub use shell::Outcome;
pub use shell::Shell;

#[cfg(test)]
mod tests;
