pub mod changelog;
pub mod cli;
pub mod command;
pub mod completion;
pub mod config;
pub mod container;
pub mod error;
pub mod forge;
pub mod git;
pub mod http;
pub mod process;
pub mod version;

pub use cli::{Args, Command};
pub use error::{AutoshipError, Result};

#[cfg(test)]
pub mod test_helpers;
