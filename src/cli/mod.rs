mod args;
pub mod command;
pub mod repl;

pub use args::{Args, Command, OutputFormat};
