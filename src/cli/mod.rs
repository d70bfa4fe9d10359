pub mod banner;
pub mod commands;
pub mod manifest;
pub mod scan;
pub mod serve;
pub mod verify;

pub use commands::{Cli, Commands};
