pub mod parser;
pub mod types;

pub use types::*;
pub use parser::{find_rules_file, parse_rules_file};
