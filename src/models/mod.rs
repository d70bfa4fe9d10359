pub mod finding;
pub mod manifest;
pub mod scan_result;

pub use finding::*;
pub use manifest::*;
pub use scan_result::*;
