pub mod attestations;
pub mod scans;
pub mod status;
