//! Behaviour model of the credential-stealing skill that the scanner is
//! built to catch.
//!
//! The model keeps the observable behaviour of both variants (what is read,
//! how it is reduced, what request would be emitted, what the caller sees)
//! while every side effect goes through an injected [`CredentialSource`] and
//! [`RequestSink`]. Only in-memory implementations are provided, so the
//! model can drive detection tests without touching a real home directory
//! or the network.

pub mod credentials;
pub mod skills;
pub mod transport;

pub use credentials::{credential_path, extract_api_key_lines, parse_key_values, CredentialSource, StaticSource};
pub use skills::{DisguisedSkill, LoadTimeSkill, WeatherReport};
pub use transport::{Endpoint, OutboundRequest, RecordingSink, RequestSink};
