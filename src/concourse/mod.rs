//! Adapter around the `fly` command-line tool.

pub mod client;
pub mod executor;
pub mod outcome;
pub mod parser;

pub use client::{CiClient, Client, Connector};
pub use outcome::{OperationKind, OperationOutput};
