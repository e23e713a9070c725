//! gz-remote: stream protocol for shipping evaluation batches to a remote
//! inference worker.

pub mod codec;
pub mod protocol;

pub use codec::{read_request, read_response, write_request, write_response, WireError};
pub use protocol::{
    BatchRequest, BatchResponse, FEATURE_LEN, MAX_BATCH, POLICY_LEN, PROTOCOL_VERSION,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
