//! On-wire contract for the remote inference worker.
//!
//! Every request carries exactly the configured batch of feature arrays,
//! quantized to one byte per feature (the planes are binary); every response
//! carries the same batch of policy vectors and values. Padding travels on
//! the wire like any other entry: the client discards it, and the worker
//! never sees the difference.

pub const PROTOCOL_VERSION: u32 = 1;

/// Quantized features per batch entry (points * planes).
///
/// NOTE: keep in sync with the `gz-features` schema constants; the remote
/// engine re-checks this at construction.
#[cfg(not(feature = "board-19"))]
pub const FEATURE_LEN: u32 = 1377;
#[cfg(feature = "board-19")]
pub const FEATURE_LEN: u32 = 6137;

/// Policy outputs per batch entry (points + pass).
#[cfg(not(feature = "board-19"))]
pub const POLICY_LEN: u32 = 82;
#[cfg(feature = "board-19")]
pub const POLICY_LEN: u32 = 362;

/// Upper bound on batch entries accepted from the wire.
pub const MAX_BATCH: u32 = 65536;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgKind {
    Request = 1,
    Response = 2,
}

/// One evaluation batch on its way to the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub batch_id: u64,
    pub batch_size: u32,
    /// `batch_size * FEATURE_LEN` bytes, each 0 or 1.
    pub planes: Vec<u8>,
}

/// The worker's outputs for one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse {
    pub batch_id: u64,
    /// `batch_size * POLICY_LEN` floats, entry-major.
    pub policies: Vec<f32>,
    /// `batch_size` floats.
    pub values: Vec<f32>,
}
