//! Stream codec for the batch protocol.
//!
//! Messages are self-delimiting: a fixed header names the batch and its
//! element width, and the body length follows from those fields, so there is
//! no separate length-prefix framing layer. Readers validate every header
//! field before trusting any size derived from it.

use std::io::{self, Read, Write};

use thiserror::Error;

use gz_features::BoardFeatures;

use crate::protocol::{
    BatchRequest, BatchResponse, MsgKind, FEATURE_LEN, MAX_BATCH, POLICY_LEN, PROTOCOL_VERSION,
};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported protocol version: {0}")]
    BadVersion(u32),
    #[error("unexpected message kind: {0}")]
    BadKind(u8),
    #[error("invalid element length: got {got}, expected {expected}")]
    BadElemLen { got: u32, expected: u32 },
    #[error("empty batch")]
    EmptyBatch,
    #[error("batch of {got} entries exceeds the wire limit {max}")]
    BatchTooLarge { got: u32, max: u32 },
    #[error("invalid plane byte: {0}")]
    BadPlaneByte(u8),
}

/// version u32 | kind u8 | flags u8 | reserved u16 | batch_id u64 |
/// batch_size u32 | elem_len u32.
const HEADER_LEN: usize = 24;

fn encode_header(kind: MsgKind, batch_id: u64, batch_size: u32, elem_len: u32) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    header[4] = kind as u8;
    header[8..16].copy_from_slice(&batch_id.to_le_bytes());
    header[16..20].copy_from_slice(&batch_size.to_le_bytes());
    header[20..24].copy_from_slice(&elem_len.to_le_bytes());
    header
}

struct Header {
    batch_id: u64,
    batch_size: u32,
}

fn read_header<R: Read>(
    r: &mut R,
    expected_kind: MsgKind,
    expected_elem_len: u32,
) -> Result<Header, WireError> {
    let mut header = [0u8; HEADER_LEN];
    r.read_exact(&mut header)?;

    let version = u32::from_le_bytes(header[..4].try_into().unwrap());
    if version != PROTOCOL_VERSION {
        return Err(WireError::BadVersion(version));
    }
    if header[4] != expected_kind as u8 {
        return Err(WireError::BadKind(header[4]));
    }
    let batch_id = u64::from_le_bytes(header[8..16].try_into().unwrap());
    let batch_size = u32::from_le_bytes(header[16..20].try_into().unwrap());
    let elem_len = u32::from_le_bytes(header[20..24].try_into().unwrap());

    if batch_size == 0 {
        return Err(WireError::EmptyBatch);
    }
    // A corrupt header must not be able to demand an absurd allocation.
    if batch_size > MAX_BATCH {
        return Err(WireError::BatchTooLarge {
            got: batch_size,
            max: MAX_BATCH,
        });
    }
    if elem_len != expected_elem_len {
        return Err(WireError::BadElemLen {
            got: elem_len,
            expected: expected_elem_len,
        });
    }

    Ok(Header {
        batch_id,
        batch_size,
    })
}

/// Writes one evaluation batch, quantizing each binary plane value to a
/// byte.
pub fn write_request<W: Write>(
    w: &mut W,
    batch_id: u64,
    features: &[BoardFeatures],
) -> Result<(), WireError> {
    let batch_size = features.len() as u32;
    debug_assert!(batch_size >= 1 && batch_size <= MAX_BATCH);
    w.write_all(&encode_header(
        MsgKind::Request,
        batch_id,
        batch_size,
        FEATURE_LEN,
    ))?;

    let mut planes = Vec::with_capacity(features.len() * FEATURE_LEN as usize);
    for entry in features {
        for &f in entry.iter() {
            planes.push(if f >= 0.5 { 1 } else { 0 });
        }
    }
    w.write_all(&planes)?;
    w.flush()?;
    Ok(())
}

/// Reads one evaluation batch; the body length follows from the validated
/// header.
pub fn read_request<R: Read>(r: &mut R) -> Result<BatchRequest, WireError> {
    let header = read_header(r, MsgKind::Request, FEATURE_LEN)?;

    let mut planes = vec![0u8; header.batch_size as usize * FEATURE_LEN as usize];
    r.read_exact(&mut planes)?;
    for &b in &planes {
        if b > 1 {
            return Err(WireError::BadPlaneByte(b));
        }
    }

    Ok(BatchRequest {
        batch_id: header.batch_id,
        batch_size: header.batch_size,
        planes,
    })
}

/// Writes the worker's outputs for one batch: policies entry-major, then
/// values.
pub fn write_response<W: Write>(w: &mut W, resp: &BatchResponse) -> Result<(), WireError> {
    let batch_size = resp.values.len() as u32;
    debug_assert_eq!(resp.policies.len(), resp.values.len() * POLICY_LEN as usize);
    w.write_all(&encode_header(
        MsgKind::Response,
        resp.batch_id,
        batch_size,
        POLICY_LEN,
    ))?;

    let mut body = Vec::with_capacity(4 * (resp.policies.len() + resp.values.len()));
    for &f in &resp.policies {
        body.extend_from_slice(&f.to_le_bytes());
    }
    for &f in &resp.values {
        body.extend_from_slice(&f.to_le_bytes());
    }
    w.write_all(&body)?;
    w.flush()?;
    Ok(())
}

pub fn read_response<R: Read>(r: &mut R) -> Result<BatchResponse, WireError> {
    let header = read_header(r, MsgKind::Response, POLICY_LEN)?;
    let n = header.batch_size as usize;

    let mut body = vec![0u8; 4 * n * (POLICY_LEN as usize + 1)];
    r.read_exact(&mut body)?;

    let mut floats = body
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes(c.try_into().unwrap()));
    let policies: Vec<f32> = floats.by_ref().take(n * POLICY_LEN as usize).collect();
    let values: Vec<f32> = floats.collect();

    Ok(BatchResponse {
        batch_id: header.batch_id,
        policies,
        values,
    })
}
