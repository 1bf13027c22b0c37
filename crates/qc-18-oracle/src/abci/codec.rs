//! Wire codec for vote-extension payloads
//!
//! Frame layout: `u32 big-endian body length || bincode body`. A frame must
//! be consumed exactly; a short frame or trailing bytes are errors.

use crate::domain::OracleError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Frame header size in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest body accepted by [`decode_frame`].
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("frame too short: need {expected} bytes, got {actual}")]
    ShortFrame { expected: usize, actual: usize },

    #[error("{0} trailing bytes after frame")]
    TrailingBytes(usize),

    #[error("frame body of {0} bytes exceeds limit")]
    TooLarge(usize),

    #[error("bincode: {0}")]
    Body(String),
}

impl From<CodecError> for OracleError {
    fn from(e: CodecError) -> Self {
        OracleError::Codec(e.to_string())
    }
}

pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let body = bincode::serialize(value).map_err(|e| CodecError::Body(e.to_string()))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(CodecError::TooLarge(body.len()));
    }
    let len = u32::try_from(body.len()).map_err(|_| CodecError::TooLarge(body.len()))?;

    let mut out = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(CodecError::ShortFrame {
            expected: FRAME_HEADER_LEN,
            actual: bytes.len(),
        });
    }
    let (header, rest) = bytes.split_at(FRAME_HEADER_LEN);
    let mut len_bytes = [0u8; FRAME_HEADER_LEN];
    len_bytes.copy_from_slice(header);
    let len = u32::from_be_bytes(len_bytes) as usize;

    if len > MAX_FRAME_LEN {
        return Err(CodecError::TooLarge(len));
    }
    if rest.len() < len {
        return Err(CodecError::ShortFrame {
            expected: FRAME_HEADER_LEN + len,
            actual: bytes.len(),
        });
    }
    if rest.len() > len {
        return Err(CodecError::TrailingBytes(rest.len() - len));
    }

    bincode::deserialize(rest).map_err(|e| CodecError::Body(e.to_string()))
}

/// Bytes a validator signs for its vote extension in the commit of `height`.
pub fn vote_extension_sign_bytes(
    height: u64,
    round: i32,
    chain_id: &str,
    extension: &[u8],
) -> Result<Vec<u8>, CodecError> {
    bincode::serialize(&(height, round, chain_id, extension))
        .map_err(|e| CodecError::Body(e.to_string()))
}
