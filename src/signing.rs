// External signature handling
// Shape checks and encoding conversion for signatures produced outside
// this process (hardware key, air-gapped signer). No key material and no
// cryptographic verification lives here.

use crate::errors::FlowError;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Raw signature bytes produced by an external signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalSignature {
    raw: Vec<u8>,
}

impl ExternalSignature {
    /// Parse a hex-encoded signature as handed back by the out-of-process
    /// signer. Only the shape is checked: non-empty, even length, valid
    /// hex. Whether the length fits the declared key scheme is for the
    /// message builder to decide.
    pub fn from_hex(hex_str: &str) -> Result<Self, FlowError> {
        let trimmed = hex_str.trim();
        if trimmed.is_empty() {
            return Err(FlowError::MalformedSignature("empty signature".into()));
        }
        let raw = hex::decode(trimmed)
            .map_err(|e| FlowError::MalformedSignature(format!("bad hex: {e}")))?;
        Ok(Self { raw })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Base64 form the client-SDK bridge expects on the wire.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.raw)
    }
}
