// Workflow data model
// This file defines the call descriptor, the persisted unsigned payload
// envelope, the finalized message, and the submission outcome

use crate::errors::FlowError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Version tag of the persisted payload envelope. Bumped on any change to
/// the on-disk shape so a stale slot file is rejected instead of misread.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowKind {
    Deploy,
    Transfer,
}

impl WorkflowKind {
    /// Default slot id for this workflow, one per kind for parity with the
    /// classic two-fixed-files layout.
    pub fn default_slot(&self) -> &'static str {
        match self {
            WorkflowKind::Deploy => "deploy",
            WorkflowKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Deploy => write!(f, "deploy"),
            WorkflowKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// Description of a contract deploy or call to turn into an unsigned
/// message. `contract_address` and `function_name` are both absent for a
/// deploy and both present for a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub contract_address: Option<String>,
    /// Opaque ABI descriptor, passed through to the message builder.
    pub abi: Value,
    pub function_name: Option<String>,
    /// Call arguments in caller order (constructor params for a deploy).
    pub arguments: Map<String, Value>,
    /// Unix time after which the network refuses the message.
    pub expire_at: u64,
}

impl CallDescriptor {
    pub fn deploy(abi: Value, constructor_args: Map<String, Value>, expire_at: u64) -> Self {
        Self {
            contract_address: None,
            abi,
            function_name: None,
            arguments: constructor_args,
            expire_at,
        }
    }

    pub fn call(
        contract_address: impl Into<String>,
        abi: Value,
        function_name: impl Into<String>,
        arguments: Map<String, Value>,
        expire_at: u64,
    ) -> Self {
        Self {
            contract_address: Some(contract_address.into()),
            abi,
            function_name: Some(function_name.into()),
            arguments,
            expire_at,
        }
    }

    pub fn kind(&self) -> WorkflowKind {
        if self.contract_address.is_none() {
            WorkflowKind::Deploy
        } else {
            WorkflowKind::Transfer
        }
    }

    /// Check the descriptor invariants before handing it to the builder:
    /// address and function name must agree on deploy vs. call, and the
    /// expiration must still be in the future.
    pub fn validate(&self) -> Result<(), FlowError> {
        match (&self.contract_address, &self.function_name) {
            (None, None) | (Some(_), Some(_)) => {}
            (Some(_), None) => {
                return Err(FlowError::Builder(
                    "contract address given without a function name".into(),
                ))
            }
            (None, Some(f)) => {
                return Err(FlowError::Builder(format!(
                    "function name {f} given without a contract address"
                )))
            }
        }
        if self.expire_at <= epoch_now() {
            return Err(FlowError::Builder(format!(
                "expiration {} is not in the future",
                self.expire_at
            )));
        }
        Ok(())
    }
}

/// Seconds since the Unix epoch.
pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Expiration timestamp `window_secs` from now.
pub fn expire_after(window_secs: u64) -> u64 {
    epoch_now() + window_secs
}

/// Unsigned message plus the exact bytes an external signer must sign.
/// Immutable once created; persisted as JSON between the prepare and
/// finalize phases, which may run as separate process invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedPayload {
    pub schema: u32,
    pub kind: WorkflowKind,
    pub descriptor: CallDescriptor,
    /// Bytes requiring a signature, base64 in the persisted form.
    #[serde(with = "b64_bytes")]
    pub to_sign: Vec<u8>,
    /// Builder-owned context needed to finalize later. Round-tripped
    /// losslessly; never inspected here.
    pub context: Value,
    /// Computed account address, known at prepare time for deploys.
    pub address: Option<String>,
}

impl UnsignedPayload {
    pub fn to_sign_hex(&self) -> String {
        hex::encode(&self.to_sign)
    }

    pub fn is_expired(&self) -> bool {
        self.descriptor.expire_at <= epoch_now()
    }
}

mod b64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// Unsigned payload combined with an external signature, ready for
/// submission. `body` is the builder's finalized message blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedMessage {
    pub slot: String,
    pub kind: WorkflowKind,
    pub body: Value,
}

/// Interpreted result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Deployed { address: String },
    Aborted { reason: String },
    Completed,
    TransportError { detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn deploy_and_call_report_their_kind() {
        let d = CallDescriptor::deploy(json!({}), args(&[]), expire_after(600));
        assert_eq!(d.kind(), WorkflowKind::Deploy);
        let c = CallDescriptor::call("0:ab", json!({}), "sendTransaction", args(&[]), expire_after(600));
        assert_eq!(c.kind(), WorkflowKind::Transfer);
    }

    #[test]
    fn stale_expiration_is_rejected() {
        let mut d = CallDescriptor::deploy(json!({}), args(&[]), expire_after(600));
        assert!(d.validate().is_ok());
        d.expire_at = epoch_now().saturating_sub(1);
        assert!(matches!(d.validate(), Err(FlowError::Builder(_))));
    }

    #[test]
    fn address_without_function_is_rejected() {
        let mut d = CallDescriptor::call("0:ab", json!({}), "f", args(&[]), expire_after(600));
        d.function_name = None;
        assert!(matches!(d.validate(), Err(FlowError::Builder(_))));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = UnsignedPayload {
            schema: PAYLOAD_SCHEMA_VERSION,
            kind: WorkflowKind::Transfer,
            descriptor: CallDescriptor::call(
                "0:01",
                json!({"ABI version": 2}),
                "sendTransaction",
                args(&[("dest", json!("0:02")), ("value", json!(1_000_000_000u64))]),
                expire_after(600),
            ),
            to_sign: vec![0xde, 0xad, 0xbe, 0xef],
            context: json!({"unsignedBytesBase64": "AAEC"}),
            address: None,
        };
        let text = serde_json::to_string(&payload).unwrap();
        let back: UnsignedPayload = serde_json::from_str(&text).unwrap();
        assert_eq!(back.to_sign, payload.to_sign);
        assert_eq!(back.context, payload.context);
        assert_eq!(back.descriptor.arguments, payload.descriptor.arguments);
        assert_eq!(back.to_sign_hex(), "deadbeef");
    }

    #[test]
    fn argument_order_is_preserved() {
        let d = CallDescriptor::call(
            "0:01",
            json!({}),
            "sendTransaction",
            args(&[
                ("dest", json!("0:02")),
                ("value", json!(1u64)),
                ("bounce", json!(false)),
                ("flags", json!(0)),
                ("payload", json!("")),
            ]),
            expire_after(600),
        );
        let keys: Vec<&str> = d.arguments.keys().map(String::as_str).collect();
        assert_eq!(keys, ["dest", "value", "bounce", "flags", "payload"]);
    }
}
