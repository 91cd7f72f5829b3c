// Message builder capability
// Constructs unsigned deploy/call messages and later combines them with
// an externally produced signature. The actual encoding lives in the
// client SDK, reached here over its JSON-RPC bridge.

use crate::errors::FlowError;
use crate::message::{CallDescriptor, UnsignedPayload, WorkflowKind};
use crate::signing::ExternalSignature;
use crate::transport::jsonrpc::JsonRpc;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};

/// Pieces the builder hands back for a freshly constructed unsigned
/// message: the bytes to sign, the opaque context needed to finalize,
/// and the computed address when one is known at this point.
#[derive(Debug, Clone)]
pub struct UnsignedParts {
    pub to_sign: Vec<u8>,
    pub context: Value,
    pub address: Option<String>,
}

/// Message-construction capability. Implementations own the wire format
/// entirely; the coordinator only moves the opaque context between the
/// two phases.
#[async_trait]
pub trait MessageBuilder: Send + Sync {
    async fn build_unsigned(&self, descriptor: &CallDescriptor) -> Result<UnsignedParts, FlowError>;

    async fn combine(
        &self,
        payload: &UnsignedPayload,
        signature: &ExternalSignature,
    ) -> Result<Value, FlowError>;
}

/// Signature length the wallet's Ed25519 key scheme requires.
const ED25519_SIGNATURE_LEN: usize = 64;

/// MessageBuilder backed by the client-SDK bridge over JSON-RPC.
#[derive(Debug, Clone)]
pub struct SdkRpcBuilder {
    rpc: JsonRpc,
    public_key: String,
    /// Base64 contract image, required for the deploy flow only.
    image_base64: Option<String>,
}

impl SdkRpcBuilder {
    pub fn new(rpc: JsonRpc, public_key: impl Into<String>, image_base64: Option<String>) -> Self {
        Self {
            rpc,
            public_key: public_key.into(),
            image_base64,
        }
    }

    fn deploy_params(&self, descriptor: &CallDescriptor) -> Result<Value, FlowError> {
        let image = self.image_base64.as_deref().ok_or_else(|| {
            FlowError::Builder("deploy flow needs a contract image (deploy.image in config)".into())
        })?;
        Ok(json!({
            "abi": descriptor.abi,
            "imageBase64": image,
            "constructorParams": descriptor.arguments,
            "constructorHeader": { "expire": descriptor.expire_at },
            "publicKey": self.public_key,
        }))
    }

    fn run_params(&self, descriptor: &CallDescriptor) -> Result<Value, FlowError> {
        let address = descriptor
            .contract_address
            .as_deref()
            .ok_or_else(|| FlowError::Builder("call descriptor has no contract address".into()))?;
        let function = descriptor
            .function_name
            .as_deref()
            .ok_or_else(|| FlowError::Builder("call descriptor has no function name".into()))?;
        Ok(json!({
            "address": address,
            "abi": descriptor.abi,
            "functionName": function,
            "header": { "expire": descriptor.expire_at },
            "input": descriptor.arguments,
            "publicKey": self.public_key,
        }))
    }
}

#[async_trait]
impl MessageBuilder for SdkRpcBuilder {
    async fn build_unsigned(&self, descriptor: &CallDescriptor) -> Result<UnsignedParts, FlowError> {
        let (method, params) = match descriptor.kind() {
            WorkflowKind::Deploy => (
                "contracts.create_unsigned_deploy_message",
                self.deploy_params(descriptor)?,
            ),
            WorkflowKind::Transfer => (
                "contracts.create_unsigned_run_message",
                self.run_params(descriptor)?,
            ),
        };
        // A transport failure while constructing the message is a builder
        // failure from the workflow's point of view.
        let result = self
            .rpc
            .call(method, params)
            .await
            .map_err(|e| FlowError::Builder(e.to_string()))?;

        let to_sign_b64 = result["signParams"]["bytesToSignBase64"]
            .as_str()
            .ok_or_else(|| {
                FlowError::Builder(format!("{method}: result lacks signParams.bytesToSignBase64"))
            })?;
        let to_sign = STANDARD
            .decode(to_sign_b64)
            .map_err(|e| FlowError::Builder(format!("{method}: bytesToSignBase64: {e}")))?;
        if to_sign.is_empty() {
            return Err(FlowError::Builder(format!("{method}: empty bytes to sign")));
        }
        let address = result["address"].as_str().map(str::to_owned);
        Ok(UnsignedParts {
            to_sign,
            context: result,
            address,
        })
    }

    async fn combine(
        &self,
        payload: &UnsignedPayload,
        signature: &ExternalSignature,
    ) -> Result<Value, FlowError> {
        if signature.len() != ED25519_SIGNATURE_LEN {
            return Err(FlowError::Combine(format!(
                "signature is {} bytes, Ed25519 needs {ED25519_SIGNATURE_LEN}",
                signature.len()
            )));
        }
        let method = match payload.kind {
            WorkflowKind::Deploy => "contracts.create_signed_deploy_message",
            WorkflowKind::Transfer => "contracts.create_signed_run_message",
        };
        let params = json!({
            "unsignedMessage": payload.context,
            "signBytesBase64": signature.to_base64(),
        });
        self.rpc
            .call(method, params)
            .await
            .map_err(|e| FlowError::Combine(e.to_string()))
    }
}
