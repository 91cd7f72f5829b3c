// Offline co-signing coordinator
// Drives the three-phase workflow: prepare an unsigned message and export
// the bytes to sign, finalize it with an externally produced signature,
// and submit the result. Phases may run as separate process invocations;
// the persisted slot is the only state carried between them.

use crate::builder::MessageBuilder;
use crate::errors::FlowError;
use crate::message::{
    CallDescriptor, FinalizedMessage, SubmissionOutcome, UnsignedPayload, WorkflowKind,
    PAYLOAD_SCHEMA_VERSION,
};
use crate::signing::ExternalSignature;
use crate::store::SlotStore;
use crate::transport::{RawOutcome, Transport};
use tracing::{info, warn};

pub struct OfflineSigningCoordinator<B, T> {
    builder: B,
    transport: T,
    store: SlotStore,
}

impl<B: MessageBuilder, T: Transport> OfflineSigningCoordinator<B, T> {
    pub fn new(builder: B, transport: T, store: SlotStore) -> Self {
        Self {
            builder,
            transport,
            store,
        }
    }

    pub fn store(&self) -> &SlotStore {
        &self.store
    }

    /// Build an unsigned message for the descriptor and persist it under
    /// `slot` for the out-of-process signer. An occupied slot is refused
    /// unless `overwrite` is set.
    pub async fn prepare(
        &self,
        slot: &str,
        descriptor: CallDescriptor,
        overwrite: bool,
    ) -> Result<UnsignedPayload, FlowError> {
        descriptor.validate()?;
        let kind = descriptor.kind();
        let parts = self.builder.build_unsigned(&descriptor).await?;
        let payload = UnsignedPayload {
            schema: PAYLOAD_SCHEMA_VERSION,
            kind,
            descriptor,
            to_sign: parts.to_sign,
            context: parts.context,
            address: parts.address,
        };
        self.store.put(slot, &payload, overwrite).await?;
        info!(
            slot = %slot,
            kind = %kind,
            to_sign_bytes = payload.to_sign.len(),
            address = payload.address.as_deref().unwrap_or("-"),
            "unsigned payload prepared"
        );
        Ok(payload)
    }

    /// Combine the persisted unsigned payload with an external signature.
    /// The signature's shape is validated before the slot is touched, so
    /// a malformed signature never mutates persisted state. On success
    /// the slot is consumed; a second finalize reports NotFound.
    pub async fn finalize(
        &self,
        slot: &str,
        signature_hex: &str,
    ) -> Result<FinalizedMessage, FlowError> {
        let signature = ExternalSignature::from_hex(signature_hex)?;
        let payload = self.store.load(slot).await?;
        if payload.is_expired() {
            // The network is authoritative on expiration; submit anyway.
            warn!(
                slot = %slot,
                expire_at = payload.descriptor.expire_at,
                "unsigned payload has expired locally, the network will likely reject it"
            );
        }
        let body = self.builder.combine(&payload, &signature).await?;
        self.store.remove(slot).await?;
        info!(slot = %slot, kind = %payload.kind, "message finalized, slot consumed");
        Ok(FinalizedMessage {
            slot: slot.to_owned(),
            kind: payload.kind,
            body,
        })
    }

    /// Submit a finalized message and interpret the network's verdict.
    /// Once a submission attempt completes, slot cleanup is attempted
    /// exactly once whatever the on-chain outcome was; a transport-level
    /// failure leaves any remaining slot alone so the operator can retry.
    pub async fn submit(&self, message: &FinalizedMessage) -> SubmissionOutcome {
        let raw = match self.transport.submit(message).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(slot = %message.slot, error = %err, "submission attempt failed");
                return SubmissionOutcome::TransportError {
                    detail: err.to_string(),
                };
            }
        };
        let outcome = interpret_outcome(message.kind, raw);
        match self.store.remove(&message.slot).await {
            Ok(removed) => {
                if removed {
                    info!(slot = %message.slot, "slot cleaned up after submission");
                }
            }
            Err(err) => warn!(slot = %message.slot, error = %err, "slot cleanup failed"),
        }
        outcome
    }
}

/// Map the network's raw result onto the outcome taxonomy.
fn interpret_outcome(kind: WorkflowKind, raw: RawOutcome) -> SubmissionOutcome {
    let tx = match raw.transaction {
        Some(tx) => tx,
        None => {
            return SubmissionOutcome::TransportError {
                detail: "submission result carried no transaction".into(),
            }
        }
    };
    if tx.aborted {
        let reason = match tx.exit_code {
            Some(code) => format!("aborted with exit code {code}"),
            None => "aborted by the network".into(),
        };
        return SubmissionOutcome::Aborted { reason };
    }
    match (kind, raw.address) {
        (WorkflowKind::Deploy, Some(address)) => SubmissionOutcome::Deployed { address },
        _ => SubmissionOutcome::Completed,
    }
}
