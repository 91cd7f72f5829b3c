// Transport layer
// Capability for delivering a finalized message to the network and the
// raw result shape it reports back

pub mod jsonrpc;

use crate::errors::FlowError;
use crate::message::FinalizedMessage;
use async_trait::async_trait;
use serde::Deserialize;

/// Network-submission capability. Implementations send a finalized
/// message and await the processing outcome in a single round trip;
/// retries are the caller's responsibility.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, message: &FinalizedMessage) -> Result<RawOutcome, FlowError>;
}

/// Unmapped submission result as the network reports it. The coordinator
/// interprets this into a `SubmissionOutcome`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOutcome {
    pub transaction: Option<RawTransaction>,
    /// Deployed account address, present for successful deploys.
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub aborted: bool,
    pub id: Option<String>,
    /// Compute-phase exit code when the transaction aborted on-chain.
    pub exit_code: Option<i64>,
}
