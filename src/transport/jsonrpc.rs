// JSON-RPC transport layer implementation
// This file implements the JSON-RPC client used both for talking to the
// client-SDK bridge (message construction) and for submitting finalized
// messages to the network

use crate::errors::FlowError;
use crate::message::{FinalizedMessage, WorkflowKind};
use crate::transport::{RawOutcome, Transport};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct JsonRpc {
    http: Client,
    url: Url,
}

impl JsonRpc {
    /// Build a client with a hard per-request timeout; every workflow
    /// phase performs exactly one round trip, so the timeout bounds the
    /// whole phase.
    pub fn new(url: Url, timeout: Duration) -> Result<Self, FlowError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FlowError::Transport(format!("build http client: {e}")))?;
        Ok(Self { http, url })
    }

    pub fn endpoint(&self) -> &Url {
        &self.url
    }

    /// Single JSON-RPC round trip. Network and HTTP-level failures are
    /// transport errors; a JSON-RPC `error` member is surfaced verbatim
    /// so the caller can classify it by phase.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, FlowError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(self.url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| FlowError::Transport(format!("{method} send: {e}")))?;
        if !resp.status().is_success() {
            return Err(FlowError::Transport(format!(
                "{method}: http {}",
                resp.status()
            )));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| FlowError::Transport(format!("{method} json parse: {e}")))?;
        if let Some(err) = body.get("error") {
            return Err(FlowError::Transport(format!("{method}: {err}")));
        }
        match body.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(FlowError::Transport(format!(
                "{method}: response carried neither result nor error"
            ))),
        }
    }
}

#[async_trait]
impl Transport for JsonRpc {
    async fn submit(&self, message: &FinalizedMessage) -> Result<RawOutcome, FlowError> {
        let method = match message.kind {
            WorkflowKind::Deploy => "contracts.process_deploy_message",
            WorkflowKind::Transfer => "contracts.process_run_message",
        };
        let result = self
            .call(method, json!({ "message": message.body }))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| FlowError::Transport(format!("{method} decode result: {e}")))
    }
}
