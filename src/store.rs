// Slot store for persisted unsigned payloads
// One JSON file per workflow slot under a state directory. The persisted
// file is the single source of truth between the prepare and finalize
// phases; no in-memory handoff is assumed.

use crate::errors::FlowError;
use crate::message::{UnsignedPayload, PAYLOAD_SCHEMA_VERSION};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct SlotStore {
    dir: PathBuf,
}

impl SlotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a slot id.
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("unsigned_{slot}.json"))
    }

    /// Persist an unsigned payload. An occupied slot is an error unless
    /// `overwrite` is set, so two concurrent intents cannot silently
    /// clobber each other.
    pub async fn put(
        &self,
        slot: &str,
        payload: &UnsignedPayload,
        overwrite: bool,
    ) -> Result<(), FlowError> {
        check_slot_id(slot)?;
        let path = self.slot_path(slot);
        if !overwrite && tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(FlowError::Persistence(format!(
                "slot {slot} already holds an unsigned payload ({}); \
                 finalize it or pass --force to overwrite",
                path.display()
            )));
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FlowError::Persistence(format!("create {}: {e}", self.dir.display())))?;
        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| FlowError::Persistence(format!("encode payload: {e}")))?;
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| FlowError::Persistence(format!("write {}: {e}", path.display())))?;
        debug!(slot = %slot, path = %path.display(), "unsigned payload persisted");
        Ok(())
    }

    /// Load the payload in a slot without consuming it. Absent slot is
    /// NotFound; an unreadable file or a schema-version mismatch is a
    /// persistence error.
    pub async fn load(&self, slot: &str) -> Result<UnsignedPayload, FlowError> {
        check_slot_id(slot)?;
        let path = self.slot_path(slot);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FlowError::NotFound(format!(
                    "slot {slot} is empty; run prepare first"
                )))
            }
            Err(e) => {
                return Err(FlowError::Persistence(format!(
                    "read {}: {e}",
                    path.display()
                )))
            }
        };
        let payload: UnsignedPayload = serde_json::from_str(&text)
            .map_err(|e| FlowError::Persistence(format!("decode {}: {e}", path.display())))?;
        if payload.schema != PAYLOAD_SCHEMA_VERSION {
            return Err(FlowError::Persistence(format!(
                "slot {slot} holds schema version {} but this build reads {}",
                payload.schema, PAYLOAD_SCHEMA_VERSION
            )));
        }
        Ok(payload)
    }

    pub async fn exists(&self, slot: &str) -> bool {
        tokio::fs::try_exists(self.slot_path(slot)).await.unwrap_or(false)
    }

    /// Remove a slot file. Idempotent; returns whether a file was removed.
    pub async fn remove(&self, slot: &str) -> Result<bool, FlowError> {
        check_slot_id(slot)?;
        let path = self.slot_path(slot);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(slot = %slot, "slot cleaned up");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FlowError::Persistence(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Load and consume a slot in one step.
    pub async fn take(&self, slot: &str) -> Result<UnsignedPayload, FlowError> {
        let payload = self.load(slot).await?;
        self.remove(slot).await?;
        Ok(payload)
    }
}

/// Slot ids become file names; keep them to a safe character set.
fn check_slot_id(slot: &str) -> Result<(), FlowError> {
    if slot.is_empty()
        || !slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(FlowError::Persistence(format!(
            "invalid slot id {slot:?}: use letters, digits, '-', '_' or '.'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{expire_after, CallDescriptor, WorkflowKind};
    use serde_json::json;

    fn sample_payload() -> UnsignedPayload {
        UnsignedPayload {
            schema: PAYLOAD_SCHEMA_VERSION,
            kind: WorkflowKind::Deploy,
            descriptor: CallDescriptor::deploy(json!({}), Default::default(), expire_after(600)),
            to_sign: vec![1, 2, 3],
            context: json!({"unsignedBytesBase64": "AQID"}),
            address: Some("0:feed".into()),
        }
    }

    #[tokio::test]
    async fn put_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.put("deploy", &sample_payload(), false).await.unwrap();
        let back = store.load("deploy").await.unwrap();
        assert_eq!(back.to_sign, vec![1, 2, 3]);
        assert_eq!(back.context, json!({"unsignedBytesBase64": "AQID"}));
        assert_eq!(back.address.as_deref(), Some("0:feed"));
        assert!(store.exists("deploy").await);
    }

    #[tokio::test]
    async fn occupied_slot_is_refused_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.put("deploy", &sample_payload(), false).await.unwrap();
        let err = store.put("deploy", &sample_payload(), false).await.unwrap_err();
        assert!(matches!(err, FlowError::Persistence(_)));
        // explicit overwrite restores the old single-slot behavior
        store.put("deploy", &sample_payload(), true).await.unwrap();
    }

    #[tokio::test]
    async fn take_consumes_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.put("transfer", &sample_payload(), false).await.unwrap();
        store.take("transfer").await.unwrap();
        assert!(matches!(
            store.take("transfer").await,
            Err(FlowError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store.put("x", &sample_payload(), false).await.unwrap();
        assert!(store.remove("x").await.unwrap());
        assert!(!store.remove("x").await.unwrap());
    }

    #[tokio::test]
    async fn schema_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        let mut payload = sample_payload();
        payload.schema = PAYLOAD_SCHEMA_VERSION + 1;
        store.put("deploy", &payload, false).await.unwrap();
        let err = store.load("deploy").await.unwrap_err();
        assert!(matches!(err, FlowError::Persistence(_)));
    }

    #[tokio::test]
    async fn hostile_slot_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        for bad in ["", "../etc", "a/b", "a b"] {
            assert!(store.put(bad, &sample_payload(), false).await.is_err());
        }
    }
}
