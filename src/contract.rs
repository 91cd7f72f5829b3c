// Multisig wallet contract descriptor
// Embedded ABI for the SetcodeMultisigWallet functions this tool drives
// (constructor and sendTransaction) and helpers that shape their
// argument maps.

use serde_json::{json, Map, Value};

/// ABI descriptor for the multisig wallet, trimmed to the entry points
/// used by the deploy and transfer flows. Treated as an opaque blob by
/// everything downstream of the call descriptor.
const MULTISIG_ABI_JSON: &str = r#"{
    "ABI version": 2,
    "header": ["pubkey", "time", "expire"],
    "functions": [
        {
            "name": "constructor",
            "inputs": [
                {"name": "owners", "type": "uint256[]"},
                {"name": "reqConfirms", "type": "uint8"}
            ],
            "outputs": []
        },
        {
            "name": "sendTransaction",
            "inputs": [
                {"name": "dest", "type": "address"},
                {"name": "value", "type": "uint128"},
                {"name": "bounce", "type": "bool"},
                {"name": "flags", "type": "uint8"},
                {"name": "payload", "type": "cell"}
            ],
            "outputs": []
        }
    ],
    "data": [],
    "events": []
}"#;

pub const SEND_TRANSACTION: &str = "sendTransaction";

pub fn multisig_abi() -> Value {
    serde_json::from_str(MULTISIG_ABI_JSON).expect("embedded multisig ABI is valid JSON")
}

/// Constructor arguments for a fresh wallet. With no explicit owners the
/// deploying public key becomes the sole owner.
pub fn constructor_args(owners: &[String], req_confirms: u8) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("owners".into(), json!(owners));
    args.insert("reqConfirms".into(), json!(req_confirms));
    args
}

/// `sendTransaction` arguments in declaration order.
pub fn transfer_args(
    dest: &str,
    value: u64,
    bounce: bool,
    flags: u8,
    payload: &str,
) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("dest".into(), json!(dest));
    args.insert("value".into(), json!(value));
    args.insert("bounce".into(), json!(bounce));
    args.insert("flags".into(), json!(flags));
    args.insert("payload".into(), json!(payload));
    args
}

/// `0x`-prefixed owner entry for a raw hex public key.
pub fn owner_from_public_key(public_key: &str) -> String {
    let stripped = public_key.trim_start_matches("0x");
    format!("0x{stripped}")
}
