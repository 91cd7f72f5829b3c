// Library root module for coldsign
// This file defines the public API and module structure for the offline
// co-signing workflow: prepare an unsigned multisig message, sign it out
// of process, finalize and submit it

pub mod builder;
pub mod config;
pub mod contract;
pub mod coordinator;
pub mod errors;
pub mod message;
pub mod signing;
pub mod store;
pub mod transport;
