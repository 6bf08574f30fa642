// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the shielded RPC client

/// Package name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "x25519-key-agreement",
    "hmac-sha256-key-derivation",
    "deoxys-ii-envelopes",
    "node-key-cache",
    "node-key-ttl",
    "single-flight-key-resolution",
    "shielded-queries",
    "shielded-transactions",
    "signed-queries",
    "revert-passthrough",
    "cancellation",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Shielded RPC v{}", VERSION_NUMBER)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "name": NAME,
        "version": VERSION_NUMBER,
        "features": FEATURES,
    })
}
