// crates/portainer-deployer-core/src/naming.rs
// ============================================================================
// Module: Stack Naming
// Description: Digest-based names for stacks deployed without one.
// Purpose: Give every submission a non-empty, server-safe name.
// Dependencies: sha2, time
// ============================================================================

//! ## Overview
//! Unnamed stacks are named by the SHA-256 digest of the current wall-clock
//! time. Two invocations within the same clock tick produce the same name;
//! no collision check is performed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use sha2::Digest;
use sha2::Sha256;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Generates a stack name from the current UTC time.
#[must_use]
pub fn generate_stack_name() -> String {
    let seed = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_else(|_| {
        let nanos =
            SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_nanos());
        nanos.to_string()
    });
    stack_name_for(&seed)
}

/// Returns the lowercase hex SHA-256 digest of `seed`.
#[must_use]
pub fn stack_name_for(seed: &str) -> String {
    hex_encode(&Sha256::digest(seed.as_bytes()))
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[usize::from(byte >> 4)] as char);
        out.push(HEX[usize::from(byte & 0x0f)] as char);
    }
    out
}
