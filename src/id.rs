//! Identifier generation
//!
//! Ids are locally minted v4 UUIDs. They are not security tokens, so a
//! platform without an OS randomness source can fall back to the
//! non-crypto generator below; collision odds at personal-data scale are
//! acceptable.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

/// Generate a canonical 36-character v4 UUID string
///
/// Uses the OS randomness source. Never panics.
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a v4-shaped UUID from a non-cryptographic generator
///
/// For host platforms where OS randomness is unavailable (stripped-down
/// embedded shells, some wasm targets). The seed should carry whatever
/// entropy the host has; wall-clock nanoseconds are a reasonable default
/// via [`fallback_uuid`].
pub fn fallback_uuid_v4(seed: u64) -> String {
    let mut state = seed | 1;
    let mut bytes = [0u8; 16];
    for chunk in bytes.chunks_mut(8) {
        state = xorshift64(state);
        chunk.copy_from_slice(&state.to_le_bytes()[..chunk.len()]);
    }
    // RFC 4122: version nibble 4, variant bits 10
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes).to_string()
}

/// [`fallback_uuid_v4`] seeded from the wall clock
pub fn fallback_uuid() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0x9e37_79b9_7f4a_7c15);
    fallback_uuid_v4(nanos)
}

fn xorshift64(mut state: u64) -> u64 {
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}
