//! JSON canónico y huellas blake3 para identificar transiciones.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{fingerprint, hash_str};
