use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;

/// Hashea un string y devuelve hex (64 caracteres).
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Huella estable de un valor JSON (hash de su forma canónica).
pub fn fingerprint(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}
