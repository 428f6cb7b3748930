//! Opaque password digests.
//!
//! The credential format is deliberately minimal: the access-control core
//! only needs to compare an opaque stored hash against a presented password.

use super::sha256_hex;

pub fn digest(password: &str) -> String {
    sha256_hex(password)
}

pub fn verify(password: &str, stored_hash: &str) -> bool {
    digest(password) == stored_hash
}
