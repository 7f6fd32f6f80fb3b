mod keys;
mod signing;

pub use keys::{KeyError, PinnedKey};
pub use signing::{hash_message, verify_detached, VerificationOutcome};

/*
 * Cryptography module
 *
 * - Loading the issuing authority's pinned RSA public key
 * - Detached RSA PKCS#1 v1.5 / SHA-256 signature verification
 */
