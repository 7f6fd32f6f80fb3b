//! Verified identity extraction from Aadhaar QR codes.
//!
//! Supports the signed "Secure QR" numeric format and the older XML format,
//! falling back from the former to the latter except when a signature is
//! explicitly invalid.

pub mod codec;
pub mod crypto;
pub mod identity;
pub mod pipeline;
pub mod qr;
pub mod service;
pub mod storage;
pub mod utils;

pub use identity::{IdentityFields, Identifier, PayloadFormat};
pub use pipeline::{Extraction, Pipeline, Rejection};

#[cfg(test)]
mod test_support;
