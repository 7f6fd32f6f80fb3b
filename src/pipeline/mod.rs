mod error;
mod orchestrator;

pub use error::Rejection;
pub use orchestrator::{Extraction, Pipeline, DEFAULT_MAX_UPLOAD_BYTES};

/*
 * Decode-verify-extract pipeline
 *
 * Classify -> Secure QR attempt -> (terminal on invalid signature)
 *          -> Legacy XML attempt -> success / rejection
 */
