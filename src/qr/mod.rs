mod extractor;
mod payload;

pub use extractor::{extract_payload, ExtractError};
pub use payload::{PayloadKind, RawPayload};
