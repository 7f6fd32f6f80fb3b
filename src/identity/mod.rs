pub mod fields;
pub mod legacy;
pub mod secure;

pub use fields::{AddressParts, IdentityFields, Identifier};
pub use legacy::LegacyXmlDecoder;
pub use secure::{SecureQrDecoder, SecureRecord};

use crate::qr::RawPayload;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/*
 * Identity extraction
 *
 * Two payload formats produce the same normalised `IdentityFields`:
 * - Secure QR: decimal digits -> signed, compressed key:value record
 * - Legacy XML: attributes on a single `PrintLetterBarcodeData` element
 */

/// 解码失败类型。是否回退到另一种格式只由编排器决定
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Payload is not a decimal number: {0}")]
    MalformedNumeric(#[from] crate::codec::NumericError),

    #[error("Payload of {0} bytes cannot hold a 256-byte signature")]
    PayloadTooShort(usize),

    #[error("Digital signature invalid")]
    SignatureInvalid,

    #[error("No public key available")]
    KeyUnavailable,

    #[error("Decompression failed: {0}")]
    DecompressionFailure(#[from] crate::codec::InflateError),

    #[error("Unrecognized secure record: {0}")]
    UnrecognizedRecord(String),

    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    #[error("Expected attribute container not found: {0}")]
    MissingContainer(String),

    #[error("Identifier is not a 12-digit number")]
    IdentifierFormatInvalid,
}

/// 载荷格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadFormat {
    SecureQr,
    LegacyXml,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadFormat::SecureQr => write!(f, "secure QR"),
            PayloadFormat::LegacyXml => write!(f, "legacy XML"),
        }
    }
}

/// 从载荷文本得到 `IdentityFields` 或明确的失败类型
pub trait IdentityDecoder: Send + Sync {
    /// 解码器对应的格式
    fn format(&self) -> PayloadFormat;

    fn decode(&self, payload: &RawPayload) -> Result<IdentityFields, DecodeError>;
}
