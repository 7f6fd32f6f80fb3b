use crate::codec::{decimal_to_bytes, inflate};
use crate::crypto::{verify_detached, PinnedKey, VerificationOutcome};
use crate::identity::{AddressParts, DecodeError, IdentityDecoder, IdentityFields, Identifier, PayloadFormat};
use crate::qr::RawPayload;
use log::{debug, trace};
use std::sync::Arc;

/// 末尾分离签名的长度
pub const SIGNATURE_LEN: usize = 256;

/// 解压后记录的默认大小上限
pub const DEFAULT_MAX_RECORD_BYTES: usize = 64 * 1024;

/// 解压后的 Secure QR 记录，按短键名归入固定字段
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecureRecord {
    pub name: Option<String>,
    pub house: Option<String>,
    pub street: Option<String>,
    pub vtc: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub last_four: Option<String>,
}

impl SecureRecord {
    /// 解析逗号分隔的 `key:value` 片段。值中可以包含 `:`；
    /// 没有 `:` 或键为空的片段被忽略，未知键直接丢弃
    pub fn parse(text: &str) -> Self {
        let mut record = Self::default();
        let mut unknown = 0usize;

        for segment in text.split(',') {
            let (key, value) = match segment.split_once(':') {
                Some((key, value)) => (key.trim(), value.trim().to_string()),
                None => continue,
            };

            let slot = match key {
                "" => continue,
                "n" => &mut record.name,
                "h" => &mut record.house,
                "s" => &mut record.street,
                "vtc" => &mut record.vtc,
                "d" => &mut record.district,
                "st" => &mut record.state,
                "p" => &mut record.pincode,
                "l" => &mut record.last_four,
                _ => {
                    unknown += 1;
                    continue;
                }
            };
            *slot = Some(value);
        }

        if unknown > 0 {
            trace!("Discarded {} unknown secure record keys", unknown);
        }
        record
    }

    pub fn address(&self) -> AddressParts {
        AddressParts {
            house: self.house.clone(),
            street: self.street.clone(),
            vtc: self.vtc.clone(),
            district: self.district.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
        }
    }

    /// 没有 4 位后四位号码的记录不是可识别的格式
    pub fn into_fields(self) -> Result<IdentityFields, DecodeError> {
        let identifier = self
            .last_four
            .as_deref()
            .and_then(Identifier::partial)
            .ok_or_else(|| DecodeError::UnrecognizedRecord("missing 4-digit identifier".to_string()))?;

        let address = self.address();
        Ok(IdentityFields::new(self.name, &address, identifier))
    }
}

/// 将二进制记录拆分为 (签名数据, 签名)
pub fn split_signature(bytes: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    if bytes.len() <= SIGNATURE_LEN {
        return Err(DecodeError::PayloadTooShort(bytes.len()));
    }
    Ok(bytes.split_at(bytes.len() - SIGNATURE_LEN))
}

/// Secure QR 解码器：数字载荷 → 验签 → 解压
pub struct SecureQrDecoder {
    key: Option<Arc<PinnedKey>>,
    max_record_bytes: usize,
}

impl SecureQrDecoder {
    pub fn new(key: Option<Arc<PinnedKey>>) -> Self {
        Self {
            key,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
        }
    }

    pub fn with_max_record_bytes(mut self, max_record_bytes: usize) -> Self {
        self.max_record_bytes = max_record_bytes;
        self
    }

    /// 是否有可用公钥；没有时整个 Secure 路径被跳过
    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }

    /// 转换并验签，签名有效时才返回签名数据；验签之前不做任何解压或解析
    pub fn verify(&self, payload: &RawPayload) -> Result<Vec<u8>, DecodeError> {
        let key = self.key.as_deref().ok_or(DecodeError::KeyUnavailable)?;

        let bytes = decimal_to_bytes(payload.as_str())?;
        let (signed, signature) = split_signature(&bytes)?;
        debug!(
            "Secure QR record: {} signed bytes, {} signature bytes",
            signed.len(),
            signature.len()
        );

        match verify_detached(Some(key), signed, signature) {
            VerificationOutcome::Valid => Ok(signed.to_vec()),
            VerificationOutcome::Invalid => Err(DecodeError::SignatureInvalid),
            VerificationOutcome::Inconclusive => Err(DecodeError::KeyUnavailable),
        }
    }
}

impl IdentityDecoder for SecureQrDecoder {
    fn format(&self) -> PayloadFormat {
        PayloadFormat::SecureQr
    }

    fn decode(&self, payload: &RawPayload) -> Result<IdentityFields, DecodeError> {
        let signed = self.verify(payload)?;

        let inflated = inflate(&signed, self.max_record_bytes)?;
        let text = String::from_utf8(inflated)
            .map_err(|_| DecodeError::UnrecognizedRecord("record is not UTF-8".to_string()))?;

        SecureRecord::parse(&text).into_fields()
    }
}
