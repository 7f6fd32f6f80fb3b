use crate::crypto::{PinnedKey, VerificationOutcome};
use crate::identity::{
    DecodeError, IdentityDecoder, IdentityFields, LegacyXmlDecoder, PayloadFormat, SecureQrDecoder,
};
use crate::pipeline::Rejection;
use crate::qr::{extract_payload, ExtractError, PayloadKind, RawPayload};
use crate::storage::UploadedArtifact;
use crate::utils::Config;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 默认上传大小上限（10 MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// 处理成功的结果
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub fields: IdentityFields,
    pub format: PayloadFormat,
    /// Secure QR 为 `Valid`；旧版 XML 没有签名
    pub verification: Option<VerificationOutcome>,
}

impl Extraction {
    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Some(VerificationOutcome::Valid))
    }
}

/// 编排状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Classify,
    AttemptSecure,
    AttemptLegacy,
}

/// 解码、验证、提取流水线
///
/// 启动时构建一次，其中的公钥由所有请求只读共享。
pub struct Pipeline {
    /// 没有可用公钥时为 `None`，整个 Secure 路径被跳过
    secure: Option<Box<dyn IdentityDecoder>>,
    legacy: Box<dyn IdentityDecoder>,
    max_upload_bytes: u64,
}

impl Pipeline {
    pub fn new(key: Option<Arc<PinnedKey>>) -> Self {
        let secure = key.map(|key| Box::new(SecureQrDecoder::new(Some(key))) as Box<dyn IdentityDecoder>);
        Self::with_decoders(secure, Box::new(LegacyXmlDecoder::new()))
    }

    /// 加载配置中的公钥（只加载一次）并应用大小限制
    pub fn from_config(config: &Config) -> Self {
        let key = PinnedKey::load_optional(config.key_path().as_deref());
        let secure = key.map(|key| {
            Box::new(SecureQrDecoder::new(Some(key)).with_max_record_bytes(config.max_record_bytes))
                as Box<dyn IdentityDecoder>
        });

        let mut pipeline = Self::with_decoders(secure, Box::new(LegacyXmlDecoder::new()));
        pipeline.max_upload_bytes = config.max_upload_bytes;
        pipeline
    }

    pub fn with_decoders(
        secure: Option<Box<dyn IdentityDecoder>>,
        legacy: Box<dyn IdentityDecoder>,
    ) -> Self {
        Self {
            secure,
            legacy,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn secure_available(&self) -> bool {
        self.secure.is_some()
    }

    /// 对已提取的载荷执行格式判断
    ///
    /// 只有 Secure 路径明确返回 `SignatureInvalid` 时直接终止，不尝试旧版 XML；
    /// 其他 Secure 失败一律回退。
    pub fn decode_payload(&self, payload: &RawPayload) -> Result<Extraction, Rejection> {
        let mut stage = Stage::Classify;

        loop {
            debug!("Pipeline stage {:?} for {:?}", stage, payload);

            stage = match stage {
                Stage::Classify => match (payload.classify(), self.secure.is_some()) {
                    (PayloadKind::Numeric, true) => Stage::AttemptSecure,
                    (PayloadKind::Numeric, false) => {
                        debug!("No pinned key; numeric payload goes straight to legacy XML");
                        Stage::AttemptLegacy
                    }
                    (PayloadKind::NonNumeric, _) => Stage::AttemptLegacy,
                },

                Stage::AttemptSecure => match &self.secure {
                    None => Stage::AttemptLegacy,
                    Some(decoder) => match decoder.decode(payload) {
                        Ok(fields) => {
                            info!("Secure QR verified and decoded");
                            return Ok(Extraction {
                                fields,
                                format: decoder.format(),
                                verification: Some(VerificationOutcome::Valid),
                            });
                        }
                        Err(DecodeError::SignatureInvalid) => {
                            info!("Rejecting payload: Secure QR signature invalid");
                            return Err(Rejection::SignatureInvalid);
                        }
                        Err(e) => {
                            warn!("Secure QR parse failed, falling back to XML: {}", e);
                            Stage::AttemptLegacy
                        }
                    },
                },

                Stage::AttemptLegacy => {
                    return match self.legacy.decode(payload) {
                        Ok(fields) => {
                            info!("Legacy XML payload decoded");
                            Ok(Extraction {
                                fields,
                                format: self.legacy.format(),
                                verification: None,
                            })
                        }
                        Err(DecodeError::IdentifierFormatInvalid) => {
                            info!("Rejecting payload: identifier is not 12 digits");
                            Err(Rejection::IdentifierFormatInvalid)
                        }
                        Err(e) => {
                            info!("Rejecting payload: not recognized ({})", e);
                            Err(Rejection::UnrecognizedFormat)
                        }
                    };
                }
            };
        }
    }

    /// Image bytes → payload → identity fields
    pub fn process_image(&self, image_bytes: &[u8]) -> Result<Extraction, Rejection> {
        let payload = extract_payload(image_bytes).map_err(|ExtractError::QrNotFound(reason)| {
            info!("No QR code in upload: {}", reason);
            Rejection::QrNotFound(reason)
        })?;
        self.decode_payload(&payload)
    }

    /// 处理上传文件。任何退出路径（包括流水线内 panic）都会删除文件
    pub fn process_upload(&self, artifact: UploadedArtifact) -> Result<Extraction, Rejection> {
        let result = artifact
            .read_limited(self.max_upload_bytes)
            .map_err(Rejection::from)
            .and_then(|bytes| self.process_image(&bytes));

        if let Err(e) = &result {
            if e.is_internal() {
                error!("Upload {} failed: {}", artifact.path().display(), e);
            }
        }

        // 清理失败不能掩盖真正的结果
        let path = artifact.path().to_path_buf();
        if let Err(e) = artifact.release() {
            warn!("Failed to remove upload {}: {}", path.display(), e);
        }

        result
    }

    /// 在阻塞线程池中运行 `process_upload`。文件由阻塞任务持有，
    /// 丢弃返回的 future 不会导致文件残留；任务 panic 时返回 `Rejection::Internal`
    pub async fn process_upload_async(
        self: Arc<Self>,
        artifact: UploadedArtifact,
    ) -> Result<Extraction, Rejection> {
        match tokio::task::spawn_blocking(move || self.process_upload(artifact)).await {
            Ok(result) => result,
            Err(e) => {
                error!("Pipeline task aborted: {}", e);
                Err(Rejection::Internal(e.to_string()))
            }
        }
    }
}
