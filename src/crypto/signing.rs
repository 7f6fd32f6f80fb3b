use crate::crypto::PinnedKey;
use log::debug;
use ring::signature::{self, UnparsedPublicKey};
use serde::{Deserialize, Serialize};

/// 签名验证结果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationOutcome {
    /// 签名有效
    Valid,

    /// 签名无效（终止，不允许回退）
    Invalid,

    /// 无可用公钥，无法判断
    Inconclusive,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// 计算 SHA-256 摘要
pub fn hash_message(message: &[u8]) -> Vec<u8> {
    let digest = ring::digest::digest(&ring::digest::SHA256, message);
    digest.as_ref().to_vec()
}

/// 验证 `message` 的 RSA PKCS#1 v1.5 / SHA-256 分离签名
///
/// 没有公钥时结果为 `Inconclusive`，签名根本不会被检查。
pub fn verify_detached(
    key: Option<&PinnedKey>,
    message: &[u8],
    signature_bytes: &[u8],
) -> VerificationOutcome {
    let key = match key {
        Some(key) => key,
        None => return VerificationOutcome::Inconclusive,
    };

    debug!(
        "Verifying {} signed bytes (sha256 {}) against {:?}",
        message.len(),
        hex::encode(hash_message(message)),
        key
    );

    let public_key = UnparsedPublicKey::new(&signature::RSA_PKCS1_2048_8192_SHA256, key.as_der());
    match public_key.verify(message, signature_bytes) {
        Ok(()) => VerificationOutcome::Valid,
        Err(_) => VerificationOutcome::Invalid,
    }
}
