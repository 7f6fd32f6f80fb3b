//! 测试用签名与载荷构造工具
//!
//! 单元测试直接使用；集成测试经 `tests/common` 以 `#[path]` 引入同一文件，
//! 因此这里只通过 `super::` 引用 `codec`、`crypto`、`qr`。
#![allow(dead_code)]

use super::codec::bytes_to_decimal;
use super::crypto::PinnedKey;
use super::qr::RawPayload;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use std::io::Write;

pub const SIGNER_PKCS8: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/signer.pk8"));
pub const OTHER_PKCS8: &[u8] = include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/other.pk8"));
const SIGNER_PUB_PEM: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/signer_pub.pem"));

pub fn signer_public_key() -> PinnedKey {
    PinnedKey::from_pem(SIGNER_PUB_PEM).unwrap()
}

fn sign_with(pkcs8: &[u8], message: &[u8]) -> Vec<u8> {
    let key_pair = RsaKeyPair::from_pkcs8(pkcs8).unwrap();
    let mut signature = vec![0u8; key_pair.public_modulus_len()];
    key_pair
        .sign(&RSA_PKCS1_SHA256, &SystemRandom::new(), message, &mut signature)
        .unwrap();
    signature
}

/// 用固定公钥对应的私钥签名
pub fn sign(message: &[u8]) -> Vec<u8> {
    sign_with(SIGNER_PKCS8, message)
}

pub fn sign_with_other_key(message: &[u8]) -> Vec<u8> {
    sign_with(OTHER_PKCS8, message)
}

pub fn compress(record: &str) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(record.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// 签名数据后接签名，编码为十进制数字串
pub fn build_payload(signed: Vec<u8>, signature: &[u8]) -> RawPayload {
    let mut bytes = signed;
    bytes.extend_from_slice(signature);
    RawPayload::new(bytes_to_decimal(&bytes))
}

pub fn signed_payload(signed: Vec<u8>) -> RawPayload {
    let signature = sign(&signed);
    build_payload(signed, &signature)
}

pub fn secure_payload(record: &str) -> RawPayload {
    signed_payload(compress(record))
}

/// 压缩记录由另一把私钥签名
pub fn forged_payload(record: &str) -> RawPayload {
    let signed = compress(record);
    let signature = sign_with_other_key(&signed);
    build_payload(signed, &signature)
}

/// 签名之后翻转签名数据的最后一位
pub fn tampered_secure_payload(record: &str) -> RawPayload {
    let mut signed = compress(record);
    let signature = sign(&signed);
    let last = signed.len() - 1;
    signed[last] ^= 0x01;
    build_payload(signed, &signature)
}
