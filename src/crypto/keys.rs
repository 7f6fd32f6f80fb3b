use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid PEM: {0}")]
    InvalidPem(String),

    #[error("Invalid DER: {0}")]
    InvalidDer(String),

    #[error("Unsupported key type: {0}")]
    Unsupported(String),
}

// DER tags
const TAG_INTEGER: u8 = 0x02;
const TAG_BIT_STRING: u8 = 0x03;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_EXPLICIT_VERSION: u8 = 0xa0;

/// rsaEncryption (1.2.840.113549.1.1.1)
const OID_RSA_ENCRYPTION: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

/// 签发机构的 RSA 公钥，进程启动时固定
///
/// 无论文件中是裸公钥、SubjectPublicKeyInfo 还是 X.509 证书，内部都只保存
/// PKCS#1 `RSAPublicKey` 的 DER 编码。
#[derive(Clone, PartialEq, Eq)]
pub struct PinnedKey {
    der: Vec<u8>,
    modulus_bits: usize,
}

impl PinnedKey {
    /// 解析 PEM，使用第一个 `CERTIFICATE`、`PUBLIC KEY` 或 `RSA PUBLIC KEY` 块
    pub fn from_pem(pem: &str) -> Result<Self, KeyError> {
        let mut label: Option<&str> = None;
        let mut body = String::new();

        for line in pem.lines().map(str::trim) {
            if let Some(rest) = line.strip_prefix("-----BEGIN ") {
                let name = rest.trim_end_matches('-');
                if matches!(name, "CERTIFICATE" | "PUBLIC KEY" | "RSA PUBLIC KEY") {
                    label = Some(name);
                    body.clear();
                }
                continue;
            }
            if line.starts_with("-----END ") {
                if label.is_some() {
                    break;
                }
                continue;
            }
            if label.is_some() {
                body.push_str(line);
            }
        }

        let label = label.ok_or_else(|| KeyError::InvalidPem("no public key block".to_string()))?;
        let der = STANDARD
            .decode(body.as_bytes())
            .map_err(|e| KeyError::InvalidPem(e.to_string()))?;

        match label {
            "CERTIFICATE" => Self::from_rsa_der(certificate_spki(&der)?),
            "PUBLIC KEY" => Self::from_rsa_der(spki_rsa_key(&der)?),
            _ => Self::from_rsa_der(der),
        }
    }

    /// 解析 DER，依次尝试 X.509 证书、SubjectPublicKeyInfo、PKCS#1 RSAPublicKey
    pub fn from_der(der: &[u8]) -> Result<Self, KeyError> {
        if let Ok(key) = certificate_spki(der).and_then(Self::from_rsa_der) {
            return Ok(key);
        }
        if let Ok(key) = spki_rsa_key(der).and_then(Self::from_rsa_der) {
            return Ok(key);
        }
        Self::from_rsa_der(der.to_vec())
    }

    /// 从文件加载公钥（PEM 或 DER）
    pub fn load(path: &Path) -> Result<Self, KeyError> {
        let bytes = std::fs::read(path)?;
        match std::str::from_utf8(&bytes) {
            Ok(text) if text.contains("-----BEGIN ") => Self::from_pem(text),
            _ => Self::from_der(&bytes),
        }
    }

    /// 启动时加载一次。公钥缺失或无法读取不算错误，只是 Secure 路径不可用
    pub fn load_optional(path: Option<&Path>) -> Option<Arc<Self>> {
        let path = match path {
            Some(path) => path,
            None => {
                warn!("No public key configured; Secure QR verification disabled");
                return None;
            }
        };

        if !path.exists() {
            warn!(
                "Public key {} not found; Secure QR verification disabled",
                path.display()
            );
            return None;
        }

        match Self::load(path) {
            Ok(key) => {
                info!(
                    "Loaded pinned {}-bit RSA key from {}",
                    key.modulus_bits,
                    path.display()
                );
                Some(Arc::new(key))
            }
            Err(e) => {
                warn!(
                    "Could not read public key {}: {}; Secure QR verification disabled",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    fn from_rsa_der(der: Vec<u8>) -> Result<Self, KeyError> {
        let mut outer = DerReader::new(&der);
        let seq = outer.expect(TAG_SEQUENCE)?;
        if !outer.is_empty() {
            return Err(KeyError::InvalidDer("trailing data after RSAPublicKey".to_string()));
        }

        let mut fields = DerReader::new(seq);
        let modulus = fields.expect(TAG_INTEGER)?;
        fields.expect(TAG_INTEGER)?;

        let significant = modulus.iter().skip_while(|b| **b == 0).count();
        if significant == 0 {
            return Err(KeyError::InvalidDer("zero modulus".to_string()));
        }

        Ok(Self {
            modulus_bits: significant * 8,
            der,
        })
    }

    /// PKCS#1 RSAPublicKey DER
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// 模数位数（按字节向上取整）
    pub fn modulus_bits(&self) -> usize {
        self.modulus_bits
    }

    /// 日志用指纹：RSAPublicKey DER 的 SHA-256 前 8 字节
    pub fn fingerprint(&self) -> String {
        let digest = super::signing::hash_message(&self.der);
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for PinnedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PinnedKey(rsa-{}, {})", self.modulus_bits, self.fingerprint())
    }
}

/// Certificate → tbsCertificate → subjectPublicKeyInfo → RSAPublicKey
fn certificate_spki(der: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut outer = DerReader::new(der);
    let mut certificate = DerReader::new(outer.expect(TAG_SEQUENCE)?);
    let mut tbs = DerReader::new(certificate.expect(TAG_SEQUENCE)?);

    if tbs.peek_tag() == Some(TAG_EXPLICIT_VERSION) {
        tbs.read_tlv()?;
    }
    tbs.expect(TAG_INTEGER)?; // serialNumber
    tbs.expect(TAG_SEQUENCE)?; // signature
    tbs.expect(TAG_SEQUENCE)?; // issuer
    tbs.expect(TAG_SEQUENCE)?; // validity
    tbs.expect(TAG_SEQUENCE)?; // subject

    let spki = tbs.raw_tlv(TAG_SEQUENCE)?;
    spki_rsa_key(spki)
}

/// SubjectPublicKeyInfo → RSAPublicKey
fn spki_rsa_key(der: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut outer = DerReader::new(der);
    let mut spki = DerReader::new(outer.expect(TAG_SEQUENCE)?);

    let mut algorithm = DerReader::new(spki.expect(TAG_SEQUENCE)?);
    let oid = algorithm.expect(TAG_OID)?;
    if oid != OID_RSA_ENCRYPTION {
        return Err(KeyError::Unsupported(format!("algorithm oid {}", hex::encode(oid))));
    }

    let bits = spki.expect(TAG_BIT_STRING)?;
    match bits.split_first() {
        Some((0, key)) => Ok(key.to_vec()),
        _ => Err(KeyError::InvalidDer("bad BIT STRING padding".to_string())),
    }
}

/// 极简 DER 读取器，只支持定长编码
struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// 读取一个 TLV，返回 (tag, 内容, 完整编码)
    fn read_tlv(&mut self) -> Result<(u8, &'a [u8], &'a [u8]), KeyError> {
        let start = self.pos;
        let tag = self.byte()?;
        let first = self.byte()?;

        let len = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7f);
            if count == 0 || count > 4 {
                return Err(KeyError::InvalidDer(format!("unsupported length form 0x{:02x}", first)));
            }
            let mut len = 0usize;
            for _ in 0..count {
                len = (len << 8) | usize::from(self.byte()?);
            }
            len
        };

        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| KeyError::InvalidDer("length exceeds input".to_string()))?;

        let content = &self.data[self.pos..end];
        self.pos = end;
        Ok((tag, content, &self.data[start..end]))
    }

    fn expect(&mut self, tag: u8) -> Result<&'a [u8], KeyError> {
        let (found, content, _) = self.read_tlv()?;
        if found != tag {
            return Err(KeyError::InvalidDer(format!(
                "expected tag 0x{:02x}, found 0x{:02x}",
                tag, found
            )));
        }
        Ok(content)
    }

    fn raw_tlv(&mut self, tag: u8) -> Result<&'a [u8], KeyError> {
        let (found, _, raw) = self.read_tlv()?;
        if found != tag {
            return Err(KeyError::InvalidDer(format!(
                "expected tag 0x{:02x}, found 0x{:02x}",
                tag, found
            )));
        }
        Ok(raw)
    }

    fn byte(&mut self) -> Result<u8, KeyError> {
        let b = self
            .data
            .get(self.pos)
            .copied()
            .ok_or_else(|| KeyError::InvalidDer("unexpected end of input".to_string()))?;
        self.pos += 1;
        Ok(b)
    }
}
