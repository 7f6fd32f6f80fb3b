use crate::identity::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 证件号码
///
/// 旧版 XML 提供完整 12 位，Secure QR 只提供后 4 位，一条记录只持有其中一种。
/// 只能通过 `full` / `partial`（或经同样校验的反序列化）构造。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "IdentifierRepr", into = "IdentifierRepr")]
pub struct Identifier(Kind);

#[derive(Clone, PartialEq, Eq)]
enum Kind {
    Full(String),
    Partial(String),
}

/// 序列化形式：`{"kind": "full" | "partial", "digits": "..."}`
#[derive(Serialize, Deserialize)]
#[serde(tag = "kind", content = "digits", rename_all = "snake_case")]
enum IdentifierRepr {
    Full(String),
    Partial(String),
}

impl TryFrom<IdentifierRepr> for Identifier {
    type Error = String;

    fn try_from(repr: IdentifierRepr) -> Result<Self, Self::Error> {
        match repr {
            IdentifierRepr::Full(digits) => {
                Identifier::full(&digits).map_err(|_| "full identifier must be 12 digits".to_string())
            }
            IdentifierRepr::Partial(digits) => Identifier::partial(&digits)
                .ok_or_else(|| "partial identifier must be 4 digits".to_string()),
        }
    }
}

impl From<Identifier> for IdentifierRepr {
    fn from(identifier: Identifier) -> Self {
        match identifier.0 {
            Kind::Full(digits) => IdentifierRepr::Full(digits),
            Kind::Partial(digits) => IdentifierRepr::Partial(digits),
        }
    }
}

impl Identifier {
    /// 校验 `^\d{12}$`
    pub fn full(digits: &str) -> Result<Self, DecodeError> {
        if is_digits(digits, 12) {
            Ok(Identifier(Kind::Full(digits.to_string())))
        } else {
            Err(DecodeError::IdentifierFormatInvalid)
        }
    }

    /// 校验 `^\d{4}$`
    pub fn partial(digits: &str) -> Option<Self> {
        is_digits(digits, 4).then(|| Identifier(Kind::Partial(digits.to_string())))
    }

    pub fn full_digits(&self) -> Option<&str> {
        match &self.0 {
            Kind::Full(d) => Some(d),
            Kind::Partial(_) => None,
        }
    }

    pub fn partial_digits(&self) -> Option<&str> {
        match &self.0 {
            Kind::Full(_) => None,
            Kind::Partial(d) => Some(d),
        }
    }

    /// 后四位，用于显示
    pub fn last_four(&self) -> &str {
        let digits = match &self.0 {
            Kind::Full(d) | Kind::Partial(d) => d.as_str(),
        };
        digits.get(digits.len().saturating_sub(4)..).unwrap_or(digits)
    }
}

// 完整号码不得出现在日志里
impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Kind::Full(_) => write!(f, "Full(********{})", self.last_four()),
            Kind::Partial(_) => write!(f, "Partial({})", self.last_four()),
        }
    }
}

fn is_digits(text: &str, len: usize) -> bool {
    text.len() == len && text.bytes().all(|b| b.is_ascii_digit())
}

/// 地址组成部分，按固定顺序拼接
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub house: Option<String>,
    pub street: Option<String>,
    pub vtc: Option<String>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

impl AddressParts {
    /// 用 ", " 连接非空部分
    pub fn join(&self) -> String {
        [
            &self.house,
            &self.street,
            &self.vtc,
            &self.district,
            &self.state,
            &self.pincode,
        ]
        .iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// 两种解码器共同的输出
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityFields {
    pub name: Option<String>,
    pub address_line: String,
    pub identifier: Identifier,
}

impl IdentityFields {
    pub fn new(name: Option<String>, address: &AddressParts, identifier: Identifier) -> Self {
        Self {
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            address_line: address.join(),
            identifier,
        }
    }

    pub fn full_identifier(&self) -> Option<&str> {
        self.identifier.full_digits()
    }

    pub fn partial_identifier(&self) -> Option<&str> {
        self.identifier.partial_digits()
    }
}
