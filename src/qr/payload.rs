use serde::{Deserialize, Serialize};
use std::fmt;

/// 二维码中解出的文本，生成后不再修改
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPayload(String);

/// 载荷形态，决定先尝试哪种格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// 纯十进制数字：先尝试 Secure QR
    Numeric,

    /// 其他文本：直接按旧版 XML 处理
    NonNumeric,
}

impl RawPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 只看形态：非空且全部为 ASCII 数字即为 `Numeric`
    pub fn classify(&self) -> PayloadKind {
        if !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit()) {
            PayloadKind::Numeric
        } else {
            PayloadKind::NonNumeric
        }
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

// 载荷可能包含身份信息，调试输出只显示长度与形态
impl fmt::Debug for RawPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPayload({:?}, {} bytes)", self.classify(), self.0.len())
    }
}
