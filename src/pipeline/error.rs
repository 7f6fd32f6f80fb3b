use crate::storage::ArtifactError;
use thiserror::Error;

/// 请求未能得到身份信息时的最终结果
///
/// 可恢复的 Secure 路径失败不会出现在这里，它们由编排器的回退处理。
#[derive(Error, Debug)]
pub enum Rejection {
    #[error("No file uploaded")]
    NoFile,

    #[error("Upload of {0} bytes exceeds the size limit")]
    TooLarge(u64),

    #[error("QR code not found: {0}")]
    QrNotFound(String),

    #[error("Digital signature invalid")]
    SignatureInvalid,

    #[error("Payload not recognized as Secure QR or legacy XML")]
    UnrecognizedFormat,

    #[error("Identifier is not a 12-digit number")]
    IdentifierFormatInvalid,

    #[error("Artifact IO error: {0}")]
    ArtifactIo(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Rejection {
    /// 路由层使用的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Rejection::NoFile
            | Rejection::TooLarge(_)
            | Rejection::QrNotFound(_)
            | Rejection::UnrecognizedFormat => 400,
            Rejection::SignatureInvalid | Rejection::IdentifierFormatInvalid => 422,
            Rejection::ArtifactIo(_) | Rejection::Internal(_) => 500,
        }
    }

    /// 面向用户的简短信息，内部错误只给出通用提示
    pub fn user_message(&self) -> &'static str {
        match self {
            Rejection::NoFile => "No Aadhaar card image was uploaded.",
            Rejection::TooLarge(_) => "The uploaded image is too large.",
            Rejection::QrNotFound(_) => "Could not detect a QR code in the image. Try a clearer image.",
            Rejection::SignatureInvalid => "Aadhaar verification failed: digital signature invalid.",
            Rejection::UnrecognizedFormat => {
                "QR decoded but content not recognized as Aadhaar (secure or XML)."
            }
            Rejection::IdentifierFormatInvalid => "Invalid Aadhaar data found in QR code.",
            Rejection::ArtifactIo(_) | Rejection::Internal(_) => {
                "Server error processing Aadhaar. Check server logs."
            }
        }
    }

    /// 是否属于服务端内部错误
    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<ArtifactError> for Rejection {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::IoError(e) => Rejection::ArtifactIo(e),
            ArtifactError::TooLarge { size, .. } => Rejection::TooLarge(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Rejection::NoFile.status_code(), 400);
        assert_eq!(Rejection::QrNotFound("none".into()).status_code(), 400);
        assert_eq!(Rejection::SignatureInvalid.status_code(), 422);
        assert_eq!(Rejection::UnrecognizedFormat.status_code(), 400);
        assert_eq!(Rejection::IdentifierFormatInvalid.status_code(), 422);
        assert_eq!(Rejection::Internal("boom".into()).status_code(), 500);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(Rejection::from(io).status_code(), 500);
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let rejection = Rejection::Internal("stack trace with /secret/path".into());
        assert!(rejection.is_internal());
        assert!(!rejection.user_message().contains("/secret/path"));
    }
}
