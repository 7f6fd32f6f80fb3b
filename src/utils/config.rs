use crate::identity::secure::DEFAULT_MAX_RECORD_BYTES;
use crate::pipeline::DEFAULT_MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// 应用程序配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 签发机构公钥（PEM / DER）路径，缺省时 Secure QR 验证不可用
    pub public_key_path: Option<PathBuf>,

    /// 上传文件暂存目录
    pub upload_dir: PathBuf,

    /// 上传文件大小上限（字节）
    pub max_upload_bytes: u64,

    /// 解压后记录大小上限（字节）
    pub max_record_bytes: usize,

    /// 日志级别
    pub log_level: String,

    /// 相对路径的基准目录
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_key_path: Some(PathBuf::from("certs/uidai_public_key.pem")),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_record_bytes: DEFAULT_MAX_RECORD_BYTES,
            log_level: "info".to_string(),
            data_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aadhaar-kyc")
            .join("config.json")
    }

    /// 读取 JSON 配置；文件不存在时返回默认值，缺失的字段取默认值
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let parent = path
            .parent()
            .ok_or_else(|| ConfigError::PathError(format!("{} has no parent", path.display())))?;
        fs::create_dir_all(parent)?;
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// 上传目录的实际路径
    pub fn upload_dir_path(&self) -> PathBuf {
        self.resolve(&self.upload_dir)
    }

    /// 确保上传目录存在
    pub fn ensure_upload_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = self.upload_dir_path();
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// 公钥文件的实际路径
    pub fn key_path(&self) -> Option<PathBuf> {
        self.public_key_path.as_ref().map(|path| self.resolve(path))
    }

    /// 用命令行给出的公钥覆盖配置。相对路径按 `cwd` 解析为绝对路径，
    /// 其余路径仍以 `data_dir` 为基准
    pub fn override_key_path(&mut self, key: &Path, cwd: &Path) {
        self.public_key_path = Some(cwd.join(key));
    }

    /// 解析相对路径
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid("max_upload_bytes must be positive".to_string()));
        }
        if self.max_record_bytes == 0 {
            return Err(ConfigError::Invalid("max_record_bytes must be positive".to_string()));
        }
        if self.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::PathError("upload_dir is empty".to_string()));
        }
        Ok(())
    }
}
