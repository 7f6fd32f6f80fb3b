use log::{debug, warn};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Artifact of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

/// 上传的临时文件
///
/// 由当前请求独占，离开作用域时（成功、拒绝、panic 均可）删除且只删除一次。
/// 删除失败只记录日志，不影响请求结果。
#[derive(Debug)]
pub struct UploadedArtifact {
    path: PathBuf,
    released: bool,
}

impl UploadedArtifact {
    /// 接管一个已经存在的上传文件
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    /// 将上传内容写入 `dir` 下的随机文件名
    pub fn stage(dir: &Path, data: &[u8]) -> Result<Self, ArtifactError> {
        create_dir_all(dir)?;

        let path = dir.join(crate::utils::upload_file_name());
        // 先创建守卫，写入失败时也会清理
        let artifact = Self::new(path);

        let mut file = File::create(&artifact.path)?;
        file.write_all(data)?;
        file.sync_all()?;

        debug!("Staged upload {} ({} bytes)", artifact.path.display(), data.len());
        Ok(artifact)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> Result<u64, ArtifactError> {
        Ok(fs::metadata(&self.path)?.len())
    }

    /// 读取文件内容，超过 `limit` 字节时拒绝
    pub fn read_limited(&self, limit: u64) -> Result<Vec<u8>, ArtifactError> {
        let size = self.size()?;
        if size > limit {
            return Err(ArtifactError::TooLarge { size, limit });
        }

        let mut data = Vec::with_capacity(size as usize);
        File::open(&self.path)?.take(limit + 1).read_to_end(&mut data)?;
        if data.len() as u64 > limit {
            return Err(ArtifactError::TooLarge {
                size: data.len() as u64,
                limit,
            });
        }
        Ok(data)
    }

    /// 显式释放，返回删除结果
    pub fn release(mut self) -> Result<(), ArtifactError> {
        self.released = true;
        fs::remove_file(&self.path)?;
        debug!("Removed upload {}", self.path.display());
        Ok(())
    }
}

impl Drop for UploadedArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Upload {} already removed", self.path.display())
            }
            Err(e) => warn!("Failed to remove upload {}: {}", self.path.display(), e),
        }
    }
}
