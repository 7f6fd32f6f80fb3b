use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InflateError {
    #[error("Invalid compressed stream: {0}")]
    InvalidStream(#[from] std::io::Error),

    #[error("Decompressed record exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Empty compressed stream")]
    Empty,
}

/// gzip 魔数
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 解压签名数据（zlib 或 gzip 包装），输出不超过 `limit` 字节
pub fn inflate(data: &[u8], limit: usize) -> Result<Vec<u8>, InflateError> {
    if data.is_empty() {
        return Err(InflateError::Empty);
    }

    let reader: Box<dyn Read + '_> = if data.starts_with(&GZIP_MAGIC) {
        Box::new(GzDecoder::new(data))
    } else {
        Box::new(ZlibDecoder::new(data))
    };

    // 多读一个字节用于判断是否超限
    let mut out = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut out)?;

    if out.len() > limit {
        return Err(InflateError::TooLarge(limit));
    }

    Ok(out)
}
