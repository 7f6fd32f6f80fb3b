use crate::qr::RawPayload;
use log::{debug, warn};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExtractError {
    /// 没有找到二维码、找到多个、或无法解码
    #[error("QR code not found: {0}")]
    QrNotFound(String),
}

/// 从图片字节中提取唯一一个二维码的文本内容
///
/// 图片无法解码、零个或多个二维码、二维码数据损坏，都视为 `QrNotFound`，不重试。
pub fn extract_payload(image_bytes: &[u8]) -> Result<RawPayload, ExtractError> {
    let image = image::load_from_memory(image_bytes).map_err(|e| {
        warn!("Uploaded image could not be decoded: {}", e);
        ExtractError::QrNotFound(format!("undecodable image: {}", e))
    })?;

    let luma = image.to_luma8();
    let (width, height) = luma.dimensions();
    debug!("Scanning {}x{} image for QR symbols", width, height);

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        width as usize,
        height as usize,
        |x, y| luma.get_pixel(x as u32, y as u32).0[0],
    );

    let grids = prepared.detect_grids();
    if grids.len() != 1 {
        debug!("Found {} QR candidates, expected exactly one", grids.len());
        return Err(ExtractError::QrNotFound(format!("{} symbols detected", grids.len())));
    }

    let (_meta, content) = grids[0]
        .decode()
        .map_err(|e| ExtractError::QrNotFound(format!("unreadable symbol: {:?}", e)))?;

    debug!("Decoded QR payload of {} bytes", content.len());
    Ok(RawPayload::new(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_image() {
        assert!(matches!(
            extract_payload(b"definitely not an image"),
            Err(ExtractError::QrNotFound(_))
        ));
    }

    #[test]
    fn test_blank_image_has_no_qr() {
        let blank = image::GrayImage::from_pixel(64, 64, image::Luma([255u8]));
        let mut png = std::io::Cursor::new(Vec::new());
        blank.write_to(&mut png, image::ImageFormat::Png).unwrap();

        assert!(matches!(
            extract_payload(png.get_ref()),
            Err(ExtractError::QrNotFound(_))
        ));
    }
}
