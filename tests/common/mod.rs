//! Shared fixtures for integration tests.
#![allow(dead_code)]

use aadhaar_kyc::{codec, crypto, qr};
use crypto::PinnedKey;
use image::{GrayImage, ImageFormat, Luma};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

#[path = "../../src/test_support.rs"]
mod support;

pub use support::*;

pub const LEGACY_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><PrintLetterBarcodeData uid="123456789012" name="Asha Rao" gender="F" yob="1990" house="12" street="" vtc="Springfield" dist="" state="Xanadu" pc="000001"/>"#;

pub const SECURE_RECORD: &str = "n:Asha Rao,h:12,s:,vtc:Springfield,d:,st:Xanadu,p:000001,l:9012";

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name)
}

pub fn pinned_key() -> Arc<PinnedKey> {
    Arc::new(PinnedKey::load(&fixture_path("signer_pub.pem")).expect("fixture key"))
}

/// Renders `text` as a QR code PNG with a quiet zone.
pub fn qr_png(text: &str) -> Vec<u8> {
    let code = qrcode::QrCode::new(text.as_bytes()).expect("qr encode");
    let width = code.width();
    let colors = code.to_colors();

    let scale = 4u32;
    let quiet = 4u32;
    let size = (width as u32 + 2 * quiet) * scale;

    let image = GrayImage::from_fn(size, size, |x, y| {
        let mx = (x / scale) as i64 - quiet as i64;
        let my = (y / scale) as i64 - quiet as i64;
        let inside = mx >= 0 && my >= 0 && (mx as usize) < width && (my as usize) < width;
        if inside && colors[my as usize * width + mx as usize] == qrcode::Color::Dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    let mut png = Cursor::new(Vec::new());
    image.write_to(&mut png, ImageFormat::Png).expect("png encode");
    png.into_inner()
}
