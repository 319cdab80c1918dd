//! QR codes for shareable links.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::error::ShareError;

/// Encode `data` as a PNG QR code at least `size` pixels wide.
pub fn render_png(data: &str, size: u32) -> Result<Vec<u8>, ShareError> {
    if data.trim().is_empty() {
        return Err(ShareError::InvalidRequest(
            "nothing to encode".to_string(),
        ));
    }

    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)
        .map_err(|err| ShareError::Qr(err.to_string()))?;

    let image = code
        .render::<Luma<u8>>()
        .min_dimensions(size, size)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| ShareError::Qr(err.to_string()))?;

    Ok(png)
}
