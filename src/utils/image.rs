//! Image payload helpers: base64 decoding, data URLs and upload resizing.
//!
//! DESIGN
//! ======
//! Uploads are capped at 600x400 because server entities have a 1MB size
//! limit. Landscape images are bounded by width; portrait and square images
//! by height. Resized output is always PNG.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use image::imageops::FilterType;

use crate::config::{MAX_HEIGHT, MAX_WIDTH};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decode/encode failed: {0}")]
    Codec(#[from] image::ImageError),

    #[error("data URL must begin with 'data:'")]
    MissingDataPrefix,

    #[error("data URL must contain exactly one ',' (found {0})")]
    BadSeparator(usize),
}

impl crate::error::ErrorCode for ImageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Base64(_) => "E_IMAGE_BASE64",
            Self::Codec(_) => "E_IMAGE_CODEC",
            Self::MissingDataPrefix => "E_IMAGE_DATA_PREFIX",
            Self::BadSeparator(_) => "E_IMAGE_DATA_SEPARATOR",
        }
    }
}

// =============================================================================
// BASE64
// =============================================================================

/// Decode base64 photo contents into raw bytes.
///
/// # Errors
///
/// Returns [`ImageError::Base64`] for malformed input.
pub fn base64_to_blob(base64_value: &str) -> Result<Vec<u8>, ImageError> {
    Ok(STANDARD.decode(base64_value.trim())?)
}

#[must_use]
pub fn blob_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

// =============================================================================
// DATA URLS
// =============================================================================

#[must_use]
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", blob_to_base64(bytes))
}

/// Split a data URL into its base64 contents and MIME type.
///
/// # Errors
///
/// Fails if the URL does not start with `data:` or does not contain exactly
/// one `,`.
pub fn split_data_url(data_url: &str) -> Result<(String, String), ImageError> {
    let Some(rest) = data_url.strip_prefix("data:") else {
        return Err(ImageError::MissingDataPrefix);
    };
    let separators = rest.matches(',').count();
    let Some((header, contents)) = rest.split_once(',').filter(|_| separators == 1) else {
        return Err(ImageError::BadSeparator(separators));
    };
    let mime_type = header.split(';').next().unwrap_or_default();
    Ok((contents.to_owned(), mime_type.to_owned()))
}

// =============================================================================
// RESIZING
// =============================================================================

/// Target dimensions for an upload, or `None` if it already fits.
#[must_use]
pub fn fit_within(width: u32, height: u32) -> Option<(u32, u32)> {
    if width > height {
        (width > MAX_WIDTH).then(|| (MAX_WIDTH, scale(height, MAX_WIDTH, width)))
    } else {
        (height > MAX_HEIGHT).then(|| (scale(width, MAX_HEIGHT, height), MAX_HEIGHT))
    }
}

fn scale(side: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = u64::from(side) * u64::from(numerator) / u64::from(denominator.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Resize an uploaded image to the upload limits and return it as a data URL.
///
/// Images that already fit are returned unchanged under their original MIME
/// type; resized images are re-encoded as PNG.
///
/// # Errors
///
/// Returns [`ImageError::Codec`] if the bytes cannot be decoded or encoded.
pub fn resize_to_data_url(bytes: &[u8], mime_type: &str) -> Result<String, ImageError> {
    let img = image::load_from_memory(bytes)?;
    let Some((width, height)) = fit_within(img.width(), img.height()) else {
        return Ok(to_data_url(mime_type, bytes));
    };

    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let mut out = Cursor::new(Vec::new());
    resized.write_to(&mut out, ImageFormat::Png)?;
    Ok(to_data_url("image/png", out.get_ref()))
}

/// MIME type of an encoded image, detected from its magic bytes.
///
/// # Errors
///
/// Returns [`ImageError::Codec`] for unrecognized formats.
pub fn sniff_mime_type(bytes: &[u8]) -> Result<&'static str, ImageError> {
    Ok(image::guess_format(bytes)?.to_mime_type())
}

/// Base64 contents and MIME type of an uploaded image, resized for upload.
///
/// # Errors
///
/// Propagates decode and data-URL failures.
pub fn base64_contents_and_mime_type(bytes: &[u8], mime_type: &str) -> Result<(String, String), ImageError> {
    let data_url = resize_to_data_url(bytes, mime_type)?;
    split_data_url(&data_url)
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
