//! Base64 image decoding for uploaded artifacts.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::domain::foundation::ValidationError;

/// A decoded image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// Unrecognised signature; uploaded as JPEG and left to the provider.
    Unknown,
}

impl ImageFormat {
    fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            ImageFormat::Png
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg | ImageFormat::Unknown => "image/jpeg",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image.png",
            ImageFormat::Jpeg | ImageFormat::Unknown => "image.jpg",
        }
    }
}

/// Decodes a base64 image, accepting an optional `data:` URL prefix and
/// missing padding.
pub fn decode_image(
    field: &str,
    encoded: &str,
    max_bytes: usize,
) -> Result<DecodedImage, ValidationError> {
    let payload = match encoded.trim().split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded.trim(),
    };

    let mut cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(ValidationError::empty_field(field));
    }

    let remainder = cleaned.len() % 4;
    if remainder != 0 {
        cleaned.push_str(&"=".repeat(4 - remainder));
    }

    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| ValidationError::invalid_format(field, format!("invalid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if bytes.len() > max_bytes {
        return Err(ValidationError::invalid_format(
            field,
            format!("image is {} bytes, limit is {}", bytes.len(), max_bytes),
        ));
    }

    let format = ImageFormat::sniff(&bytes);
    Ok(DecodedImage { bytes, format })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1024;

    #[test]
    fn decodes_plain_base64() {
        let encoded = STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);
        let image = decode_image("image_base64", &encoded, LIMIT).unwrap();
        assert_eq!(image.bytes.len(), 7);
        assert_eq!(image.format, ImageFormat::Jpeg);
    }

    #[test]
    fn decodes_data_url() {
        let encoded = format!(
            "data:image/png;base64,{}",
            STANDARD.encode([0x89, b'P', b'N', b'G', 0x0D, 0x0A])
        );
        let image = decode_image("image_base64", &encoded, LIMIT).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.format.mime_type(), "image/png");
    }

    #[test]
    fn restores_missing_padding() {
        let encoded = STANDARD.encode(b"hello");
        let unpadded = encoded.trim_end_matches('=');
        let image = decode_image("image_base64", unpadded, LIMIT).unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.format, ImageFormat::Unknown);
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(
            decode_image("image_base64", "  ", LIMIT).unwrap_err(),
            ValidationError::empty_field("image_base64")
        );
    }

    #[test]
    fn rejects_invalid_characters() {
        assert!(decode_image("image_base64", "not*base64!", LIMIT).is_err());
    }

    #[test]
    fn rejects_oversized_image() {
        let encoded = STANDARD.encode(vec![0u8; LIMIT + 1]);
        let err = decode_image("image_base64", &encoded, LIMIT).unwrap_err();
        assert_eq!(err.field(), "image_base64");
    }
}
