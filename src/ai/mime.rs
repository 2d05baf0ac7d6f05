use crate::{Error, Result};
use base64::Engine as _;

pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to image/png",
                &bytes[..bytes.len().min(4)]
            );
            "image/png"
        }
    }
}

/// File extension for a mime type produced by [`detect_image_mime`].
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpeg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Embed image bytes in a self-describing `data:` URI.
pub fn to_data_uri(bytes: &[u8]) -> String {
    let mime = detect_image_mime(bytes);
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", mime, payload)
}

/// Split a base64 `data:` URI back into its mime type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::Generic("Not a data URI".to_string()))?;
    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| Error::Generic("Data URI is not base64 encoded".to_string()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::Generic(format!("Failed to decode data URI payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}
