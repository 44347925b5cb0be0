//! Photo fetching and content-type handling.

use std::io::Cursor;

use image::ImageReader;

use crate::places::PlacesProvider;

/// Downloaded photo bytes with their resolved content type.
#[derive(Debug, Clone)]
pub struct FetchedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// A photo that passed the transport and size gates, with the reference it
/// was fetched from.
#[derive(Debug, Clone)]
pub struct UsablePhoto {
    pub reference: String,
    pub photo: FetchedPhoto,
}

/// Resolve a content type for downloaded bytes.
///
/// The transport header wins when present; otherwise the bytes are sniffed.
/// JPEG is the fallback since that is what the places photo endpoint serves
/// in practice.
pub fn resolve_content_type(header: Option<&str>, bytes: &[u8]) -> String {
    if let Some(header) = header {
        let trimmed = header.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    detect_content_type(bytes).unwrap_or_else(|| "image/jpeg".to_string())
}

/// Detect the content type of image data by sniffing its magic bytes.
pub fn detect_content_type(bytes: &[u8]) -> Option<String> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .format()
        .map(|format| format.to_mime_type().to_string())
}

/// File extension for a stored photo. Anything that is not recognizably PNG
/// is stored as jpg.
pub fn extension_for(content_type: &str) -> &'static str {
    if content_type.to_ascii_lowercase().contains("png") {
        "png"
    } else {
        "jpg"
    }
}

/// Walk `references` in order and return the first photo that both downloads
/// and clears the size floor.
///
/// Transport failures and undersized payloads are logged and skipped, never
/// propagated: the caller only cares whether any candidate survived.
pub async fn first_usable_photo(
    places: &dyn PlacesProvider,
    references: &[String],
    max_width: u32,
    min_bytes: usize,
) -> Option<UsablePhoto> {
    for reference in references {
        let payload = match places.photo_bytes(reference, max_width).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("photo fetch failed, trying next candidate: {}", e);
                continue;
            }
        };

        if payload.bytes.len() < min_bytes {
            tracing::debug!(
                "photo too small ({} bytes < {}), trying next candidate",
                payload.bytes.len(),
                min_bytes
            );
            continue;
        }

        let content_type = resolve_content_type(payload.content_type.as_deref(), &payload.bytes);
        return Some(UsablePhoto {
            reference: reference.clone(),
            photo: FetchedPhoto {
                bytes: payload.bytes,
                content_type,
            },
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("IMAGE/PNG"), "png");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/octet-stream"), "jpg");
    }

    #[test]
    fn test_detect_png() {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(detect_content_type(&data), Some("image/png".to_string()));
    }

    #[test]
    fn test_detect_garbage() {
        assert_eq!(detect_content_type(&[0x00, 0x01, 0x02, 0x03]), None);
    }

    #[test]
    fn test_header_wins_over_sniffing() {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(
            resolve_content_type(Some("image/webp"), &data),
            "image/webp"
        );
    }

    #[test]
    fn test_blank_header_falls_back_to_sniffing() {
        let mut data = PNG_MAGIC.to_vec();
        data.extend_from_slice(&[0u8; 16]);
        assert_eq!(resolve_content_type(Some("  "), &data), "image/png");
    }

    #[test]
    fn test_unrecognizable_bytes_default_to_jpeg() {
        assert_eq!(resolve_content_type(None, &[1, 2, 3]), "image/jpeg");
    }
}
