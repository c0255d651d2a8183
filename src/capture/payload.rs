//! Payload sizing — how many bytes a set of photos will cost on the wire.

use super::{EncodedImage, PreparedPhoto};

/// Combined ceiling for all photos in one request (1.5 MB).
pub const MAX_PAYLOAD_BYTES: u64 = 1_572_864;

/// Estimated raw byte size of an encoded image.
///
/// Base64 carries 3 bytes in every 4 characters, so the estimate is
/// `len * 3 / 4` minus padding.
pub fn estimate_bytes(image: &EncodedImage) -> u64 {
    let payload = image.base64().trim();
    let padding = payload.bytes().rev().take_while(|&b| b == b'=').count() as u64;
    (payload.len() as u64 * 3 / 4).saturating_sub(padding)
}

pub fn total_bytes(photos: &[PreparedPhoto]) -> u64 {
    photos.iter().map(|p| estimate_bytes(&p.image)).sum()
}

/// Keep all photos if they fit under `ceiling`, otherwise keep only the
/// first one. Input must already be in slot priority order.
///
/// Returns the kept photos and whether trimming happened.
pub fn trim_to_ceiling(mut photos: Vec<PreparedPhoto>, ceiling: u64) -> (Vec<PreparedPhoto>, bool) {
    let total = total_bytes(&photos);
    if total <= ceiling || photos.len() <= 1 {
        return (photos, false);
    }
    log::warn!(
        "[PAYLOAD] {} photos total {} bytes (> {}), sending {} only",
        photos.len(),
        total,
        ceiling,
        photos[0].slot
    );
    photos.truncate(1);
    (photos, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::PhotoSlot;

    fn photo(slot: PhotoSlot, b64_len: usize) -> PreparedPhoto {
        PreparedPhoto {
            slot,
            image: EncodedImage::new("image/jpeg", "A".repeat(b64_len)),
        }
    }

    #[test]
    fn estimate_uses_four_to_three_ratio() {
        assert_eq!(estimate_bytes(&EncodedImage::new("image/jpeg", "AAAA")), 3);
        assert_eq!(estimate_bytes(&EncodedImage::new("image/jpeg", "AAAAAAAA")), 6);
    }

    #[test]
    fn estimate_ignores_padding() {
        // "QQ==" decodes to a single byte.
        assert_eq!(estimate_bytes(&EncodedImage::new("image/jpeg", "QQ==")), 1);
        assert_eq!(estimate_bytes(&EncodedImage::new("image/jpeg", "")), 0);
    }

    #[test]
    fn under_ceiling_keeps_everything() {
        let photos = vec![photo(PhotoSlot::Front, 400), photo(PhotoSlot::Left, 400)];
        let (kept, trimmed) = trim_to_ceiling(photos, 600);
        assert_eq!(kept.len(), 2);
        assert!(!trimmed);
    }

    #[test]
    fn over_ceiling_keeps_first_photo_only() {
        let photos = vec![
            photo(PhotoSlot::Left, 800),
            photo(PhotoSlot::Right, 800),
        ];
        let (kept, trimmed) = trim_to_ceiling(photos, 1000);
        assert!(trimmed);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].slot, PhotoSlot::Left);
    }

    #[test]
    fn single_oversized_photo_is_not_marked_trimmed() {
        let (kept, trimmed) = trim_to_ceiling(vec![photo(PhotoSlot::Front, 4000)], 10);
        assert_eq!(kept.len(), 1);
        assert!(!trimmed);
    }
}
