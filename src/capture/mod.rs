//! Photo capture domain — public API.
//!
//! This module owns the photo inputs and everything that shrinks them
//! before they leave the device:
//!   - mod.rs      — CapturedPhotos, PhotoSlot, EncodedImage
//!   - compress.rs — decode → downscale → JPEG re-encode
//!   - payload.rs  — transmitted-size estimation + single-photo trimming

mod compress;
mod payload;

pub use compress::{compress_image, CompressError};
pub use payload::{estimate_bytes, total_bytes, trim_to_ceiling, MAX_PAYLOAD_BYTES};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

/// One of the three photo angles the capture flow asks for.
///
/// Declaration order is the priority order used when the payload has to
/// be trimmed down to a single photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoSlot {
    Front,
    Left,
    Right,
}

impl PhotoSlot {
    pub const ALL: [PhotoSlot; 3] = [PhotoSlot::Front, PhotoSlot::Left, PhotoSlot::Right];

    pub fn as_str(self) -> &'static str {
        match self {
            PhotoSlot::Front => "front",
            PhotoSlot::Left => "left",
            PhotoSlot::Right => "right",
        }
    }
}

impl std::fmt::Display for PhotoSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A base64-encoded image plus its MIME type.
///
/// This is the value the capture UI hands over (usually a `data:` URL from
/// a canvas or file picker) and the value sent upstream after compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    base64: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            base64: base64.into(),
        }
    }

    /// Encode raw file bytes. The MIME type is sniffed from the magic bytes,
    /// defaulting to `image/jpeg` when the format is not recognised.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mime_type = image::guess_format(bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("image/jpeg");
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    ///
    /// A bare base64 string (no `data:` prefix) is accepted and assumed to be JPEG.
    pub fn from_data_url(url: &str) -> Self {
        let url = url.trim();
        match url.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            Some((header, payload)) => {
                let mime_type = header.split(';').next().filter(|m| !m.is_empty());
                Self::new(mime_type.unwrap_or("image/jpeg"), payload)
            }
            None => Self::new("image/jpeg", url),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload without any `data:` prefix.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Decode the base64 payload back into raw bytes.
    pub fn decode_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.base64.trim())
    }
}

/// Up to three labeled photos. At least one must be present to analyze.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedPhotos {
    pub front: Option<EncodedImage>,
    pub left: Option<EncodedImage>,
    pub right: Option<EncodedImage>,
}

impl CapturedPhotos {
    pub fn front_only(front: EncodedImage) -> Self {
        Self {
            front: Some(front),
            ..Default::default()
        }
    }

    pub fn get(&self, slot: PhotoSlot) -> Option<&EncodedImage> {
        match slot {
            PhotoSlot::Front => self.front.as_ref(),
            PhotoSlot::Left => self.left.as_ref(),
            PhotoSlot::Right => self.right.as_ref(),
        }
    }

    pub fn set(&mut self, slot: PhotoSlot, image: Option<EncodedImage>) {
        match slot {
            PhotoSlot::Front => self.front = image,
            PhotoSlot::Left => self.left = image,
            PhotoSlot::Right => self.right = image,
        }
    }

    /// Present photos in slot priority order (front > left > right).
    pub fn present(&self) -> Vec<(PhotoSlot, &EncodedImage)> {
        PhotoSlot::ALL
            .iter()
            .filter_map(|&slot| self.get(slot).map(|img| (slot, img)))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.present().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// A photo after compression, tagged with the slot it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPhoto {
    pub slot: PhotoSlot,
    pub image: EncodedImage,
}
