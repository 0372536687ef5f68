//! Image asset resolution and embedding
//!
//! Inspection photos are referenced as data URIs, absolute URLs, relative
//! storage paths, or objects carrying one of those. Embedding validates the
//! image header and replaces anything unreadable with a placeholder.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default number of leading bytes searched for a JPEG start marker
pub const DEFAULT_JPEG_SCAN_LIMIT: usize = 200;

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const PNG_MAGIC: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data URI")]
    InvalidDataUri,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// An image reference as stored in inspection documents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(String),
    Object(Map<String, Value>),
}

impl ImageRef {
    /// The URL-ish string carried by the reference
    ///
    /// Objects (and strings holding a JSON object) are searched for
    /// `originalUrl`, then `url`, `src` and `path`.
    pub fn raw_url(&self) -> Option<String> {
        match self {
            ImageRef::Url(s) if s.trim_start().starts_with('{') => {
                match serde_json::from_str::<Map<String, Value>>(s) {
                    Ok(map) => url_from_object(&map),
                    Err(_) => Some(s.trim().to_string()),
                }
            }
            ImageRef::Url(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            ImageRef::Object(map) => url_from_object(map),
        }
    }
}

fn url_from_object(map: &Map<String, Value>) -> Option<String> {
    ["originalUrl", "url", "src", "path"]
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// Resolve a reference string against the API base URL
///
/// Data URIs and absolute URLs pass through. A `./public` prefix is dropped,
/// and relative paths are joined to the base with exactly one `/`.
pub fn resolve_image_url(reference: &str, base_url: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    if reference.starts_with("data:")
        || reference.starts_with("http://")
        || reference.starts_with("https://")
    {
        return Some(reference.to_string());
    }

    let relative = reference.strip_prefix("./public").unwrap_or(reference);
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    let relative = relative.trim_start_matches('/');
    let base = base_url.trim().trim_end_matches('/');

    Some(if base.is_empty() {
        format!("/{}", relative)
    } else {
        format!("{}/{}", base, relative)
    })
}

/// Image references found under any `*image*` key of a document
pub fn collect_image_refs(value: &Value) -> Vec<ImageRef> {
    fn push(value: &Value, out: &mut Vec<ImageRef>) {
        match value {
            Value::String(s) if !s.trim().is_empty() => out.push(ImageRef::Url(s.clone())),
            Value::Object(map) => out.push(ImageRef::Object(map.clone())),
            Value::Array(items) => items.iter().for_each(|v| push(v, out)),
            _ => {}
        }
    }

    let mut out = Vec::new();
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if key.to_lowercase().contains("image") {
                    push(inner, &mut out);
                } else {
                    out.extend(collect_image_refs(inner));
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|v| out.extend(collect_image_refs(v))),
        _ => {}
    }
    out
}

/// Resolve any stored reference shape
pub fn resolve_image_ref(reference: &ImageRef, base_url: &str) -> Option<String> {
    reference
        .raw_url()
        .and_then(|url| resolve_image_url(&url, base_url))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Webp => write!(f, "webp"),
        }
    }
}

/// Identify an image from its header bytes
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&JPEG_SOI) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(&PNG_MAGIC) {
        Some(ImageFormat::Png)
    } else if bytes.len() >= 12 && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Slice a JPEG from its first `FF D8 FF` marker
///
/// The marker must start within the first `scan_limit` bytes.
pub fn repair_jpeg(bytes: &[u8], scan_limit: usize) -> Option<&[u8]> {
    if bytes.starts_with(&JPEG_SOI) {
        return Some(bytes);
    }
    bytes
        .windows(3)
        .take(scan_limit)
        .position(|w| w == [0xFF, 0xD8, 0xFF])
        .map(|start| &bytes[start..])
}

/// Result of preparing an image for the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmbeddedImage {
    Image {
        format: ImageFormat,
        repaired: bool,
        #[serde(skip_serializing)]
        data_uri: String,
        bytes: usize,
    },
    Placeholder {
        reason: String,
    },
}

impl EmbeddedImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, EmbeddedImage::Placeholder { .. })
    }
}

fn data_uri(format: ImageFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime(),
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Validate image bytes, attempting a bounded JPEG repair
pub fn embed_image(bytes: &[u8], scan_limit: usize) -> EmbeddedImage {
    if bytes.is_empty() {
        return EmbeddedImage::Placeholder {
            reason: "empty image".to_string(),
        };
    }
    if let Some(format) = detect_format(bytes) {
        return EmbeddedImage::Image {
            format,
            repaired: false,
            data_uri: data_uri(format, bytes),
            bytes: bytes.len(),
        };
    }
    match repair_jpeg(bytes, scan_limit) {
        Some(repaired) => {
            tracing::warn!(
                skipped = bytes.len() - repaired.len(),
                "repaired JPEG with leading garbage"
            );
            EmbeddedImage::Image {
                format: ImageFormat::Jpeg,
                repaired: true,
                data_uri: data_uri(ImageFormat::Jpeg, repaired),
                bytes: repaired.len(),
            }
        }
        None => {
            tracing::warn!(len = bytes.len(), "unrecognized image data, using placeholder");
            EmbeddedImage::Placeholder {
                reason: "no valid image header".to_string(),
            }
        }
    }
}

/// Decode the payload of a base64 data URI
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let rest = uri.strip_prefix("data:").ok_or(AssetError::InvalidDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(AssetError::InvalidDataUri)?;
    if !meta.ends_with(";base64") {
        return Err(AssetError::InvalidDataUri);
    }
    Ok(general_purpose::STANDARD.decode(payload.trim())?)
}

/// Read image bytes from a local file or a data URI
pub fn load_image(source: &str) -> Result<Vec<u8>, AssetError> {
    if source.starts_with("data:") {
        return decode_data_uri(source);
    }
    let path = Path::new(source);
    std::fs::read(path).map_err(|e| AssetError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
