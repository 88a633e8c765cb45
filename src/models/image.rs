use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::{LensError, Result};
use crate::models::common::{AspectRatio, ImageSize, ModelVariant};

pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// A self-describing image reference in `data:<mime>;base64,<payload>` form.
///
/// Cloning is cheap; gallery snapshots share the underlying string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EncodedImage(Arc<str>);

impl EncodedImage {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(Arc::from(uri.into()))
    }

    /// Wrap a raw base64 payload returned by the model as a PNG reference.
    pub fn png_from_base64(payload: &str) -> Self {
        Self::new(format!("data:{};base64,{}", DEFAULT_MIME_TYPE, payload))
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::new(format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)))
    }

    /// Read an image file from disk and encode it as a data URI.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_type_for_path(path);
        log::debug!(
            "Encoded {} ({} bytes, {})",
            path.display(),
            bytes.len(),
            mime_type
        );
        Ok(Self::from_bytes(mime_type, &bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Split into mime type and base64 payload. Blank references yield `None`.
    pub fn to_base_image(&self) -> Option<BaseImage> {
        if self.is_blank() {
            return None;
        }
        let (header, payload) = match self.0.split_once(',') {
            Some((header, payload)) => (header, payload),
            None => ("", &*self.0),
        };
        let mime_type = header
            .split_once(':')
            .and_then(|(_, rest)| rest.split_once(';'))
            .map(|(mime, _)| mime.trim())
            .filter(|mime| !mime.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE);

        Some(BaseImage {
            mime_type: mime_type.to_string(),
            data: payload.to_string(),
        })
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        let base = self
            .to_base_image()
            .ok_or_else(|| LensError::ValidationError("empty image reference".into()))?;
        STANDARD
            .decode(base.data.trim())
            .map_err(|e| LensError::ValidationError(format!("invalid base64 image data: {}", e)))
    }
}

impl From<String> for EncodedImage {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

impl From<EncodedImage> for String {
    fn from(image: EncodedImage) -> Self {
        image.0.to_string()
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head: String = self.0.chars().take(32).collect();
        write!(f, "EncodedImage({}... {} chars)", head, self.0.len())
    }
}

fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => DEFAULT_MIME_TYPE,
    }
}

/// An inline image split into the pieces the remote API expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImage {
    pub mime_type: String,
    /// Base64 payload, without the data URI header.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: ModelVariant,
    pub aspect_ratio: AspectRatio,
    pub image_size: Option<ImageSize>,
    pub base_image: Option<EncodedImage>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: ModelVariant::default(),
            aspect_ratio: AspectRatio::default(),
            image_size: None,
            base_image: None,
        }
    }

    pub fn with_model(mut self, model: ModelVariant) -> Self {
        self.model = model;
        self
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_image_size(mut self, image_size: ImageSize) -> Self {
        self.image_size = Some(image_size);
        self
    }

    pub fn with_base_image(mut self, image: EncodedImage) -> Self {
        self.base_image = Some(image);
        self
    }

    /// The output size sent to the API; dropped for models that ignore it.
    pub fn effective_image_size(&self) -> Option<ImageSize> {
        if self.model.supports_image_size() {
            self.image_size
        } else {
            None
        }
    }
}

/// Outcome of one remote call: an encoded image or a failure reason.
pub type GenerationResult = Result<EncodedImage>;
