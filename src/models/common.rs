use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LensError;

/// Which image model a request goes to. Serialized as the remote model id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModelVariant {
    #[default]
    #[serde(rename = "gemini-2.5-flash-image")]
    Fast,
    #[serde(rename = "gemini-3-pro-image-preview")]
    HighQuality,
}

impl ModelVariant {
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelVariant::Fast => "gemini-2.5-flash-image",
            ModelVariant::HighQuality => "gemini-3-pro-image-preview",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelVariant::Fast => "FLASH",
            ModelVariant::HighQuality => "PRO",
        }
    }

    /// Only the high quality model accepts an explicit output size.
    pub fn supports_image_size(&self) -> bool {
        matches!(self, ModelVariant::HighQuality)
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_id())
    }
}

impl FromStr for ModelVariant {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" | "flash" | "gemini-2.5-flash-image" => Ok(ModelVariant::Fast),
            "high-quality" | "high_quality" | "pro" | "gemini-3-pro-image-preview" => {
                Ok(ModelVariant::HighQuality)
            }
            other => Err(LensError::ValidationError(format!(
                "unknown model '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Portrait9x16,
    #[serde(rename = "16:9")]
    Landscape16x9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait3x4,
        AspectRatio::Landscape4x3,
        AspectRatio::Portrait9x16,
        AspectRatio::Landscape16x9,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait3x4 => "3:4",
            AspectRatio::Landscape4x3 => "4:3",
            AspectRatio::Portrait9x16 => "9:16",
            AspectRatio::Landscape16x9 => "16:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == s.trim())
            .ok_or_else(|| LensError::ValidationError(format!("unsupported aspect ratio '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
            ImageSize::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = LensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "1K" => Ok(ImageSize::OneK),
            "2K" => Ok(ImageSize::TwoK),
            "4K" => Ok(ImageSize::FourK),
            other => Err(LensError::ValidationError(format!(
                "unsupported image size '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_ids_serialize_as_remote_ids() {
        assert_eq!(
            serde_json::to_string(&ModelVariant::HighQuality).unwrap(),
            "\"gemini-3-pro-image-preview\""
        );
        assert_eq!(
            serde_json::from_str::<ModelVariant>("\"gemini-2.5-flash-image\"").unwrap(),
            ModelVariant::Fast
        );
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!("pro".parse::<ModelVariant>().unwrap(), ModelVariant::HighQuality);
        assert_eq!("16:9".parse::<AspectRatio>().unwrap(), AspectRatio::Landscape16x9);
        assert_eq!("4k".parse::<ImageSize>().unwrap(), ImageSize::FourK);
        assert!("2:1".parse::<AspectRatio>().is_err());
        assert!("8K".parse::<ImageSize>().is_err());
    }

    #[test]
    fn test_only_high_quality_takes_size() {
        assert!(!ModelVariant::Fast.supports_image_size());
        assert!(ModelVariant::HighQuality.supports_image_size());
    }
}
