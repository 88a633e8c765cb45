use crate::{error::Result, models::EncodedImage};
use std::path::{Path, PathBuf};

pub fn file_name_for(id: &str) -> String {
    format!("banana-lens-{}.png", id)
}

/// Decode an image reference and save it as `banana-lens-<id>.png` in `dir`.
pub async fn save_image(image: &EncodedImage, id: &str, dir: &Path) -> Result<PathBuf> {
    let bytes = image.decode_bytes()?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name_for(id));
    tokio::fs::write(&path, &bytes).await?;
    log::info!("💾 Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;

    #[tokio::test]
    async fn test_saves_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let image = EncodedImage::png_from_base64("QUJD");
        let path = save_image(&image, "1700000000000", dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "banana-lens-1700000000000.png");
        assert_eq!(std::fs::read(path).unwrap(), b"ABC");
    }

    #[tokio::test]
    async fn test_rejects_invalid_payload() {
        let dir = tempfile::tempdir().unwrap();
        let image = EncodedImage::new("data:image/png;base64,%%%");
        let err = save_image(&image, "x", dir.path()).await.unwrap_err();
        assert!(matches!(err, LensError::ValidationError(_)));
    }
}
