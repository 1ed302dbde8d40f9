use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// 图片格式枚举
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    /// 从MIME类型获取图片格式
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// 获取MIME类型
    pub fn to_mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// 获取文件扩展名
    pub fn to_extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// 根据文件内容识别图片格式, 不信任上传方声明的 Content-Type
pub fn sniff_format(bytes: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::WebP => Some(ImageFormat::Webp),
        image::ImageFormat::Gif => Some(ImageFormat::Gif),
        _ => None,
    }
}

/// 检查格式是否在配置允许的列表内 (逗号分隔的扩展名)
pub fn is_allowed(format: ImageFormat, allowed_csv: &str) -> bool {
    allowed_csv
        .split(',')
        .map(|s| s.trim())
        .any(|ext| ImageFormat::from_extension(ext) == Some(format))
}

/// 校验上传内容并写入媒体目录, 返回相对路径 (例如 posts/<uuid>.jpg)
pub async fn save_upload(
    media_root: &str,
    bytes: &[u8],
    allowed_csv: &str,
    max_size: usize,
) -> Result<String> {
    if bytes.is_empty() {
        return Err(AppError::FileUpload("Uploaded file is empty".to_string()));
    }
    if bytes.len() > max_size {
        return Err(AppError::FileUpload(format!(
            "Uploaded file exceeds the {} byte limit",
            max_size
        )));
    }

    let format = sniff_format(bytes)
        .ok_or_else(|| AppError::ImageProcessing("Unrecognized image format".to_string()))?;
    if !is_allowed(format, allowed_csv) {
        return Err(AppError::ImageProcessing(format!(
            "Image type {} is not allowed",
            format.to_extension()
        )));
    }

    let relative = format!("posts/{}.{}", Uuid::new_v4(), format.to_extension());
    let full = Path::new(media_root).join(&relative);
    if let Some(parent) = full.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&full, bytes).await?;

    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 的最小 PNG
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_mime_type_round_trip() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("text/html"), None);
        assert_eq!(ImageFormat::Png.to_mime_type(), "image/png");
        assert_eq!(ImageFormat::Jpeg.to_extension(), "jpg");
    }

    #[test]
    fn test_sniff_format() {
        assert_eq!(sniff_format(PNG_BYTES), Some(ImageFormat::Png));
        assert_eq!(sniff_format(b"not an image"), None);
        assert_eq!(sniff_format(&[]), None);
    }

    #[test]
    fn test_is_allowed() {
        assert!(is_allowed(ImageFormat::Png, "jpeg,jpg,png,gif,webp"));
        assert!(is_allowed(ImageFormat::Jpeg, "jpeg"));
        assert!(!is_allowed(ImageFormat::Gif, "jpeg,png"));
    }

    #[tokio::test]
    async fn test_save_upload_rejects_non_images() {
        let dir = std::env::temp_dir().join("yatube-image-test");
        let result = save_upload(dir.to_str().unwrap(), b"plain text", "png", 1024).await;
        assert!(matches!(result, Err(AppError::ImageProcessing(_))));
    }

    #[tokio::test]
    async fn test_save_upload_writes_file() {
        let dir = std::env::temp_dir().join("yatube-image-test");
        let relative = save_upload(dir.to_str().unwrap(), PNG_BYTES, "png", 1024)
            .await
            .unwrap();
        assert!(relative.starts_with("posts/"));
        assert!(relative.ends_with(".png"));

        let full = dir.join(&relative);
        let written = tokio::fs::read(&full).await.unwrap();
        assert_eq!(written, PNG_BYTES);
        let _ = tokio::fs::remove_file(&full).await;
    }

    #[tokio::test]
    async fn test_save_upload_enforces_size_limit() {
        let dir = std::env::temp_dir().join("yatube-image-test");
        let result = save_upload(dir.to_str().unwrap(), PNG_BYTES, "png", 8).await;
        assert!(matches!(result, Err(AppError::FileUpload(_))));
    }
}
