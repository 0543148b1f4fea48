use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// URL prefix the app serves uploaded files under. Deletion only ever
/// touches paths carrying this prefix, so a tampered profile record cannot
/// point the cleanup at arbitrary files.
pub const UPLOADS_URL_PREFIX: &str = "/api/uploads/";

/// Decodes a base64 image payload, tolerating a data-URL header
/// (`data:image/png;base64,...`).
pub fn decode_image(payload: &str) -> ApiResult<Vec<u8>> {
    let raw = match payload.split_once("base64,") {
        Some((_, rest)) => rest,
        None => payload,
    };
    let bytes = STANDARD
        .decode(raw.trim())
        .map_err(|_| ApiError::Validation("Invalid image data".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("Empty image data".to_string()));
    }
    Ok(bytes)
}

fn image_filename(kind: &str, user_id: Uuid) -> String {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("{kind}_{user_id}_{suffix}.jpg")
}

/// Writes the image under the uploads directory and returns the public URL.
pub async fn store_image(
    uploads_dir: &str,
    kind: &str,
    user_id: Uuid,
    bytes: &[u8],
) -> ApiResult<String> {
    let filename = image_filename(kind, user_id);
    let path = PathBuf::from(uploads_dir).join(&filename);
    tokio::fs::create_dir_all(uploads_dir)
        .await
        .context("Failed to create uploads directory")?;
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write upload {}", path.display()))?;
    Ok(format!("{UPLOADS_URL_PREFIX}{filename}"))
}

/// Maps a public upload URL back to its file on disk. Returns None for
/// anything outside the uploads prefix (external URLs, presets, traversal).
pub fn uploaded_file_path(uploads_dir: &str, url_path: &str) -> Option<PathBuf> {
    let filename = url_path.strip_prefix(UPLOADS_URL_PREFIX)?;
    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        return None;
    }
    Some(Path::new(uploads_dir).join(filename))
}

/// Best-effort removal of a previously stored upload. Non-upload paths are
/// silently ignored.
pub async fn remove_uploaded_file(uploads_dir: &str, url_path: &str) -> anyhow::Result<()> {
    let Some(path) = uploaded_file_path(uploads_dir, url_path) else {
        return Ok(());
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove upload {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_base64() {
        let bytes = decode_image(&STANDARD.encode(b"image-bytes")).unwrap();
        assert_eq!(bytes, b"image-bytes");
    }

    #[test]
    fn decodes_data_url() {
        let payload = format!("data:image/png;base64,{}", STANDARD.encode(b"png"));
        assert_eq!(decode_image(&payload).unwrap(), b"png");
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_image("not base64 at all!!!").is_err());
        assert!(decode_image("").is_err());
    }

    #[test]
    fn path_guard_only_accepts_upload_urls() {
        assert!(uploaded_file_path("uploads", "/api/uploads/avatar_x.jpg").is_some());
        assert!(uploaded_file_path("uploads", "https://cdn.example.com/pic.jpg").is_none());
        assert!(uploaded_file_path("uploads", "/etc/passwd").is_none());
        assert!(uploaded_file_path("uploads", "/api/uploads/../secrets").is_none());
        assert!(uploaded_file_path("uploads", "/api/uploads/").is_none());
    }

    #[test]
    fn filenames_embed_kind_and_user() {
        let user_id = uuid::Uuid::new_v4();
        let name = image_filename("avatar", user_id);
        assert!(name.starts_with("avatar_"));
        assert!(name.contains(&user_id.to_string()));
        assert!(name.ends_with(".jpg"));
    }
}
