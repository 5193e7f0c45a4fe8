use bytes::Bytes;
use time::OffsetDateTime;
use tracing::error;

use crate::{error::ApiError, state::AppState};

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// One photo taken off the multipart stream, not yet validated.
pub struct PhotoUpload {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

/// MIME and size gates. Runs before anything touches the disk, so a
/// rejected photo leaves no partial file behind.
pub fn validate_photo(photo: &PhotoUpload) -> Result<&'static str, String> {
    if !photo.content_type.starts_with("image/") {
        return Err("Photo must be an image".into());
    }
    let ext = ext_from_mime(&photo.content_type)
        .ok_or_else(|| format!("Unsupported image type: {}", photo.content_type))?;
    if photo.body.len() > MAX_PHOTO_BYTES {
        return Err("Photo must be 5MB or smaller".into());
    }
    Ok(ext)
}

// The stored name is always server-generated; the client filename never
// reaches the filesystem.
fn generate_key(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}-{}.{}", millis, rand::random::<u32>(), ext)
}

/// Validate and persist a photo, returning the storage key.
pub async fn store_photo(state: &AppState, photo: &PhotoUpload) -> Result<String, ApiError> {
    let ext = validate_photo(photo).map_err(ApiError::Validation)?;
    let key = generate_key(ext);
    state
        .storage
        .put_object(&key, photo.body.clone(), &photo.content_type)
        .await
        .map_err(ApiError::Internal)?;
    Ok(key)
}

/// Remove a photo written earlier in a request that subsequently failed.
/// Cleanup is part of the upload contract, not best-effort tidying, but a
/// failed delete only gets logged: the original error is what the client
/// must see.
pub async fn discard_photo(state: &AppState, key: &str) {
    if let Err(e) = state.storage.delete_object(key).await {
        error!(error = %e, key, "failed to remove orphaned upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(content_type: &str, len: usize) -> PhotoUpload {
        PhotoUpload {
            body: Bytes::from(vec![0u8; len]),
            content_type: content_type.into(),
        }
    }

    #[test]
    fn ext_mapping() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/pdf"), None);
    }

    #[test]
    fn rejects_non_image_content_types() {
        let reason = validate_photo(&photo("application/pdf", 10)).unwrap_err();
        assert!(reason.contains("must be an image"));
    }

    #[test]
    fn rejects_oversized_photos() {
        let reason = validate_photo(&photo("image/png", MAX_PHOTO_BYTES + 1)).unwrap_err();
        assert!(reason.contains("5MB"));
    }

    #[test]
    fn accepts_a_small_jpeg() {
        assert_eq!(validate_photo(&photo("image/jpeg", 1024)).unwrap(), "jpg");
    }

    #[test]
    fn keys_carry_the_mapped_extension_and_no_path() {
        let key = generate_key("png");
        assert!(key.ends_with(".png"));
        assert!(!key.contains('/'));
        assert_ne!(generate_key("png"), key);
    }

    #[tokio::test]
    async fn oversized_photo_never_reaches_storage() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        struct CountingStorage(AtomicUsize);
        #[axum::async_trait]
        impl crate::storage::StorageClient for CountingStorage {
            async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let counting = Arc::new(CountingStorage(AtomicUsize::new(0)));
        let mut state = crate::state::AppState::fake();
        state.storage = counting.clone();

        let err = store_photo(&state, &photo("image/png", MAX_PHOTO_BYTES + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
    }
}
