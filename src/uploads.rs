use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::key_from_public_path;

/// Body limit applied to upload routes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Reads the first multipart field called `field_name` as an image.
pub async fn read_image_field(mp: &mut Multipart, field_name: &str) -> AppResult<UploadItem> {
    loop {
        let field = match mp.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => {
                return Err(AppError::validation(format!(
                    "El campo {field_name} es obligatorio"
                )))
            }
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::validation("Formulario multipart inválido"));
            }
        };
        if field.name() != Some(field_name) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        if ext_from_mime(&content_type).is_none() {
            return Err(AppError::validation("Tipo de archivo no permitido"));
        }
        let body = field.bytes().await.map_err(|e| {
            warn!(error = %e, "multipart read failed");
            AppError::validation("No se pudo leer el archivo")
        })?;
        if body.is_empty() {
            return Err(AppError::validation("El archivo está vacío"));
        }
        return Ok(UploadItem { body, content_type });
    }
}

/// Stores the image under `prefix/` and returns its public path.
pub async fn store_image(st: &AppState, prefix: &str, item: UploadItem) -> AppResult<String> {
    let ext = ext_from_mime(&item.content_type).unwrap_or("bin");
    let key = format!("{}/{}.{}", prefix, Uuid::new_v4(), ext);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    debug!(%key, "image stored");
    Ok(st.storage.public_path(&key))
}

/// Best-effort removal of a replaced file.
pub async fn discard(st: &AppState, old_path: Option<String>) {
    let Some(path) = old_path else { return };
    let Some(key) = key_from_public_path(&path) else { return };
    if let Err(e) = st.storage.delete_object(key).await {
        warn!(error = %e, %key, "failed to remove replaced upload");
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_ext_from_mime() {
        assert_eq!(super::ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(super::ext_from_mime("image/png"), Some("png"));
        assert_eq!(super::ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(super::ext_from_mime("image/gif"), Some("gif"));
        assert_eq!(super::ext_from_mime("application/pdf"), None);
    }

    #[tokio::test]
    async fn store_image_returns_public_path() {
        let state = crate::state::AppState::fake();
        let path = super::store_image(
            &state,
            "programs",
            super::UploadItem {
                body: bytes::Bytes::from_static(b"png"),
                content_type: "image/png".into(),
            },
        )
        .await
        .unwrap();
        assert!(path.starts_with("/uploads/programs/"));
        assert!(path.ends_with(".png"));
    }
}
