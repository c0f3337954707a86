use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{StoredObject, SupabaseClient, SupabaseError};

use crate::models::{PatientError, ProfileImage};

pub const PROFILE_BUCKET: &str = "profiles";

/// Largest decoded image accepted; the base64 body must also fit axum's default body limit.
pub const MAX_IMAGE_BYTES: usize = 1024 * 1024;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

pub struct AvatarService {
    supabase: Arc<SupabaseClient>,
}

impl AvatarService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    /// One image per patient; a new upload replaces the previous one.
    pub async fn upload(&self, patient_id: Uuid, image: &str) -> Result<ProfileImage, PatientError> {
        let bytes = decode_image(image)?;
        let content_type = sniff_content_type(&bytes).ok_or_else(|| {
            PatientError::ValidationError("image must be a PNG or JPEG".to_string())
        })?;

        let path = format!("/rest/v1/patients?id=eq.{}&select=id", patient_id);
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;
        if rows.is_empty() {
            return Err(PatientError::NotFound);
        }

        let size = bytes.len();
        debug!("Uploading {} byte profile image for patient {}", size, patient_id);
        self.supabase
            .upload_object(PROFILE_BUCKET, &object_name(patient_id), bytes, content_type)
            .await?;

        info!("Profile image stored for patient {}", patient_id);
        Ok(ProfileImage {
            patient_id,
            content_type: content_type.to_string(),
            size,
        })
    }

    pub async fn download(&self, patient_id: Uuid) -> Result<StoredObject, PatientError> {
        match self.supabase.download_object(PROFILE_BUCKET, &object_name(patient_id)).await {
            Ok(object) => Ok(object),
            Err(SupabaseError::NotFound(_)) => Err(PatientError::ImageNotFound),
            Err(e) => Err(e.into()),
        }
    }
}

fn object_name(patient_id: Uuid) -> String {
    format!("avatars/{}", patient_id)
}

/// Accepts bare base64 or a `data:<mime>;base64,<payload>` URL.
fn decode_image(image: &str) -> Result<Vec<u8>, PatientError> {
    let payload = match image.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => image,
    };

    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| PatientError::ValidationError(format!("image is not valid base64: {}", e)))?;

    if bytes.is_empty() {
        return Err(PatientError::ValidationError("image is empty".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(PatientError::ValidationError(format!(
            "image exceeds {} bytes",
            MAX_IMAGE_BYTES
        )));
    }

    Ok(bytes)
}

fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(PNG_MAGIC) {
        Some("image/png")
    } else if bytes.starts_with(JPEG_MAGIC) {
        Some("image/jpeg")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_decode_accepts_data_url_and_bare_base64() {
        let png = [PNG_MAGIC, b"rest"].concat();
        let encoded = BASE64.encode(&png);

        let from_url = decode_image(&format!("data:image/png;base64,{}", encoded)).unwrap();
        let bare = decode_image(&encoded).unwrap();

        assert_eq!(from_url, png);
        assert_eq!(bare, png);
        assert_eq!(sniff_content_type(&bare), Some("image/png"));
    }

    #[test]
    fn test_decode_rejects_garbage_and_oversized_images() {
        assert_matches!(decode_image("not base64!"), Err(PatientError::ValidationError(_)));
        assert_matches!(decode_image(""), Err(PatientError::ValidationError(_)));

        let huge = BASE64.encode(vec![0xFF; MAX_IMAGE_BYTES + 1]);
        assert_matches!(decode_image(&huge), Err(PatientError::ValidationError(msg)) if msg.contains("exceeds"));
    }

    #[test]
    fn test_only_png_and_jpeg_are_recognised() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_content_type(b"GIF89a"), None);
    }
}
