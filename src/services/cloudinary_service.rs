use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use reqwest::{Client, multipart};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::server::config::ServerConfig;
use crate::web::error::AppError;

static HTTP_CLIENT: Lazy<Client> = Lazy::new(Client::new);

#[derive(Clone)]
pub struct CloudinaryService {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

impl CloudinaryService {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
        }
    }

    /// Signed multipart upload. Returns the host-assigned secure delivery URL.
    pub async fn upload_image(&self, bytes: Vec<u8>, public_id: &str) -> Result<String, AppError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params = BTreeMap::new();
        params.insert("overwrite".to_string(), "true".to_string());
        params.insert("public_id".to_string(), public_id.to_string());
        params.insert("signature_algorithm".to_string(), "sha256".to_string());
        params.insert("timestamp".to_string(), timestamp);
        let signature = self.sign(&params);

        let mut form = multipart::Form::new()
            .part("file", multipart::Part::bytes(bytes).file_name("upload"))
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        );
        let response = HTTP_CLIENT
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::ImageHost(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ImageHost(format!(
                "upload returned {status}: {body}"
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::ImageHost(format!("malformed upload response: {e}")))?;
        Ok(body.secure_url)
    }

    /// Request signature: sorted `key=value` pairs joined with `&`, the secret
    /// appended, hashed with SHA-256 and hex-encoded.
    fn sign(&self, params: &BTreeMap<String, String>) -> String {
        let joined = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Derives a transformed delivery URL by splicing the transformation string
/// into the `/upload/` path segment.
///
/// Fails open: a URL that does not carry an `/upload/` segment (or an empty
/// transformation) is returned unchanged, so callers always get a usable URL
/// and can detect the fallback by comparing against the input.
pub fn transform_image(url: &str, transformation: &str) -> String {
    if transformation.is_empty() {
        return url.to_string();
    }
    match url.split_once("/upload/") {
        Some((head, tail)) => format!("{head}/upload/{transformation}/{tail}"),
        None => {
            warn!(url, "URL has no /upload/ segment, returning it untransformed");
            url.to_string()
        }
    }
}

/// Transformation string for a width×height fill crop, e.g. `w_300,h_300,c_fill`.
pub fn fill_crop(width: u32, height: u32) -> String {
    format!("w_{width},h_{height},c_fill")
}

/// Stable per-user public id for the avatar image, so a re-upload overwrites
/// the previous one instead of accumulating copies.
pub fn avatar_public_id(email: &str) -> String {
    let digest = hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()));
    format!("avatars/{}", &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> CloudinaryService {
        CloudinaryService {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: secret.to_string(),
        }
    }

    #[test]
    fn transform_splices_into_the_upload_segment() {
        let url = "https://res.cloudinary.com/demo/image/upload/v123/sample.jpg";
        assert_eq!(
            transform_image(url, "w_300,h_300,c_fill"),
            "https://res.cloudinary.com/demo/image/upload/w_300,h_300,c_fill/v123/sample.jpg"
        );
    }

    #[test]
    fn transform_fails_open_on_unknown_url_shapes() {
        let url = "https://example.com/static/sample.jpg";
        assert_eq!(transform_image(url, "w_300,h_300,c_fill"), url);
        assert_eq!(transform_image("", "w_300,h_300,c_fill"), "");
    }

    #[test]
    fn empty_transformation_is_identity() {
        let url = "https://res.cloudinary.com/demo/image/upload/v123/sample.jpg";
        assert_eq!(transform_image(url, ""), url);
    }

    #[test]
    fn fill_crop_formats_dimensions() {
        assert_eq!(fill_crop(35, 35), "w_35,h_35,c_fill");
        assert_eq!(fill_crop(200, 300), "w_200,h_300,c_fill");
    }

    #[test]
    fn avatar_public_id_is_stable_per_address() {
        assert_eq!(avatar_public_id("Ali@Example.com "), avatar_public_id("ali@example.com"));
        assert_ne!(avatar_public_id("a@example.com"), avatar_public_id("b@example.com"));
        assert!(avatar_public_id("a@example.com").starts_with("avatars/"));
    }

    #[test]
    fn signature_is_deterministic_and_keyed() {
        let mut params = BTreeMap::new();
        params.insert("timestamp".to_string(), "1700000000".to_string());
        params.insert("public_id".to_string(), "avatars/abc".to_string());

        let a = service("secret-a").sign(&params);
        let b = service("secret-a").sign(&params);
        let c = service("secret-b").sign(&params);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
