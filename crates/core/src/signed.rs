//! Signed and public object URLs

use crate::error::Result;
use crate::file::FileHandle;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability granted by a signed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedUrlKind {
    Upload,
    Download,
}

impl SignedUrlKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignedUrlKind::Upload => "upload",
            SignedUrlKind::Download => "download",
        }
    }

    /// Signing route below `/object`
    fn route(&self) -> &str {
        match self {
            SignedUrlKind::Upload => "object/upload/sign",
            SignedUrlKind::Download => "object/sign",
        }
    }
}

impl fmt::Display for SignedUrlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Signed upload URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedUploadUrl {
    /// Absolute once returned by [`FileHandle::create_signed_url_for_upload`]
    pub url: String,
    #[serde(default)]
    pub token: String,
}

/// Signed download URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedDownloadUrl {
    #[serde(rename = "signedURL")]
    pub signed_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

/// The service answers with a path relative to the storage root (`/object/...`).
pub(crate) fn absolute_url(storage_root: &str, relative: &str) -> String {
    if relative.starts_with('/') {
        format!("{}{}", storage_root, relative)
    } else {
        format!("{}/{}", storage_root, relative)
    }
}

impl FileHandle {
    /// Create a URL allowing one upload to `path` without credentials
    pub async fn create_signed_url_for_upload(
        &self,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<SignedUploadUrl> {
        let mut signed: SignedUploadUrl = self
            .sign(SignedUrlKind::Upload, path, expires_in_secs)
            .await?;
        signed.url = absolute_url(&self.client.storage_root(), &signed.url);
        Ok(signed)
    }

    /// Create a time-limited download URL for `path`
    pub async fn create_signed_url_for_download(
        &self,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<SignedDownloadUrl> {
        let mut signed: SignedDownloadUrl = self
            .sign(SignedUrlKind::Download, path, expires_in_secs)
            .await?;
        signed.signed_url = absolute_url(&self.client.storage_root(), &signed.signed_url);
        Ok(signed)
    }

    /// URL of `path` in a public bucket. No request is made.
    pub fn get_public_url(&self, path: &str) -> String {
        self.client
            .storage_url(&format!("object/public/{}/{}", self.bucket_id, path))
    }

    async fn sign<T>(&self, kind: SignedUrlKind, path: &str, expires_in_secs: u64) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = self
            .client
            .json_request(
                Method::POST,
                &format!("{}/{}/{}", kind.route(), self.bucket_id, path),
            )
            .json(&SignRequest {
                expires_in: expires_in_secs,
            });

        self.client.send_json(request).await
    }
}
