//! Bucket management against the `/bucket` endpoints

use crate::client::StorageClient;
use crate::error::Result;
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Bucket-level operations
#[derive(Debug, Clone)]
pub struct BucketAdmin {
    client: StorageClient,
}

impl BucketAdmin {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }

    /// Create a new bucket
    pub async fn create_bucket(&self, options: &BucketOptions) -> Result<Bucket> {
        let request = self
            .client
            .json_request(Method::POST, "bucket")
            .json(options);

        self.client.send_json(request).await
    }

    /// Get details of a specific bucket
    pub async fn get_bucket(&self, id: &str) -> Result<Bucket> {
        let request = self
            .client
            .json_request(Method::GET, &format!("bucket/{}", id));

        self.client.send_json(request).await
    }

    /// List all buckets, in the order the service returns them
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let request = self.client.json_request(Method::GET, "bucket/");

        self.client.send_json(request).await
    }

    /// Delete every object in a bucket
    pub async fn empty_bucket(&self, id: &str) -> Result<BucketMessage> {
        let request = self
            .client
            .json_request(Method::POST, &format!("bucket/{}/empty", id));

        self.client.send_json(request).await
    }

    /// Update a bucket's name or visibility
    pub async fn update_bucket(&self, id: &str, options: &BucketOptions) -> Result<BucketMessage> {
        let request = self
            .client
            .json_request(Method::PUT, &format!("bucket/{}", id))
            .json(options);

        self.client.send_json(request).await
    }

    /// Delete a bucket
    ///
    /// The service refuses to delete buckets that still hold objects; call
    /// [`empty_bucket`](Self::empty_bucket) first.
    pub async fn delete_bucket(&self, id: &str) -> Result<Bucket> {
        let request = self
            .client
            .json_request(Method::DELETE, &format!("bucket/{}", id));

        self.client.send_json(request).await
    }
}

/// Bucket information
///
/// Every field defaults when absent: create and delete answer with a partial
/// object (`{"name": ...}` or `{"message": ...}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub public: bool,
}

/// Request payload for creating or updating a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketOptions {
    pub id: String,
    pub name: String,
    pub public: bool,
}

impl BucketOptions {
    /// Private bucket whose name equals its id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            public: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }
}

/// Message returned by empty/update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMessage {
    #[serde(default)]
    pub message: String,
}
