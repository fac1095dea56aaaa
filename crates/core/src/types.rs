//! Request and response shapes for object operations

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_LIMIT: u32 = 100;
pub(crate) const DEFAULT_OFFSET: u32 = 0;
pub(crate) const DEFAULT_SORT_COLUMN: &str = "name";
pub(crate) const DEFAULT_CACHE_CONTROL: &str = "3600";
pub(crate) const DEFAULT_CONTENT_TYPE: &str = "text/plain;charset=UTF-8";
pub(crate) const DEFAULT_UPSERT: bool = false;

/// Object returned by a listing
///
/// Folder placeholders come back with `null` ids and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub name: String,
    #[serde(default)]
    pub bucket_id: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_accessed_at: Option<String>,
    /// Opaque to the client
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(rename = "buckets", default)]
    pub bucket: Option<BucketRef>,
}

impl FileObject {
    /// Folder placeholders have no id
    pub fn is_folder(&self) -> bool {
        self.id.is_none()
    }

    /// Size reported in `metadata.size`, if any
    pub fn size(&self) -> Option<u64> {
        self.metadata.get("size").and_then(|v| v.as_u64())
    }
}

/// Bucket summary embedded in [`FileObject`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    #[serde(default)]
    pub name: String,
}

/// Headers sent with an upload or update
///
/// Unset fields fall back to `cache-control: 3600`,
/// `content-type: text/plain;charset=UTF-8` and `x-upsert: false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUploadOptions {
    pub cache_control: Option<String>,
    pub content_type: Option<String>,
    pub upsert: Option<bool>,
}

impl FileUploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = Some(cache_control.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = Some(upsert);
        self
    }

    pub(crate) fn resolve(&self) -> UploadHeaders {
        UploadHeaders {
            cache_control: self
                .cache_control
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_CACHE_CONTROL.to_string()),
            content_type: self
                .content_type
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            upsert: self.upsert.unwrap_or(DEFAULT_UPSERT),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UploadHeaders {
    pub cache_control: String,
    pub content_type: String,
    pub upsert: bool,
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub column: String,
    pub order: SortOrder,
}

/// Paging and sorting for [`FileHandle::list`](crate::FileHandle::list)
///
/// Zero values are replaced with `limit = 100`, `offset = 0` and
/// `sortBy = {column: "name", order: "asc"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSearchOptions {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: SortBy,
}

impl FileSearchOptions {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    pub fn sort_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = SortBy {
            column: column.into(),
            order,
        };
        self
    }

    pub(crate) fn into_request(self, prefix: &str) -> ListFileRequest {
        let limit = if self.limit == 0 { DEFAULT_LIMIT } else { self.limit };
        let offset = if self.offset == 0 { DEFAULT_OFFSET } else { self.offset };
        let column = if self.sort_by.column.is_empty() {
            DEFAULT_SORT_COLUMN.to_string()
        } else {
            self.sort_by.column
        };

        ListFileRequest {
            limit,
            offset,
            sort_by: SortBy {
                column,
                order: self.sort_by.order,
            },
            prefix: prefix.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListFileRequest {
    pub limit: u32,
    pub offset: u32,
    pub sort_by: SortBy,
    pub prefix: String,
}

/// Body of move and copy requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransferRequest<'a> {
    pub bucket_id: &'a str,
    pub source_key: &'a str,
    pub destination_key: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct BulkRemoveRequest<'a> {
    pub prefixes: &'a [String],
}

/// `{key, message}` answer of upload, update, move, copy and bulk remove
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileResponse {
    #[serde(default, alias = "Key")]
    pub key: String,
    #[serde(default, alias = "Message")]
    pub message: String,
}

impl FileResponse {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.message.is_empty()
    }
}

/// Metadata read from the object info endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub media_type: String,
}
