//! stowage-core - Client library for the storage REST API
//!
//! This library wraps the bucket and object endpoints of a storage service:
//! bucket management, uploads and downloads, listings, signed URLs and
//! configuration management for the `stowage` CLI.

pub mod bucket;
pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod signed;
pub mod types;

// Re-export commonly used types
pub use bucket::{Bucket, BucketAdmin, BucketMessage, BucketOptions};
pub use client::{ClientConfig, StorageClient, DEFAULT_STORAGE_ENDPOINT};
pub use config::{config_exists, get_config_path, load_config, save_config, validate_config};
pub use config::MAX_EXPIRATION;
pub use config::{AdvancedConfig, ConfigFile, DefaultsConfig, LoggingConfig, StorageConfig};
pub use error::{Error, Result, StorageApiError};
pub use file::{collapse_separators, FileHandle};
pub use signed::{SignedDownloadUrl, SignedUploadUrl, SignedUrlKind};
pub use types::{
    BucketRef, FileMetadata, FileObject, FileResponse, FileSearchOptions, FileUploadOptions,
    SortBy, SortOrder,
};

// Lets callers build cancellation tokens without depending on tokio-util.
pub use tokio_util::sync::CancellationToken;
