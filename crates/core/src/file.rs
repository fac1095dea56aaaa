//! Object operations scoped to a single bucket

use crate::client::StorageClient;
use crate::error::{Error, Result};
use crate::types::{
    BulkRemoveRequest, FileMetadata, FileObject, FileResponse, FileSearchOptions,
    FileUploadOptions, TransferRequest,
};
use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Body, Method, StatusCode};
use std::path::Path;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tracing::debug;

/// Object operations for one bucket
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub(crate) client: StorageClient,
    pub(crate) bucket_id: String,
}

impl FileHandle {
    pub fn new(client: StorageClient, bucket_id: impl Into<String>) -> Self {
        Self {
            client,
            bucket_id: bucket_id.into(),
        }
    }

    pub fn bucket_id(&self) -> &str {
        &self.bucket_id
    }

    /// Upload a new object. The body is streamed from `data`.
    pub async fn upload<R>(
        &self,
        path: &str,
        data: R,
        options: Option<FileUploadOptions>,
    ) -> Result<FileResponse>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        self.upload_or_update(Method::POST, path, data, options).await
    }

    /// Replace an existing object. The body is streamed from `data`.
    pub async fn update<R>(
        &self,
        path: &str,
        data: R,
        options: Option<FileUploadOptions>,
    ) -> Result<FileResponse>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        self.upload_or_update(Method::PUT, path, data, options).await
    }

    /// Upload a local file, guessing the content type from its extension
    /// when `options` does not set one
    pub async fn upload_file(
        &self,
        path: &str,
        local_path: &Path,
        options: Option<FileUploadOptions>,
    ) -> Result<FileResponse> {
        let file = tokio::fs::File::open(local_path).await?;

        let mut options = options.unwrap_or_default();
        if options.content_type.is_none() {
            let guessed = mime_guess::from_path(local_path).first_or_octet_stream();
            options.content_type = Some(guessed.to_string());
        }

        self.upload(path, file, Some(options)).await
    }

    async fn upload_or_update<R>(
        &self,
        method: Method,
        path: &str,
        data: R,
        options: Option<FileUploadOptions>,
    ) -> Result<FileResponse>
    where
        R: AsyncRead + Send + Sync + 'static,
    {
        let headers = options.unwrap_or_default().resolve();
        let object_path = collapse_separators(&format!("{}/{}", self.bucket_id, path));

        let request = self
            .client
            .request(method, &format!("object/{}", object_path))
            .header(CACHE_CONTROL, headers.cache_control)
            .header(CONTENT_TYPE, headers.content_type)
            .header("x-upsert", headers.upsert.to_string())
            .body(Body::wrap_stream(ReaderStream::new(data)));

        self.client.send_json(request).await
    }

    /// Move an object within the bucket
    pub async fn move_object(&self, from_path: &str, to_path: &str) -> Result<FileResponse> {
        let request = self
            .client
            .json_request(Method::POST, "object/move")
            .json(&self.transfer(from_path, to_path));

        self.client.send_json(request).await
    }

    /// Copy an object within the bucket
    pub async fn copy(&self, from_path: &str, to_path: &str) -> Result<FileResponse> {
        let request = self
            .client
            .json_request(Method::POST, &format!("object/copy/{}", self.bucket_id))
            .json(&self.transfer(from_path, to_path));

        self.client.send_json(request).await
    }

    fn transfer<'a>(&'a self, from_path: &'a str, to_path: &'a str) -> TransferRequest<'a> {
        TransferRequest {
            bucket_id: &self.bucket_id,
            source_key: from_path,
            destination_key: to_path,
        }
    }

    /// Delete a single object
    pub async fn remove(&self, path: &str) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &format!("object/{}/{}", self.bucket_id, path));

        self.client.send_empty(request).await
    }

    /// Delete several objects at once
    ///
    /// Returns an empty [`FileResponse`] on HTTP 200. Any other status is
    /// answered with the `{key, message}` body the service sent back.
    pub async fn bulk_remove(&self, paths: &[String]) -> Result<FileResponse> {
        let request = self
            .client
            .json_request(Method::DELETE, &format!("object/{}", self.bucket_id))
            .json(&BulkRemoveRequest { prefixes: paths });

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status == StatusCode::OK {
            return Ok(FileResponse::default());
        }

        let body = self.client.read_body(response).await?;
        debug!(status = status.as_u16(), bucket = %self.bucket_id, "bulk remove rejected");
        Ok(serde_json::from_slice(&body)?)
    }

    /// List objects under `prefix`
    pub async fn list(&self, prefix: &str, options: FileSearchOptions) -> Result<Vec<FileObject>> {
        let request = self
            .client
            .json_request(Method::POST, &format!("object/list/{}", self.bucket_id))
            .json(&options.into_request(prefix));

        self.client.send_json(request).await
    }

    /// Download an object's bytes
    ///
    /// Fails with [`Error::NotFound`] when the service reports status `"404"`.
    pub async fn download(&self, path: &str) -> Result<Bytes> {
        let request = self.client.request(
            Method::GET,
            &format!("object/authenticated/{}/{}", self.bucket_id, path),
        );

        let response = self.client.execute(request).await?;
        if response.status() != StatusCode::OK {
            return Err(self.client.strict_service_error(response).await);
        }

        self.client.read_body(response).await
    }

    /// Download an object into `dest`, creating parent directories.
    /// Returns the number of bytes written.
    pub async fn download_to_file(&self, path: &str, dest: &Path) -> Result<u64> {
        let data = self.download(path).await?;

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(dest, &data).await?;

        Ok(data.len() as u64)
    }

    /// Object metadata; currently only the media type
    pub async fn get_file_metadata(&self, path: &str) -> Result<FileMetadata> {
        let request = self.client.request(
            Method::GET,
            &format!("object/info/authenticated/{}/{}", self.bucket_id, path),
        );

        let response = self.client.execute(request).await?;
        if response.status() != StatusCode::OK {
            return Err(self.client.strict_service_error(response).await);
        }

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(FileMetadata { media_type })
    }

    /// Check if an object exists
    pub async fn exists(&self, path: &str) -> Result<bool> {
        match self.get_file_metadata(path).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Collapse runs of `/` into a single separator
pub fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;

    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientConfig;
    use crate::types::SortOrder;
    use serde_json::json;
    use std::io::Cursor;
    use wiremock::matchers::{body_json, body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn handle_for(server: &MockServer, bucket: &str) -> FileHandle {
        StorageClient::new(ClientConfig::new(server.uri(), "key"))
            .unwrap()
            .from(bucket)
    }

    #[test]
    fn test_collapse_separators() {
        assert_eq!(collapse_separators("bucket//dir/file.txt"), "bucket/dir/file.txt");
        assert_eq!(collapse_separators("a//b"), "a/b");
        assert_eq!(collapse_separators("a///b"), "a/b");
        assert_eq!(collapse_separators("a/b/c"), "a/b/c");
        assert_eq!(collapse_separators(""), "");
    }

    #[tokio::test]
    async fn test_upload_default_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/docs/notes/a.txt"))
            .and(header("cache-control", "3600"))
            .and(header("content-type", "text/plain;charset=UTF-8"))
            .and(header("x-upsert", "false"))
            .and(header("authorization", "Bearer key"))
            .and(body_string("hello world"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Key": "docs/notes/a.txt"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = handle_for(&server, "docs")
            .upload("/notes/a.txt", Cursor::new(b"hello world".to_vec()), None)
            .await
            .unwrap();

        assert_eq!(response.key, "docs/notes/a.txt");
    }

    #[tokio::test]
    async fn test_update_uses_put_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/storage/v1/object/docs/a.png"))
            .and(header("cache-control", "60"))
            .and(header("content-type", "image/png"))
            .and(header("x-upsert", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "docs/a.png"})))
            .expect(1)
            .mount(&server)
            .await;

        let options = FileUploadOptions::new()
            .cache_control("60")
            .content_type("image/png")
            .upsert(true);

        let response = handle_for(&server, "docs")
            .update("a.png", Cursor::new(vec![0u8, 1, 2]), Some(options))
            .await
            .unwrap();

        assert_eq!(response.key, "docs/a.png");
    }

    #[tokio::test]
    async fn test_upload_service_error_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "statusCode": "409",
                "error": "Duplicate",
                "message": "The resource already exists"
            })))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs")
            .upload("a.txt", Cursor::new(b"x".to_vec()), None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_upload_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs")
            .upload("a.txt", Cursor::new(b"x".to_vec()), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_upload_file_guesses_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/docs/report.json"))
            .and(header("content-type", "application/json"))
            .and(body_string("{\"ok\":true}"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Key": "docs/report.json"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("report.json");
        std::fs::write(&local, "{\"ok\":true}").unwrap();

        let response = handle_for(&server, "docs")
            .upload_file("report.json", &local, None)
            .await
            .unwrap();

        assert_eq!(response.key, "docs/report.json");
    }

    #[tokio::test]
    async fn test_move_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/move"))
            .and(body_json(json!({
                "bucketId": "docs",
                "sourceKey": "a.txt",
                "destinationKey": "archive/a.txt"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Successfully moved"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = handle_for(&server, "docs")
            .move_object("a.txt", "archive/a.txt")
            .await
            .unwrap();

        assert_eq!(response.message, "Successfully moved");
    }

    #[tokio::test]
    async fn test_copy_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/copy/docs"))
            .and(body_json(json!({
                "bucketId": "docs",
                "sourceKey": "a.txt",
                "destinationKey": "b.txt"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Key": "docs/b.txt"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = handle_for(&server, "docs").copy("a.txt", "b.txt").await.unwrap();

        assert_eq!(response.key, "docs/b.txt");
    }

    #[tokio::test]
    async fn test_remove() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/docs/dir/a.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Successfully deleted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        handle_for(&server, "docs").remove("dir/a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "statusCode": "403",
                "error": "Unauthorized",
                "message": "new row violates row-level security policy"
            })))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").remove("a.txt").await.unwrap_err();

        match err {
            Error::Api(api) => assert_eq!(api.error, "Unauthorized"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bulk_remove_success() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/docs"))
            .and(body_json(json!({"prefixes": ["a.txt", "b.txt"]})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let paths = vec!["a.txt".to_string(), "b.txt".to_string()];
        let response = handle_for(&server, "docs").bulk_remove(&paths).await.unwrap();

        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_remove_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/storage/v1/object/docs"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"key": "docs", "message": "Invalid prefixes"})),
            )
            .mount(&server)
            .await;

        let paths = vec!["".to_string()];
        let response = handle_for(&server, "docs").bulk_remove(&paths).await.unwrap();

        assert_eq!(response.key, "docs");
        assert_eq!(response.message, "Invalid prefixes");
    }

    #[tokio::test]
    async fn test_list_fills_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/docs"))
            .and(body_json(json!({
                "limit": 100,
                "offset": 0,
                "sortBy": {"column": "name", "order": "asc"},
                "prefix": ""
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "b.txt", "id": "2", "metadata": {"size": 3}},
                {"name": "a.txt", "id": "1", "metadata": {"size": 5}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let objects = handle_for(&server, "docs")
            .list("", FileSearchOptions::default())
            .await
            .unwrap();

        let names: Vec<_> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.txt"]);
    }

    #[tokio::test]
    async fn test_list_with_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/list/docs"))
            .and(body_json(json!({
                "limit": 5,
                "offset": 10,
                "sortBy": {"column": "updated_at", "order": "desc"},
                "prefix": "reports"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let options = FileSearchOptions::default()
            .limit(5)
            .offset(10)
            .sort_by("updated_at", SortOrder::Desc);
        let objects = handle_for(&server, "docs").list("reports", options).await.unwrap();

        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_download_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/authenticated/docs/a.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let data = handle_for(&server, "docs").download("a.bin").await.unwrap();

        assert_eq!(&data[..], &[1u8, 2, 3]);
    }

    #[tokio::test]
    async fn test_download_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "statusCode": "404",
                "error": "not_found",
                "message": "Object not found"
            })))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").download("ghost.bin").await.unwrap_err();

        assert!(matches!(err, Error::NotFound(ref message) if message == "Object not found"));
    }

    #[tokio::test]
    async fn test_download_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "statusCode": "403",
                "error": "Unauthorized",
                "message": "Invalid signature"
            })))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").download("a.bin").await.unwrap_err();

        match err {
            Error::Api(api) => {
                assert_eq!(api.status_code, "403");
                assert_eq!(api.status(), Some(403));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_undecodable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").download("a.bin").await.unwrap_err();

        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_download_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/authenticated/docs/a.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("contents"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/out/a.txt");

        let written = handle_for(&server, "docs")
            .download_to_file("a.txt", &dest)
            .await
            .unwrap();

        assert_eq!(written, 8);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "contents");
    }

    #[tokio::test]
    async fn test_file_metadata_from_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/info/authenticated/docs/a.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .expect(1)
            .mount(&server)
            .await;

        let metadata = handle_for(&server, "docs").get_file_metadata("a.png").await.unwrap();

        assert_eq!(metadata.media_type, "image/png");
    }

    #[tokio::test]
    async fn test_file_metadata_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/info/authenticated/docs/a.png"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "statusCode": "403",
                "error": "Unauthorized",
                "message": "new row violates row-level security policy"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").get_file_metadata("a.png").await.unwrap_err();

        match err {
            Error::Api(api) => {
                assert_eq!(api.status_code, "403");
                assert_eq!(api.error, "Unauthorized");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_metadata_undecodable_error_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/info/authenticated/docs/a.png"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let err = handle_for(&server, "docs").get_file_metadata("a.png").await.unwrap_err();

        assert!(matches!(err, Error::Json(_)));
    }

    #[tokio::test]
    async fn test_exists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/info/authenticated/docs/a.png"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/object/info/authenticated/docs/ghost.png"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "statusCode": "404",
                "error": "not_found",
                "message": "Object not found"
            })))
            .mount(&server)
            .await;

        let handle = handle_for(&server, "docs");

        assert!(handle.exists("a.png").await.unwrap());
        assert!(!handle.exists("ghost.png").await.unwrap());
    }
}
