use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use crate::config::{ApiKey, ClientConfig, API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL};
use crate::errors::{MeditrailError, Result};
use crate::models::{UploadRequest, UploadResult};
use crate::response::{classify_response, network_error};
use crate::transport::{FilePart, MultipartRequest, ReqwestTransport, Transport};

/// Largest file the API accepts: 50 MiB.
pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Extensions the API documents as supported.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use meditrail::ClientBuilder;
///
/// # fn example() -> meditrail::Result<()> {
/// let client = ClientBuilder::new()
///     .api_key("mt_live_abc123")
///     .base_url("https://staging.example.com/api/v1/")
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key sent as `X-API-Key`.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the base URL (defaults to `https://meditrail.unitedwecare.com/api/v1`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Replace the HTTP layer, e.g. with a recording transport in tests.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Build the [`Client`].
    ///
    /// Unset values fall back to the `MEDITRAIL_API_KEY` and
    /// `MEDITRAIL_BASE_URL` environment variables.
    ///
    /// Returns [`MeditrailError::Config`] if no usable key is available.
    pub fn build(self) -> Result<Client> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();
        let base_url = self
            .base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let config = ClientConfig::new(ApiKey::parse(api_key)?, &base_url)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };

        Ok(Client {
            config: Arc::new(config),
            transport,
        })
    }
}

/// The Meditrail OCR API client.
///
/// Holds only immutable configuration, so one instance can be cloned and
/// shared across tasks. Every call is an independent request.
///
/// # Example
///
/// ```no_run
/// use meditrail::Client;
///
/// # async fn example() -> meditrail::Result<()> {
/// let client = Client::new("mt_live_abc123")?;
///
/// let result = client
///     .submit("prescription.pdf", Some("Prescription document"), None)
///     .await?;
/// println!("{} (clinical: {})", result.id, result.clinical_relevance);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Client {
    /// Create a new client with the given API key and the production base URL.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new()
            .api_key(api_key)
            .base_url(DEFAULT_BASE_URL)
            .build()
    }

    /// The settings this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upload a document for OCR and clinical extraction.
    ///
    /// `text` and `system_prompt` are only sent when non-blank.
    ///
    /// # Errors
    ///
    /// - [`MeditrailError::FileNotFound`] if the path is not a readable file.
    /// - [`MeditrailError::FileTooLarge`] if the file exceeds 50 MiB. Nothing is sent.
    /// - [`MeditrailError::Api`] for any server-reported or transport failure.
    pub async fn submit(
        &self,
        path: impl AsRef<Path>,
        text: Option<&str>,
        system_prompt: Option<&str>,
    ) -> Result<UploadResult> {
        let mut request = UploadRequest::new(path);
        if let Some(text) = text {
            request = request.text(text);
        }
        if let Some(prompt) = system_prompt {
            request = request.system_prompt(prompt);
        }
        self.submit_request(request).await
    }

    /// Same as [`submit`](Self::submit), taking a prepared [`UploadRequest`].
    pub async fn submit_request(&self, request: UploadRequest) -> Result<UploadResult> {
        let file = read_upload(request.file_path()).await?;

        let fields = request
            .form_fields()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        let multipart = MultipartRequest {
            url: self.config.process_url(),
            api_key: self.config.api_key().clone(),
            file,
            fields,
        };

        debug!(
            url = %multipart.url,
            file_name = %multipart.file.file_name,
            content_type = %multipart.file.content_type,
            size_bytes = multipart.file.bytes.len(),
            has_text = multipart.field("text").is_some(),
            has_system_prompt = multipart.field("system_prompt").is_some(),
            "submitting document"
        );

        let response = self.transport.send(multipart).await.map_err(|err| {
            debug!(error = %err, "upload failed before a response was received");
            network_error(&err)
        })?;

        classify_response(response.status, &response.body)
    }
}

/// Validate and load the file to upload. The handle is dropped on return.
async fn read_upload(path: &Path) -> Result<FilePart> {
    let not_found = || MeditrailError::FileNotFound {
        path: path.to_path_buf(),
    };

    let mut file = tokio::fs::File::open(path).await.map_err(|err| {
        debug!(path = %path.display(), error = %err, "cannot open upload");
        not_found()
    })?;
    let metadata = file.metadata().await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let size_bytes = metadata.len();
    if size_bytes > MAX_FILE_SIZE {
        return Err(MeditrailError::FileTooLarge {
            size_bytes,
            limit_bytes: MAX_FILE_SIZE,
        });
    }

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    if !extension
        .as_deref()
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext))
    {
        warn!(path = %path.display(), "file type is not one of PDF, JPG, JPEG, PNG; sending anyway");
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    // The file may have grown since the metadata call.
    let bytes = read_capped(&mut file, size_bytes, MAX_FILE_SIZE).await?;

    Ok(FilePart {
        file_name,
        content_type,
        bytes,
    })
}

/// Read at most `limit` bytes; anything beyond that is `FileTooLarge`.
async fn read_capped<R>(reader: R, expected_len: u64, limit: u64) -> Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::with_capacity(expected_len.min(limit) as usize);
    reader.take(limit + 1).read_to_end(&mut bytes).await?;
    if bytes.len() as u64 > limit {
        return Err(MeditrailError::FileTooLarge {
            size_bytes: bytes.len() as u64,
            limit_bytes: limit,
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use crate::errors::ApiErrorKind;
    use crate::transport::{RawResponse, TransportError};

    /// Records every request and answers with a body echoing the `text` field.
    #[derive(Default)]
    struct EchoTransport {
        calls: AtomicUsize,
        seen: Mutex<Vec<MultipartRequest>>,
    }

    #[async_trait]
    impl Transport for Arc<EchoTransport> {
        async fn send(&self, request: MultipartRequest) -> std::result::Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let token = request.field("text").unwrap_or("none").to_string();
            let file_name = request.file.file_name.clone();
            self.seen.lock().unwrap().push(request);

            // Yield so concurrent submissions interleave.
            tokio::task::yield_now().await;

            let body = json!({
                "id": token,
                "response": json!({ "echo": token }).to_string(),
                "clinical_relevance": true,
                "doctor_names": "N/A",
                "metadata": { "original_file_name": file_name, "page_count": 1 }
            });
            Ok(RawResponse {
                status: 200,
                body: body.to_string(),
            })
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn send(&self, _request: MultipartRequest) -> std::result::Result<RawResponse, TransportError> {
            Err(TransportError::Timeout("deadline elapsed".into()))
        }
    }

    fn client_with(transport: &Arc<EchoTransport>) -> Client {
        ClientBuilder::new()
            .api_key("mt_test_key")
            .base_url("http://ocr.test/api/v1/")
            .transport(Arc::clone(transport))
            .build()
            .expect("client")
    }

    fn temp_file(suffix: &str, contents: &[u8]) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    #[test]
    fn empty_api_key_fails_fast() {
        let err = Client::new("").err().expect("empty key must be rejected");
        assert!(matches!(err, MeditrailError::Config { .. }));
    }

    #[test]
    fn new_uses_production_base_url() {
        let client = Client::new("mt_test_key").unwrap();
        assert_eq!(client.config().base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn sends_one_request_with_all_parts() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let file = temp_file(".png", b"\x89PNG fake image");

        let result = client
            .submit(file.path(), Some("Chest X-ray"), Some("Extract findings"))
            .await
            .unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.id, "Chest X-ray");

        let seen = transport.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.url, "http://ocr.test/api/v1/ocr/process");
        assert_eq!(request.api_key.expose(), "mt_test_key");
        assert_eq!(request.file.content_type, "image/png");
        assert_eq!(request.file.bytes, b"\x89PNG fake image");
        assert_eq!(
            Some(request.file.file_name.as_str()),
            file.path().file_name().and_then(|n| n.to_str())
        );
        assert_eq!(request.field("system_prompt"), Some("Extract findings"));
    }

    #[tokio::test]
    async fn blank_hints_are_omitted() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let file = temp_file(".pdf", b"%PDF-1.4");

        client.submit(file.path(), Some("  "), Some("")).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert!(seen[0].fields.is_empty());
        assert_eq!(seen[0].file.content_type, "application/pdf");
    }

    #[tokio::test]
    async fn missing_file_makes_no_request() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);

        let err = client.submit("/definitely/not/here.pdf", None, None).await.unwrap_err();

        assert!(matches!(err, MeditrailError::FileNotFound { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn directory_is_not_a_file() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let dir = TempDir::new().unwrap();

        let err = client.submit(dir.path(), None, None).await.unwrap_err();

        assert!(matches!(err, MeditrailError::FileNotFound { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_file_makes_no_request() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let file = temp_file(".pdf", b"");
        file.as_file().set_len(MAX_FILE_SIZE + 1).unwrap();

        let err = client.submit(file.path(), None, None).await.unwrap_err();

        assert!(err.is_file_too_large());
        assert!(err.to_string().contains("50.00MB"), "{err}");
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn file_at_the_limit_is_sent() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let file = temp_file(".pdf", b"");
        file.as_file().set_len(MAX_FILE_SIZE).unwrap();

        client.submit(file.path(), None, None).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn growth_after_size_check_is_rejected() {
        let contents = b"0123456789abcdef";

        let err = read_capped(&contents[..], 8, 10).await.unwrap_err();
        match err {
            MeditrailError::FileTooLarge { size_bytes, limit_bytes } => {
                assert_eq!(size_bytes, 11);
                assert_eq!(limit_bytes, 10);
            }
            other => panic!("expected FileTooLarge, got {other:?}"),
        }

        let bytes = read_capped(&contents[..], 16, 16).await.unwrap();
        assert_eq!(bytes, contents);
    }

    #[tokio::test]
    async fn unknown_extension_is_still_sent_as_octet_stream() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);
        let file = temp_file(".scan", b"raw");

        client.submit(file.path(), None, None).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].file.content_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn transport_failure_is_a_network_error() {
        let client = ClientBuilder::new()
            .api_key("mt_test_key")
            .transport(FailingTransport)
            .build()
            .unwrap();
        let file = temp_file(".jpg", b"jpeg");

        let err = client.submit(file.path(), None, None).await.unwrap_err();

        assert_eq!(err.api_kind(), Some(ApiErrorKind::Network));
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn concurrent_submissions_do_not_cross_talk() {
        let transport = Arc::new(EchoTransport::default());
        let client = client_with(&transport);

        let files: Vec<_> = (0..8)
            .map(|i| temp_file(".pdf", format!("document {i}").as_bytes()))
            .collect();

        let handles: Vec<_> = files
            .iter()
            .enumerate()
            .map(|(i, file)| {
                let client = client.clone();
                let path = file.path().to_path_buf();
                tokio::spawn(async move {
                    let token = format!("token-{i}");
                    let result = client.submit(&path, Some(token.as_str()), None).await;
                    (token, path, result)
                })
            })
            .collect();

        for handle in handles {
            let (token, path, result) = handle.await.unwrap();
            let result = result.unwrap();
            assert_eq!(result.id, token);
            assert_eq!(result.response_json().unwrap()["echo"], token.as_str());
            assert_eq!(
                Some(result.metadata.original_file_name.as_str()),
                path.file_name().and_then(|n| n.to_str())
            );
        }

        assert_eq!(transport.calls.load(Ordering::SeqCst), 8);
        let seen = transport.seen.lock().unwrap();
        for request in seen.iter() {
            let token = request.field("text").unwrap();
            let index: usize = token.trim_start_matches("token-").parse().unwrap();
            assert_eq!(request.file.bytes, format!("document {index}").as_bytes());
        }
    }
}
