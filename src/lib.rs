//! # Meditrail SDK for Rust
//!
//! Client for the Meditrail OCR API. Upload a medical document (PDF, JPG,
//! PNG) and get back the OCR transcription, the extracted clinical data, and
//! document metadata.
//!
//! ## Quick start
//!
//! ```no_run
//! use meditrail::Client;
//!
//! #[tokio::main]
//! async fn main() -> meditrail::Result<()> {
//!     let client = Client::new("mt_live_your_api_key")?;
//!
//!     let result = client
//!         .submit(
//!             "chest_xray.jpg",
//!             Some("Chest X-ray examination"),
//!             Some("Extract key clinical findings and abnormalities"),
//!         )
//!         .await?;
//!
//!     println!("Document {}: clinical={}", result.id, result.clinical_relevance);
//!
//!     // `response` is a JSON document encoded as a string.
//!     let extracted = result.response_json().unwrap_or_default();
//!     println!("Summary: {}", extracted["summary"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Local problems (missing file, file over 50 MiB) are reported before
//! anything is sent. Everything else is a [`MeditrailError::Api`] whose
//! [`ApiErrorKind`] says what went wrong. Nothing is retried; on
//! [`ApiErrorKind::UsageLimitExceeded`] it is up to the caller to back off.
//!
//! ```no_run
//! use meditrail::{ApiErrorKind, Client, MeditrailError};
//!
//! # async fn example(client: Client) {
//! match client.submit("scan.pdf", None, None).await {
//!     Ok(result) => println!("{}", result.id),
//!     Err(err) if err.api_kind() == Some(ApiErrorKind::UsageLimitExceeded) => {
//!         eprintln!("quota reached: {err}");
//!     }
//!     Err(MeditrailError::FileNotFound { path }) => eprintln!("no such file: {}", path.display()),
//!     Err(err) => eprintln!("upload failed: {err}"),
//! }
//! # }
//! ```

mod client;
mod config;
mod errors;
mod models;
mod response;
mod transport;

pub use client::{Client, ClientBuilder, ACCEPTED_EXTENSIONS, MAX_FILE_SIZE};
pub use config::{ApiKey, ClientConfig, REQUEST_TIMEOUT};
pub use errors::{ApiError, ApiErrorKind, MeditrailError, Result};
pub use models::{DocumentMetadata, UploadRequest, UploadResult, NOT_AVAILABLE};
pub use response::classify_response;
pub use transport::{FilePart, MultipartRequest, RawResponse, ReqwestTransport, Transport, TransportError};
