use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder the API uses when no doctor could be identified.
pub const NOT_AVAILABLE: &str = "N/A";

/// A single document upload: the file plus optional hints for the extractor.
///
/// ```
/// use meditrail::UploadRequest;
///
/// let request = UploadRequest::new("scans/chest_xray.jpg")
///     .text("Chest X-ray examination")
///     .system_prompt("Extract key clinical findings and abnormalities");
/// assert_eq!(request.file_path().to_str(), Some("scans/chest_xray.jpg"));
/// ```
#[derive(Debug, Clone)]
pub struct UploadRequest {
    file_path: PathBuf,
    text: Option<String>,
    system_prompt: Option<String>,
}

impl UploadRequest {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            text: None,
            system_prompt: None,
        }
    }

    /// Free-text context or annotation sent as the `text` field.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Extraction hint sent as the `system_prompt` field.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Optional form fields that will actually be sent. Blank values are dropped.
    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        [("text", &self.text), ("system_prompt", &self.system_prompt)]
            .into_iter()
            .filter_map(|(name, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (name, v.to_string()))
            })
            .collect()
    }
}

/// Returned by `submit` when the API accepted and processed the document.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadResult {
    /// Document identifier assigned by the service.
    pub id: String,

    /// Extraction output. This is itself JSON-encoded; see
    /// [`parse_response`](Self::parse_response).
    pub response: String,

    pub clinical_relevance: bool,

    /// Comma-separated names, or `"N/A"`.
    #[serde(default = "not_available", deserialize_with = "null_as_not_available")]
    pub doctor_names: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: DocumentMetadata,

    /// Full API response JSON.
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl UploadResult {
    /// Decode the nested `response` string into a caller-chosen type.
    pub fn parse_response<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.response)
    }

    /// Decode the nested `response` string as untyped JSON.
    pub fn response_json(&self) -> serde_json::Result<serde_json::Value> {
        self.parse_response()
    }

    pub(crate) fn from_value(raw: serde_json::Value) -> serde_json::Result<Self> {
        let mut result: UploadResult = serde_json::from_value(raw.clone())?;
        result.raw = raw;
        Ok(result)
    }
}

/// Fields the service leaves `null` decode to their empty value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub original_file_name: String,
    /// Name the service stored the upload under.
    #[serde(deserialize_with = "null_as_default")]
    pub new_file_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub file_type: String,
    /// Human-readable, e.g. `"1.25 MB"`.
    #[serde(deserialize_with = "null_as_default")]
    pub file_size: String,
    /// Raw OCR transcription.
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub category_name: String,
    #[serde(deserialize_with = "null_as_not_available")]
    pub doctor_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub page_count: u32,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            original_file_name: String::new(),
            new_file_name: String::new(),
            file_type: String::new(),
            file_size: String::new(),
            text: String::new(),
            category_name: String::new(),
            doctor_name: not_available(),
            page_count: 0,
        }
    }
}

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_not_available<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}
