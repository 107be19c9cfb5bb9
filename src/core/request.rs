//! Outbound request construction for the analyze endpoint.

use reqwest::multipart::{Form, Part};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::api::{ANALYZE_PATH, FIELD_FILE, FIELD_MODE, FIELD_QUESTION};
use crate::core::mode::Mode;
use crate::core::session::Credential;
use crate::utils::url::construct_api_url;

/// Question sent when the user submits only a file.
pub const QUESTION_FALLBACK: &str = "Analyze this file";

/// File extensions the analyze endpoint knows how to ingest.
pub const ACCEPTED_EXTENSIONS: &[&str] = &[
    "csv", "txt", "md", "pdf", "xlsx", "xls", "docx", "json", "py", "js", "html", "css", "xml",
    "png", "jpg", "jpeg", "webp",
];

#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug)]
pub enum AttachmentError {
    /// The path has no usable file name.
    MissingName { path: PathBuf },

    /// The extension is not one the endpoint accepts.
    UnsupportedType { name: String },

    /// Reading the file failed.
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::MissingName { path } => {
                write!(f, "Cannot attach {}: no file name", path.display())
            }
            AttachmentError::UnsupportedType { name } => write!(
                f,
                "Cannot attach {name}: unsupported file type (accepted: {})",
                ACCEPTED_EXTENSIONS.join(", ")
            ),
            AttachmentError::Read { path, source } => {
                write!(f, "Failed to read {}: {source}", path.display())
            }
        }
    }
}

impl StdError for AttachmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttachmentError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn is_accepted_name(name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                ACCEPTED_EXTENSIONS
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Load a file from disk, validating its type first.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_owned)
            .ok_or_else(|| AttachmentError::MissingName {
                path: path.to_path_buf(),
            })?;

        if !Self::is_accepted_name(&name) {
            return Err(AttachmentError::UnsupportedType { name });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AttachmentError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self { name, bytes })
    }
}

/// Multipart fields of an analyze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeForm {
    pub question: String,
    pub mode: Mode,
    pub file: Option<Attachment>,
}

impl AnalyzeForm {
    pub fn into_multipart(self) -> Form {
        let form = Form::new()
            .text(FIELD_QUESTION, self.question)
            .text(FIELD_MODE, self.mode.as_str());

        match self.file {
            Some(attachment) => form.part(
                FIELD_FILE,
                Part::bytes(attachment.bytes).file_name(attachment.name),
            ),
            None => form,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub endpoint: String,
    pub headers: BTreeMap<String, String>,
    pub body: AnalyzeForm,
}

impl RequestDescriptor {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_http_request(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut request = client.post(&self.endpoint);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request.multipart(self.body.into_multipart())
    }
}

/// Builds [`RequestDescriptor`]s against a fixed, pre-resolved endpoint.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint: String,
}

impl RequestBuilder {
    /// `api_base` is the already-resolved base; an empty base yields a
    /// relative endpoint.
    pub fn new(api_base: &str) -> Self {
        Self {
            endpoint: construct_api_url(api_base, ANALYZE_PATH),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build(
        &self,
        text: &str,
        attachment: Option<Attachment>,
        mode: Mode,
        credential: Option<&Credential>,
    ) -> RequestDescriptor {
        let question = if text.is_empty() {
            QUESTION_FALLBACK.to_string()
        } else {
            text.to_string()
        };

        let mut headers = BTreeMap::new();
        if let Some(credential) = credential {
            headers.insert(
                "Authorization".to_string(),
                credential.bearer_header_value(),
            );
        }

        RequestDescriptor {
            endpoint: self.endpoint.clone(),
            headers,
            body: AnalyzeForm {
                question,
                mode,
                file: attachment,
            },
        }
    }
}
