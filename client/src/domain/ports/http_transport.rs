//! Driven port for issuing HTTP requests against the School ERP backend.
//!
//! The domain owns the request and response shapes so failure classification
//! stays independent of the HTTP library. Adapters resolve `path` against
//! their configured base URL and apply the request timeout.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

use super::define_port_error;

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File attachment.
    File {
        /// Field name.
        name: String,
        /// File name reported to the backend.
        file_name: String,
        /// MIME type, when known.
        content_type: Option<String>,
        /// File contents.
        bytes: Vec<u8>,
    },
}

/// Multipart form body, e.g. a student photo upload with its metadata.
///
/// # Examples
/// ```
/// use erp_client::domain::ports::MultipartForm;
///
/// let form = MultipartForm::new()
///     .text("studentId", "42")
///     .file("photo", "photo.png", vec![0x89, 0x50]);
/// assert_eq!(form.parts().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    /// Create an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Append a file without an explicit MIME type.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: None,
            bytes,
        });
        self
    }

    /// Append a file with a MIME type such as `application/pdf`.
    #[must_use]
    pub fn file_with_type(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: Some(content_type.into()),
            bytes,
        });
        self
    }

    /// Parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Consume the form, yielding its parts in insertion order.
    #[must_use]
    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document; adapters send `Content-Type: application/json`.
    Json(Value),
    /// Multipart form; adapters must let the HTTP library set the boundary.
    Multipart(MultipartForm),
}

/// Fully prepared request handed to the transport.
#[derive(Clone)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Request payload.
    pub body: RequestBody,
    /// Bearer token for the `Authorization` header.
    pub bearer: Option<Zeroizing<String>>,
}

impl ApiRequest {
    /// Build a request without query, body or credentials.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            bearer: None,
        }
    }
}

impl fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw response returned by the transport, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Errors raised before a response status was available.
    pub enum TransportError {
        /// The request could not be built or dispatched.
        NotSent { message: String } =>
            "request could not be sent: {message}",
        /// The request went out but no complete response arrived.
        NoResponse { message: String } =>
            "no response received: {message}",
    }
}

/// Port for executing one HTTP exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send `request` and return the response for any status code.
    async fn send(&self, request: ApiRequest) -> Result<TransportResponse, TransportError>;
}

/// Fixture transport answering every request with the same response.
#[derive(Debug, Clone)]
pub struct FixtureHttpTransport {
    response: TransportResponse,
}

impl FixtureHttpTransport {
    /// Respond with `status` and the JSON encoding of `body`.
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            response: TransportResponse {
                status,
                body: body.to_string().into_bytes(),
            },
        }
    }
}

#[async_trait]
impl HttpTransport for FixtureHttpTransport {
    async fn send(&self, _request: ApiRequest) -> Result<TransportResponse, TransportError> {
        Ok(self.response.clone())
    }
}
