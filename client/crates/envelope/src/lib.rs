//! Response envelope primitives for School ERP backend endpoints.
//!
//! Every endpoint answers with `{ success, data, message?, error?,
//! pagination?, meta? }`. This crate owns that wire shape so the API client
//! and any other consumer agree on how payloads are unwrapped. Bodies that do
//! not follow the envelope convention are treated as the payload itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pagination metadata attached to list responses.
///
/// Missing fields default to zero so partially populated metadata from older
/// endpoints still decodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    /// Total number of records across all pages.
    pub total: u64,
    /// One-based index of the current page.
    pub page: u64,
    /// Maximum number of records per page.
    pub limit: u64,
    /// Number of pages available for the current filter.
    pub total_pages: u64,
}

impl Pagination {
    /// Return whether a page after the current one exists.
    ///
    /// # Examples
    /// ```
    /// use envelope::Pagination;
    ///
    /// let pagination = Pagination { total: 45, page: 2, limit: 20, total_pages: 3 };
    /// assert!(pagination.has_next_page());
    /// ```
    #[must_use]
    pub const fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    /// Return whether a page before the current one exists.
    #[must_use]
    pub const fn has_previous_page(&self) -> bool {
        self.page > 1
    }
}

/// Standard wrapper returned by every backend endpoint.
///
/// ## Invariants
/// - When `success` is `true`, `data` holds the payload.
/// - `data` is `None` when the backend omitted it or sent `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    /// Whether the backend reports the operation as successful.
    #[serde(default = "default_success")]
    pub success: bool,
    /// Payload carried by the response.
    pub data: Option<T>,
    /// Informational message supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error description supplied by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pagination metadata for list endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    /// Free-form metadata attached by the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
}

const fn default_success() -> bool {
    true
}

/// Errors raised while decoding a response body.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// The body or its `data` field does not match the requested type.
    #[error("response payload does not match the expected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl<T> Envelope<T> {
    /// Wrap a bare payload in a successful envelope.
    ///
    /// # Examples
    /// ```
    /// use envelope::Envelope;
    ///
    /// let envelope = Envelope::from_payload(7_u32);
    /// assert!(envelope.success);
    /// assert_eq!(envelope.data, Some(7));
    /// ```
    #[must_use]
    pub const fn from_payload(payload: T) -> Self {
        Self {
            success: true,
            data: Some(payload),
            message: None,
            error: None,
            pagination: None,
            meta: None,
        }
    }

    /// Consume the envelope and return its payload.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Decode a JSON body into an envelope.
    ///
    /// Bodies that do not look like an envelope are decoded as the payload
    /// and wrapped with [`Envelope::from_payload`].
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Decode`] when the body does not match `T`.
    ///
    /// # Examples
    /// ```
    /// use envelope::Envelope;
    /// use serde_json::json;
    ///
    /// let body = json!({
    ///     "success": true,
    ///     "data": [1, 2],
    ///     "pagination": { "total": 2, "page": 1, "limit": 10, "totalPages": 1 }
    /// });
    /// let envelope: Envelope<Vec<u8>> = Envelope::from_value(body)?;
    /// assert_eq!(envelope.pagination.map(|p| p.total), Some(2));
    /// # Ok::<(), envelope::EnvelopeError>(())
    /// ```
    pub fn from_value(body: Value) -> Result<Self, EnvelopeError> {
        if is_envelope(&body) {
            Ok(serde_json::from_value(body)?)
        } else {
            Ok(Self::from_payload(serde_json::from_value(body)?))
        }
    }
}

/// Decode the payload of a JSON body.
///
/// Returns the envelope's `data` field whenever the key is present, `null`
/// included. Bodies without a `data` key are decoded whole.
///
/// # Errors
///
/// Returns [`EnvelopeError::Decode`] when the selected value does not match
/// `T`.
///
/// # Examples
/// ```
/// use envelope::unwrap_payload;
/// use serde_json::{json, Value};
///
/// let payload: Value = unwrap_payload(json!({ "success": true, "data": { "id": 1 } }))?;
/// assert_eq!(payload, json!({ "id": 1 }));
/// # Ok::<(), envelope::EnvelopeError>(())
/// ```
pub fn unwrap_payload<T: DeserializeOwned>(body: Value) -> Result<T, EnvelopeError> {
    match body {
        Value::Object(mut fields) if fields.contains_key("data") => {
            let data = fields.remove("data").unwrap_or(Value::Null);
            Ok(serde_json::from_value(data)?)
        }
        other => Ok(serde_json::from_value(other)?),
    }
}

fn is_envelope(body: &Value) -> bool {
    body.as_object().is_some_and(|fields| {
        fields.contains_key("data") || fields.get("success").is_some_and(Value::is_boolean)
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for envelope decoding.

    use super::*;
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Student {
        id: u32,
    }

    #[rstest]
    fn unwraps_data_from_envelope() {
        let student: Student =
            unwrap_payload(json!({ "success": true, "data": { "id": 1 } })).expect("decodes");
        assert_eq!(student, Student { id: 1 });
    }

    #[rstest]
    #[case::bare_object(json!({ "id": 4 }))]
    #[case::success_flag_only(json!({ "id": 4, "success": true }))]
    fn falls_back_to_raw_body(#[case] body: Value) {
        let student: Student = unwrap_payload(body).expect("decodes");
        assert_eq!(student, Student { id: 4 });
    }

    #[rstest]
    fn null_data_is_the_payload() {
        let body = json!({ "success": true, "data": null, "message": "No student found" });
        let student: Option<Student> = unwrap_payload(body.clone()).expect("decodes");
        assert_eq!(student, None);
        let raw: Value = unwrap_payload(body).expect("decodes");
        assert_eq!(raw, Value::Null);
    }

    #[rstest]
    fn unwraps_arrays_without_envelope() {
        let ids: Vec<u32> = unwrap_payload(json!([1, 2, 3])).expect("decodes");
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[rstest]
    fn decode_mismatch_is_reported() {
        let result: Result<Student, _> = unwrap_payload(json!({ "data": "nope" }));
        assert!(matches!(result, Err(EnvelopeError::Decode(_))));
    }

    #[rstest]
    fn keeps_pagination_and_meta() {
        let body = json!({
            "success": true,
            "data": [{ "id": 1 }],
            "message": "ok",
            "pagination": { "total": 41, "page": 2, "limit": 20, "totalPages": 3 },
            "meta": { "academicYear": "2025-26" }
        });
        let envelope: Envelope<Vec<Student>> = Envelope::from_value(body).expect("decodes");

        let pagination = envelope.pagination.expect("pagination present");
        assert_eq!(pagination.total_pages, 3);
        assert!(pagination.has_next_page());
        assert!(pagination.has_previous_page());
        assert_eq!(envelope.message.as_deref(), Some("ok"));
        assert_eq!(
            envelope.meta.and_then(|meta| meta.get("academicYear").cloned()),
            Some(json!("2025-26"))
        );
        assert_eq!(envelope.data, Some(vec![Student { id: 1 }]));
    }

    #[rstest]
    fn wraps_non_envelope_bodies() {
        let envelope: Envelope<Student> = Envelope::from_value(json!({ "id": 9 })).expect("decodes");
        assert!(envelope.success);
        assert_eq!(envelope.data, Some(Student { id: 9 }));
        assert!(envelope.pagination.is_none());
    }

    #[rstest]
    fn failed_envelope_keeps_error_text() {
        let envelope: Envelope<Student> =
            Envelope::from_value(json!({ "success": false, "error": "duplicate admission number" }))
                .expect("decodes");
        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.error.as_deref(), Some("duplicate admission number"));
    }

    #[rstest]
    #[case(Pagination { total: 0, page: 1, limit: 20, total_pages: 0 }, false, false)]
    #[case(Pagination { total: 60, page: 1, limit: 20, total_pages: 3 }, true, false)]
    #[case(Pagination { total: 60, page: 3, limit: 20, total_pages: 3 }, false, true)]
    fn pagination_navigation(
        #[case] pagination: Pagination,
        #[case] next: bool,
        #[case] previous: bool,
    ) {
        assert_eq!(pagination.has_next_page(), next);
        assert_eq!(pagination.has_previous_page(), previous);
    }
}
