//! Reqwest-backed transport adapter.
//!
//! This adapter owns transport details only: URL resolution against the
//! configured base, credential headers, body encoding and the request
//! timeout. Status codes are passed through untouched; the domain
//! classifies them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url, header};

use crate::domain::ports::{
    ApiRequest, FormPart, HttpMethod, HttpTransport, MultipartForm, RequestBody, TransportError,
    TransportResponse,
};

const USER_AGENT: &str = concat!("erp-client/", env!("CARGO_PKG_VERSION"));

/// HTTP transport that resolves request paths against one base URL.
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Build a transport with a cookie-aware client and a fixed timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Base URL every request path is resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn builder(&self, request: ApiRequest) -> Result<RequestBuilder, TransportError> {
        let url = resolve_url(&self.base_url, &request.path)?;
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
            HttpMethod::Put => self.client.put(url),
            HttpMethod::Delete => self.client.delete(url),
        }
        .header(header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token.as_str());
        }
        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(multipart_form(form)?),
        };
        Ok(builder)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .builder(request)?
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Join `path` onto `base` with exactly one slash between them.
fn resolve_url(base: &Url, path: &str) -> Result<Url, TransportError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined)
        .map_err(|error| TransportError::not_sent(format!("invalid request URL {joined}: {error}")))
}

fn multipart_form(form: MultipartForm) -> Result<Form, TransportError> {
    form.into_parts()
        .into_iter()
        .try_fold(Form::new(), |acc, part| match part {
            FormPart::Text { name, value } => Ok(acc.text(name, value)),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let file = Part::bytes(bytes).file_name(file_name);
                let file = match content_type {
                    Some(mime) => file.mime_str(&mime).map_err(|error| {
                        TransportError::not_sent(format!("invalid content type {mime}: {error}"))
                    })?,
                    None => file,
                };
                Ok(acc.part(name, file))
            }
        })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_builder() {
        TransportError::not_sent(error.to_string())
    } else {
        TransportError::no_response(error.to_string())
    }
}
